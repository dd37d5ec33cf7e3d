#![cfg_attr(not(feature = "std"), no_std)]

//! Device registry and disk-device adaptor for block-level disk decryption.
//!
//! This is the facade crate: [`registry::Registry`] is where cryptodisks
//! get registered, looked up by `crypto<id>` / `cryptouuid/<uuid>` name,
//! and opened/closed against a backing disk; [`device::CryptoDiskDevice`]
//! wraps one open registration back into a plain [`cryptodisk_io::BackingDisk`]
//! for whatever sits above it. The cipher-agnostic decryption itself lives
//! in `cryptodisk-core`; this crate owns no cryptography, only bookkeeping.

extern crate alloc;

pub mod device;
pub mod registry;

pub use device::CryptoDiskDevice;
pub use registry::Registry;

pub use cryptodisk_core::{CryptoDisk, CryptoDiskError, Mode, ModeIv};
pub use cryptodisk_io::{BackingDisk, DiskIdentity, DiskSource, IoError, SECTOR_SIZE};
