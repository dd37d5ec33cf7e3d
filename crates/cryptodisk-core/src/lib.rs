#![cfg_attr(not(feature = "std"), no_std)]

//! GF(2^128) arithmetic, chaining modes, IV schemes and key installation
//! for block-level disk decryption.
//!
//! This crate implements the cipher-agnostic half of a cryptodisk: given a
//! [`cipher::CipherHandle`] already keyed by [`keyinstall::setkey`], it
//! turns ciphertext sectors read off a backing disk into plaintext via
//! [`descriptor::CryptoDisk::decrypt`]. It never touches a backing disk
//! itself, that boundary lives in `cryptodisk-io`, and it never
//! implements a cipher or hash primitive, only the traits
//! ([`cipher::CipherHandle`], [`cipher::HashHandle`]) a real one must
//! satisfy.

extern crate alloc;

pub mod chaining;
pub mod cipher;
pub mod descriptor;
pub mod error;
pub mod gf;
pub mod iv;
pub mod keyinstall;
pub mod pipeline;

pub use descriptor::{CryptoDisk, Mode};
pub use error::CryptoDiskError;
pub use iv::ModeIv;
