#![cfg_attr(not(feature = "std"), no_std)]

//! Sector-oriented I/O traits shared by the cryptodisk crates.
//!
//! This crate models the one external collaborator the cryptodisk core
//! cannot do without: a backing disk that can be opened by name and read
//! in fixed-size sectors. Everything here is a capability contract, not
//! an implementation; the actual disk (a file, a ramdisk, firmware calls
//! into real hardware) is supplied by the host.

#[cfg(feature = "alloc")]
extern crate alloc;

/// Size in bytes of a disk sector. Fixed across every mode this workspace supports.
pub const SECTOR_SIZE: usize = 512;

/// Errors surfaced by a [`BackingDisk`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IoError {
    /// The requested sector range falls outside the disk.
    #[error("sector range out of bounds")]
    OutOfBounds,
    /// The underlying medium reported a read failure.
    #[error("backing disk read error")]
    ReadError,
}

/// Identity of an opened backing disk, used by the registry to find the
/// cryptodisk descriptor that owns a given backing disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskIdentity {
    /// Identifier assigned by the disk subsystem that produced this disk.
    pub disk_id: u32,
    /// Identifier of the disk *driver* (the `grub_disk_dev` analogue).
    pub dev_id: u32,
}

/// A backing disk opened for reading, as consumed by the cryptodisk
/// registry's read path.
pub trait BackingDisk {
    /// Stable identity of this disk, used for reverse lookup.
    fn identity(&self) -> DiskIdentity;

    /// Number of 512-byte sectors available on this disk.
    fn total_sectors(&self) -> u64;

    /// Reads `buf.len() / SECTOR_SIZE` whole sectors starting at `sector`.
    ///
    /// `buf.len()` MUST be a multiple of [`SECTOR_SIZE`]; implementations
    /// are not required to validate this themselves, callers in this
    /// workspace always uphold it.
    fn read_sectors(&mut self, sector: u64, buf: &mut [u8]) -> Result<(), IoError>;
}

/// Opens and closes backing disks by name, the other half of the
/// backing-disk capability set alongside [`BackingDisk::read_sectors`].
pub trait DiskSource {
    type Disk: BackingDisk;

    fn open(&mut self, name: &str) -> Result<Self::Disk, IoError>;
    fn close(&mut self, disk: Self::Disk);
}
