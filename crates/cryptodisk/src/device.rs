//! Disk-device adaptor: presents one registered, opened cryptodisk
//! as a [`BackingDisk`] in its own right, so a filesystem or partition
//! reader above it never has to know decryption happened at all. This is
//! also what lets cryptodisks stack (LUKS-on-LUKS), since the adaptor is
//! itself a valid `BackingDisk`.

use cryptodisk_core::CryptoDiskError;
use cryptodisk_io::{BackingDisk, DiskIdentity, IoError};

use crate::registry::Registry;

/// Driver id used for [`DiskIdentity::dev_id`] of every [`CryptoDiskDevice`],
/// distinguishing cryptodisk-backed identities from the underlying disk
/// driver's own.
pub const CRYPTODISK_DEV_ID: u32 = u32::from_be_bytes(*b"cryp");

/// A registered cryptodisk plus its currently-open backing disk, exposed as
/// a plain [`BackingDisk`] over the decrypted sector stream.
pub struct CryptoDiskDevice<'a, D> {
    registry: &'a Registry,
    id: u32,
    backing: D,
}

impl<'a, D: BackingDisk> CryptoDiskDevice<'a, D> {
    /// Wraps an already-opened backing disk for device `id`.
    ///
    /// `backing` must be the disk obtained from the `registry.open(...)`
    /// call that incremented `id`'s ref count; this adaptor does not call
    /// `open`/`close` itself, it only reads through an existing handle.
    pub fn new(registry: &'a Registry, id: u32, backing: D) -> Result<Self, CryptoDiskError> {
        if registry.get_by_id(id).is_none() {
            return Err(CryptoDiskError::UnknownDevice);
        }
        Ok(Self { registry, id, backing })
    }

    /// Releases the wrapped backing disk, for the caller to hand to
    /// [`Registry::close`].
    pub fn into_backing(self) -> D {
        self.backing
    }
}

impl<'a, D: BackingDisk> BackingDisk for CryptoDiskDevice<'a, D> {
    fn identity(&self) -> DiskIdentity {
        DiskIdentity {
            disk_id: self.id,
            dev_id: CRYPTODISK_DEV_ID,
        }
    }

    fn total_sectors(&self) -> u64 {
        self.registry
            .get_by_id(self.id)
            .map(|d| d.total_sectors)
            .unwrap_or(0)
    }

    fn read_sectors(&mut self, sector: u64, buf: &mut [u8]) -> Result<(), IoError> {
        self.registry
            .read(self.id, sector, buf, &mut self.backing)
            .map_err(|_| IoError::ReadError)
    }
}
