//! The device registry: insertion, name-based lookup
//! (`crypto<id>` / `cryptouuid/<uuid>`), and the ref-counted open/close
//! cycle around a backing disk.

use alloc::vec::Vec;

use cryptodisk_core::CryptoDiskError;
use cryptodisk_core::CryptoDisk;
use cryptodisk_io::{BackingDisk, DiskIdentity, DiskSource};

/// Prefix of a by-id device name, e.g. `crypto0`.
const ID_PREFIX: &str = "crypto";
/// Prefix of a by-uuid device name, e.g. `cryptouuid/ABCDEF...`.
const UUID_PREFIX: &str = "cryptouuid/";

/// Parses a `crypto<id>` suffix the way `strtoul(s, NULL, 0)` would: a
/// `0x`/`0X` prefix selects hex, a lone leading `0` selects octal, anything
/// else is decimal.
fn parse_base0_u32(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    if s.len() > 1 && s.starts_with('0') {
        return u32::from_str_radix(&s[1..], 8).ok();
    }
    s.parse::<u32>().ok()
}

/// Holds every configured [`CryptoDisk`], keyed by an id assigned on
/// insertion. Single-threaded and non-reentrant by design: no
/// interior mutability, no global instance. Callers own a `Registry` and
/// thread it through explicitly.
pub struct Registry {
    next_id: u32,
    disks: Vec<CryptoDisk>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            disks: Vec::new(),
        }
    }

    /// Registers `disk`, assigning it the next free id. `disk.id` is
    /// overwritten; any value the caller set is ignored.
    ///
    /// The id counter is a `u32`, widened from GRUB's narrower counter so
    /// the registry doesn't wrap in any realistic deployment, and is
    /// guarded against exhaustion: once every
    /// id up to `u32::MAX` is spent this returns
    /// [`CryptoDiskError::OutOfMemory`] rather than wrapping into reuse.
    pub fn insert(&mut self, mut disk: CryptoDisk) -> Result<u32, CryptoDiskError> {
        if self.next_id == u32::MAX {
            log::warn!("insert: id space exhausted");
            return Err(CryptoDiskError::OutOfMemory);
        }
        let id = self.next_id;
        self.next_id += 1;
        disk.id = id;
        log::debug!("insert: registered crypto{id} over {}", disk.source_name);
        self.disks.push(disk);
        Ok(id)
    }

    /// Iterates every registered disk, in insertion order.
    pub fn iterate(&self) -> impl Iterator<Item = &CryptoDisk> {
        self.disks.iter()
    }

    pub fn get_by_id(&self, id: u32) -> Option<&CryptoDisk> {
        self.disks.iter().find(|d| d.id == id)
    }

    fn get_by_id_mut(&mut self, id: u32) -> Option<&mut CryptoDisk> {
        self.disks.iter_mut().find(|d| d.id == id)
    }

    /// Looks up a disk by UUID, matched case-insensitively.
    pub fn get_by_uuid(&self, uuid: &str) -> Option<&CryptoDisk> {
        self.disks
            .iter()
            .find(|d| d.uuid.eq_ignore_ascii_case(uuid))
    }

    /// Finds the disk whose currently-open backing disk matches `identity`.
    pub fn get_by_source_disk(&self, identity: DiskIdentity) -> Option<&CryptoDisk> {
        self.disks.iter().find(|d| d.source == Some(identity))
    }

    /// Resolves `name` (`crypto<id>` or `cryptouuid/<uuid>`) to a
    /// registered id.
    fn resolve_name(&self, name: &str) -> Option<u32> {
        if let Some(uuid) = name.strip_prefix(UUID_PREFIX) {
            return self.get_by_uuid(uuid).map(|d| d.id);
        }
        if let Some(digits) = name.strip_prefix(ID_PREFIX) {
            return parse_base0_u32(digits);
        }
        None
    }

    /// Opens the backing disk for the device named `name`, incrementing
    /// its ref count. If this is the first open, `source` is asked to open
    /// the disk by its configured `source_name`.
    pub fn open<S: DiskSource>(
        &mut self,
        name: &str,
        source: &mut S,
    ) -> Result<u32, CryptoDiskError> {
        let id = self.resolve_name(name).ok_or(CryptoDiskError::UnknownDevice)?;
        let disk = self
            .get_by_id_mut(id)
            .ok_or(CryptoDiskError::UnknownDevice)?;

        if disk.ref_count == 0 {
            log::debug!("open: crypto{id} first reference, opening {}", disk.source_name);
            let backing = source.open(&disk.source_name).map_err(CryptoDiskError::from)?;
            disk.source = Some(backing.identity());
        }
        disk.ref_count += 1;
        Ok(id)
    }

    /// Drops the ref count on `id`; closes the backing disk once it
    /// reaches zero.
    ///
    /// Takes the already-open [`BackingDisk`] so it can be handed back to
    /// `source` for release; callers are expected to have kept it from the
    /// matching `open` (the registry itself does not retain disk handles,
    /// only their identity, to avoid tying this crate to one disk type's
    /// lifetime).
    pub fn close<S: DiskSource>(
        &mut self,
        id: u32,
        backing: S::Disk,
        source: &mut S,
    ) -> Result<(), CryptoDiskError> {
        let disk = self
            .get_by_id_mut(id)
            .ok_or(CryptoDiskError::UnknownDevice)?;
        if disk.ref_count == 0 {
            log::warn!("close: crypto{id} closed with no outstanding reference");
            return Err(CryptoDiskError::InvalidArgument);
        }
        disk.ref_count -= 1;
        if disk.ref_count == 0 {
            log::debug!("close: crypto{id} last reference released, closing backing disk");
            disk.source = None;
            source.close(backing);
        }
        Ok(())
    }

    /// Reads and decrypts `buf.len() / 512` sectors starting at the
    /// plaintext sector `sector` of device `id`.
    pub fn read(
        &self,
        id: u32,
        sector: u64,
        buf: &mut [u8],
        backing: &mut dyn BackingDisk,
    ) -> Result<(), CryptoDiskError> {
        let disk = self.get_by_id(id).ok_or(CryptoDiskError::UnknownDevice)?;
        let disk_sector = disk.offset_sectors + sector;
        log::trace!("read: crypto{id} sector {sector} ({} bytes)", buf.len());
        backing
            .read_sectors(disk_sector, buf)
            .map_err(CryptoDiskError::from)?;
        disk.decrypt(disk_sector, buf)
    }

    /// Always fails: the write path is unimplemented by design.
    pub fn write(&self, _id: u32, _sector: u64, _buf: &[u8]) -> Result<(), CryptoDiskError> {
        Err(CryptoDiskError::NotImplementedYet)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptodisk_core::descriptor::Mode;
    use cryptodisk_io::IoError;

    use alloc::boxed::Box;
    use alloc::string::ToString;
    use alloc::vec;

    struct FakeCipher;
    impl cryptodisk_core::cipher::CipherHandle for FakeCipher {
        fn block_size(&self) -> usize {
            16
        }
        fn set_key(&mut self, _key: &[u8]) -> Result<(), CryptoDiskError> {
            Ok(())
        }
        fn encrypt_block(&self, _block: &mut [u8]) {}
        fn decrypt_block(&self, _block: &mut [u8]) -> Result<(), CryptoDiskError> {
            Ok(())
        }
    }

    fn make_disk(uuid: &str, name: &str) -> CryptoDisk {
        CryptoDisk {
            id: 0,
            uuid: uuid.to_string(),
            source_name: name.to_string(),
            source: None,
            offset_sectors: 0,
            total_sectors: 100,
            ref_count: 0,
            mode: Mode::Ecb,
            mode_iv: None,
            cipher: Box::new(FakeCipher),
        }
    }

    struct FakeDisk {
        data: alloc::vec::Vec<u8>,
    }
    impl BackingDisk for FakeDisk {
        fn identity(&self) -> DiskIdentity {
            DiskIdentity { disk_id: 1, dev_id: 1 }
        }
        fn total_sectors(&self) -> u64 {
            (self.data.len() / cryptodisk_io::SECTOR_SIZE) as u64
        }
        fn read_sectors(&mut self, sector: u64, buf: &mut [u8]) -> Result<(), IoError> {
            let off = sector as usize * cryptodisk_io::SECTOR_SIZE;
            if off + buf.len() > self.data.len() {
                return Err(IoError::OutOfBounds);
            }
            buf.copy_from_slice(&self.data[off..off + buf.len()]);
            Ok(())
        }
    }

    struct FakeSource;
    impl DiskSource for FakeSource {
        type Disk = FakeDisk;
        fn open(&mut self, _name: &str) -> Result<FakeDisk, IoError> {
            Ok(FakeDisk {
                data: vec![0u8; cryptodisk_io::SECTOR_SIZE * 4],
            })
        }
        fn close(&mut self, _disk: FakeDisk) {}
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut reg = Registry::new();
        let a = reg.insert(make_disk("uuid-a", "hd0")).unwrap();
        let b = reg.insert(make_disk("uuid-b", "hd1")).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn open_by_id_and_uuid_resolve_to_same_device() {
        let mut reg = Registry::new();
        let id = reg.insert(make_disk("ABCDEF", "hd0")).unwrap();
        let mut source = FakeSource;
        let by_id = reg.open(&alloc::format!("crypto{id}"), &mut source).unwrap();
        assert_eq!(by_id, id);
    }

    #[test]
    fn open_by_uuid_is_case_insensitive() {
        let mut reg = Registry::new();
        let id = reg.insert(make_disk("ABCDEF", "hd0")).unwrap();
        let mut source = FakeSource;
        let resolved = reg.open("cryptouuid/abcdef", &mut source).unwrap();
        assert_eq!(resolved, id);
    }

    #[test]
    fn open_by_hex_id_resolves_to_the_same_device() {
        let mut reg = Registry::new();
        let id = reg.insert(make_disk("uuid-hex", "hd0")).unwrap();
        assert_eq!(id, 0);
        let mut source = FakeSource;
        let resolved = reg.open("crypto0x0", &mut source).unwrap();
        assert_eq!(resolved, id);
    }

    #[test]
    fn open_unknown_id_is_an_error() {
        let mut reg = Registry::new();
        let mut source = FakeSource;
        assert_eq!(
            reg.open("crypto999", &mut source),
            Err(CryptoDiskError::UnknownDevice)
        );
    }

    #[test]
    fn write_is_never_implemented() {
        let reg = Registry::new();
        assert_eq!(
            reg.write(0, 0, &[0u8; 512]),
            Err(CryptoDiskError::NotImplementedYet)
        );
    }

    #[test]
    fn double_open_then_double_close_balances_ref_count() {
        let mut reg = Registry::new();
        let id = reg.insert(make_disk("uuid", "hd0")).unwrap();
        let mut source = FakeSource;
        let name = alloc::format!("crypto{id}");
        reg.open(&name, &mut source).unwrap();
        reg.open(&name, &mut source).unwrap();
        assert_eq!(reg.get_by_id(id).unwrap().ref_count, 2);

        let backing1 = FakeDisk { data: vec![0u8; cryptodisk_io::SECTOR_SIZE] };
        let backing2 = FakeDisk { data: vec![0u8; cryptodisk_io::SECTOR_SIZE] };
        reg.close(id, backing1, &mut source).unwrap();
        assert_eq!(reg.get_by_id(id).unwrap().ref_count, 1);
        reg.close(id, backing2, &mut source).unwrap();
        assert_eq!(reg.get_by_id(id).unwrap().ref_count, 0);
    }
}
