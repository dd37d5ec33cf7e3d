//! End-to-end registry exercise: insert a device, open it against a real
//! backing disk, read a decrypted sector with a real AES-128 cipher, then
//! close it again.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

use cryptodisk::{BackingDisk, CryptoDisk, DiskIdentity, DiskSource, IoError, Mode, Registry, SECTOR_SIZE};
use cryptodisk_core::cipher::CipherHandle;
use cryptodisk_core::CryptoDiskError;

struct Aes128Cipher(aes::Aes128);

impl Aes128Cipher {
    fn new(key: &[u8; 16]) -> Self {
        Self(aes::Aes128::new(GenericArray::from_slice(key)))
    }
}

impl CipherHandle for Aes128Cipher {
    fn block_size(&self) -> usize {
        16
    }
    fn set_key(&mut self, key: &[u8]) -> Result<(), CryptoDiskError> {
        if key.len() != 16 {
            return Err(CryptoDiskError::InvalidArgument);
        }
        self.0 = aes::Aes128::new(GenericArray::from_slice(key));
        Ok(())
    }
    fn encrypt_block(&self, block: &mut [u8]) {
        self.0.encrypt_block(GenericArray::from_mut_slice(block));
    }
    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoDiskError> {
        self.0.decrypt_block(GenericArray::from_mut_slice(block));
        Ok(())
    }
}

struct MemDisk {
    data: Vec<u8>,
}

impl BackingDisk for MemDisk {
    fn identity(&self) -> DiskIdentity {
        DiskIdentity { disk_id: 1, dev_id: 1 }
    }
    fn total_sectors(&self) -> u64 {
        (self.data.len() / SECTOR_SIZE) as u64
    }
    fn read_sectors(&mut self, sector: u64, buf: &mut [u8]) -> Result<(), IoError> {
        let off = sector as usize * SECTOR_SIZE;
        if off + buf.len() > self.data.len() {
            return Err(IoError::OutOfBounds);
        }
        buf.copy_from_slice(&self.data[off..off + buf.len()]);
        Ok(())
    }
}

struct MemSource {
    sectors: usize,
}

impl DiskSource for MemSource {
    type Disk = MemDisk;
    fn open(&mut self, _name: &str) -> Result<MemDisk, IoError> {
        Ok(MemDisk { data: vec![0u8; SECTOR_SIZE * self.sectors] })
    }
    fn close(&mut self, _disk: MemDisk) {}
}

#[test]
fn insert_open_read_close_round_trips_a_sector() {
    let key = [0x2Bu8; 16];
    let cipher = Aes128Cipher::new(&key);

    // Lay down one sector of known ciphertext: encrypt a known plaintext
    // block with the same key the registered disk will decrypt with.
    let mut sector = [0u8; SECTOR_SIZE];
    for (i, b) in sector.iter_mut().enumerate() {
        *b = i as u8;
    }
    let plain = sector;
    for block in sector.chunks_mut(16) {
        cipher.encrypt_block(block);
    }

    let mut reg = Registry::new();
    let id = reg
        .insert(CryptoDisk {
            id: 0,
            uuid: "11112222333344445555666677778888".to_string(),
            source_name: "hd0".to_string(),
            source: None,
            offset_sectors: 0,
            total_sectors: 4,
            ref_count: 0,
            mode: Mode::Ecb,
            mode_iv: None,
            cipher: Box::new(cipher),
        })
        .unwrap();

    let mut source = MemSource { sectors: 4 };
    let name = format!("crypto{id}");
    let opened = reg.open(&name, &mut source).unwrap();
    assert_eq!(opened, id);

    let mut backing = MemDisk { data: vec![0u8; SECTOR_SIZE * 4] };
    backing.data[..SECTOR_SIZE].copy_from_slice(&sector);

    let mut out = [0u8; SECTOR_SIZE];
    reg.read(id, 0, &mut out, &mut backing).unwrap();
    assert_eq!(&out[..], &plain[..]);

    reg.close(id, backing, &mut source).unwrap();
    assert_eq!(reg.get_by_id(id).unwrap().ref_count, 0);
}

#[test]
fn open_by_uuid_then_by_id_share_one_registration() {
    let mut reg = Registry::new();
    let id = reg
        .insert(CryptoDisk {
            id: 0,
            uuid: "deadbeef".to_string(),
            source_name: "hd1".to_string(),
            source: None,
            offset_sectors: 0,
            total_sectors: 1,
            ref_count: 0,
            mode: Mode::Ecb,
            mode_iv: None,
            cipher: Box::new(Aes128Cipher::new(&[0u8; 16])),
        })
        .unwrap();

    let mut source = MemSource { sectors: 1 };
    let by_uuid = reg.open("cryptouuid/DEADBEEF", &mut source).unwrap();
    assert_eq!(by_uuid, id);

    let by_id = reg.open(&format!("crypto{id}"), &mut source).unwrap();
    assert_eq!(by_id, id);
    assert_eq!(reg.get_by_id(id).unwrap().ref_count, 2);
}
