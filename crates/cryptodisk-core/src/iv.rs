//! Per-sector IV derivation: the schemes a chaining mode can be paired with
//! to turn a sector index into the initial value each sector's decryption
//! starts from.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::cipher::{CipherHandle, HashHandle};

/// Upper bound on the IV buffer, reserved inline so sector decryption never
/// allocates on the hot path.
pub const IV_MAX_LEN: usize = 32;

/// The IV scheme configured for a descriptor. Each variant carries exactly
/// the state its scheme needs.
pub enum ModeIv {
    /// All-zero IV; the only scheme ECB is allowed to use.
    Null,
    /// Low 32 bits of the sector index, little-endian, in `iv[0..4]`.
    Plain32,
    /// [`ModeIv::Plain32`] plus the high 32 bits in `iv[4..8]`.
    Plain64,
    /// `(sector << log) + 1`, big-endian 64-bit, in the *last* 8 bytes.
    Benbi { log: u32 },
    /// [`ModeIv::Plain32`], then ECB-encrypted under a key derived by
    /// hashing the main key.
    Essiv {
        cipher: Box<dyn CipherHandle>,
        hash: Box<dyn HashHandle>,
    },
    /// `hash(prefix || le64(sector << 9))`, truncated to the block size.
    Bytecount64Hash {
        hash: Box<dyn HashHandle>,
        prefix: Vec<u8>,
    },
}

/// Computes the IV for absolute plaintext sector `sector` into `iv[..blocksize]`.
///
/// `iv` is zeroed first; callers pass a fresh buffer per sector, never
/// reusing one across sectors.
pub fn generate(mode_iv: &ModeIv, sector: u64, blocksize: usize, iv: &mut [u8; IV_MAX_LEN]) {
    iv.fill(0);
    match mode_iv {
        ModeIv::Null => {}
        ModeIv::Plain32 => {
            iv[0..4].copy_from_slice(&(sector as u32).to_le_bytes());
        }
        ModeIv::Plain64 => {
            iv[0..4].copy_from_slice(&(sector as u32).to_le_bytes());
            iv[4..8].copy_from_slice(&((sector >> 32) as u32).to_le_bytes());
        }
        ModeIv::Benbi { log } => {
            let num = (sector << log) + 1;
            iv[blocksize - 8..blocksize].copy_from_slice(&num.to_be_bytes());
        }
        ModeIv::Essiv { cipher, .. } => {
            iv[0..4].copy_from_slice(&(sector as u32).to_le_bytes());
            cipher.encrypt_block(&mut iv[..blocksize]);
        }
        ModeIv::Bytecount64Hash { hash, prefix } => {
            let byte_offset = sector << 9;
            let counter = byte_offset.to_le_bytes();
            let mut digest = [0u8; IV_MAX_LEN];
            hash.digest(&[prefix.as_slice(), &counter], &mut digest[..blocksize]);
            iv[..blocksize].copy_from_slice(&digest[..blocksize]);
        }
    }
}
