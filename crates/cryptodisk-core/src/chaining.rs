//! Chaining-mode sector decryption, plus LRW's tweak table helper.

use crate::cipher::CipherHandle;
use crate::error::CryptoDiskError;
use crate::gf;

/// Number of 16-byte blocks in a sector, and the number of table entries
/// LRW precalculates: one per in-sector block position.
pub const LRW_PRECALC_ENTRIES: usize = 32;

/// The LRW tweak-precalculation table: `precalc[k]` holds `lrw_key * k`
/// (`k` treated as a GF(2^128) element with only its low byte set), so a
/// per-block tweak within a sector is one XOR against a sector-wide base
/// value instead of a fresh field multiplication.
pub type LrwPrecalc = [[u8; gf::GF_BYTES]; LRW_PRECALC_ENTRIES];

/// Builds the LRW precalculation table from the secondary ("tweak") key.
///
/// `lrw_key` must already be exactly [`gf::GF_BYTES`] bytes; the descriptor
/// that owns the table is responsible for deriving it that way from the
/// tail of the installed key.
pub fn build_lrw_precalc(lrw_key: &[u8; gf::GF_BYTES]) -> LrwPrecalc {
    let mut table = [[0u8; gf::GF_BYTES]; LRW_PRECALC_ENTRIES];
    for (k, entry) in table.iter_mut().enumerate() {
        let mut idx = [0u8; gf::GF_BYTES];
        idx[gf::GF_BYTES - 1] = k as u8;
        *entry = gf::mul_be(&idx, lrw_key);
    }
    table
}

/// The per-sector state `generate_lrw_sector` derives from the sector's IV:
/// the GF multiplier for the block positions before a 32-block wraparound
/// (`low`) and, if the IV's block offset isn't sector-aligned, the
/// multiplier for positions after it (`high`).
struct LrwSector {
    low: [u8; gf::GF_BYTES],
    high: [u8; gf::GF_BYTES],
    low_byte: u8,
    low_byte_c: u8,
}

/// Derives the per-sector LRW tweak bases from the sector's IV.
///
/// The IV's last byte's low 5 bits select where, among the 32 block
/// positions in a sector, this sector's tweak sequence starts; the
/// remaining IV bits (with those 5 bits masked off) are the GF index of
/// the start of the current 32-block-aligned window. `low` is the tweak
/// base for that window; `high` is the base for the next one, needed only
/// when the starting offset isn't already block 0.
fn generate_lrw_sector(lrw_key: &[u8; gf::GF_BYTES], iv: &[u8; gf::GF_BYTES]) -> LrwSector {
    let per_sector = LRW_PRECALC_ENTRIES as u8;
    let mut idx = *iv;
    let low_byte = idx[gf::GF_BYTES - 1] & (per_sector - 1);
    let low_byte_c = ((per_sector - 1) & !low_byte) + 1;
    idx[gf::GF_BYTES - 1] &= !(per_sector - 1);
    let low = gf::mul_be(lrw_key, &idx);

    if low_byte == 0 {
        return LrwSector { low, high: [0u8; gf::GF_BYTES], low_byte, low_byte_c };
    }

    let carry = idx[gf::GF_BYTES - 1] as u16 + per_sector as u16;
    if carry & 0x100 != 0 {
        for byte in idx[..gf::GF_BYTES - 1].iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
    }
    idx[gf::GF_BYTES - 1] = carry as u8;
    let high = gf::mul_be(lrw_key, &idx);
    LrwSector { low, high, low_byte, low_byte_c }
}

/// Tweak for the block at `position` (0..32) within a sector already
/// described by `sector`.
fn lrw_block_tweak(sector: &LrwSector, precalc: &LrwPrecalc, position: usize) -> [u8; gf::GF_BYTES] {
    let mut tweak = if position < sector.low_byte_c as usize {
        sector.low
    } else {
        sector.high
    };
    let precalc_index = if position < sector.low_byte_c as usize {
        sector.low_byte as usize + position
    } else {
        position - sector.low_byte_c as usize
    };
    for (t, p) in tweak.iter_mut().zip(precalc[precalc_index].iter()) {
        *t ^= p;
    }
    tweak
}

fn xor_in_place(data: &mut [u8], mask: &[u8]) {
    for (d, m) in data.iter_mut().zip(mask.iter()) {
        *d ^= m;
    }
}

/// The chaining mode and whatever per-call key material it needs beyond
/// the primary cipher.
pub enum Mode<'a> {
    Ecb,
    Cbc,
    Pcbc,
    Xts { secondary: &'a dyn CipherHandle },
    Lrw { precalc: &'a LrwPrecalc, lrw_key: &'a [u8; gf::GF_BYTES] },
}

/// Decrypts one sector's worth of ciphertext in place.
///
/// `data.len()` must be a multiple of the cipher's block size. `iv` is the
/// sector IV already produced by [`crate::iv::generate`]; LRW derives its
/// own per-sector tweak base from that same IV rather than from the raw
/// sector number, so it stays correct regardless of which IV scheme is
/// paired with it.
pub fn decrypt_sector(
    mode: &Mode,
    cipher: &dyn CipherHandle,
    iv: &[u8],
    data: &mut [u8],
) -> Result<(), CryptoDiskError> {
    let bs = cipher.block_size();
    if bs == 0 || data.len() % bs != 0 {
        return Err(CryptoDiskError::InvalidArgument);
    }

    match mode {
        Mode::Ecb => {
            for block in data.chunks_mut(bs) {
                cipher.decrypt_block(block)?;
            }
            Ok(())
        }
        Mode::Cbc => {
            let mut prev = [0u8; 32];
            prev[..bs].copy_from_slice(&iv[..bs]);
            for block in data.chunks_mut(bs) {
                let saved_ct: [u8; 32] = {
                    let mut buf = [0u8; 32];
                    buf[..bs].copy_from_slice(block);
                    buf
                };
                cipher.decrypt_block(block)?;
                xor_in_place(block, &prev[..bs]);
                prev[..bs].copy_from_slice(&saved_ct[..bs]);
            }
            Ok(())
        }
        Mode::Pcbc => {
            let mut prev = [0u8; 32];
            prev[..bs].copy_from_slice(&iv[..bs]);
            for block in data.chunks_mut(bs) {
                let saved_ct: [u8; 32] = {
                    let mut buf = [0u8; 32];
                    buf[..bs].copy_from_slice(block);
                    buf
                };
                cipher.decrypt_block(block)?;
                xor_in_place(block, &prev[..bs]);
                // PCBC feeds back ciphertext XOR plaintext into the next IV.
                for i in 0..bs {
                    prev[i] = saved_ct[i] ^ block[i];
                }
            }
            Ok(())
        }
        Mode::Xts { secondary } => {
            if bs != gf::GF_BYTES {
                return Err(CryptoDiskError::InvalidArgument);
            }
            let mut tweak = [0u8; gf::GF_BYTES];
            tweak.copy_from_slice(&iv[..gf::GF_BYTES]);
            secondary.encrypt_block(&mut tweak);
            for block in data.chunks_mut(bs) {
                xor_in_place(block, &tweak);
                cipher.decrypt_block(block)?;
                xor_in_place(block, &tweak);
                gf::mul_x_le(&mut tweak);
            }
            Ok(())
        }
        Mode::Lrw { precalc, lrw_key } => {
            if bs != gf::GF_BYTES {
                return Err(CryptoDiskError::InvalidArgument);
            }
            let mut iv_arr = [0u8; gf::GF_BYTES];
            iv_arr.copy_from_slice(&iv[..gf::GF_BYTES]);
            let sector = generate_lrw_sector(lrw_key, &iv_arr);
            for (i, block) in data.chunks_mut(bs).enumerate() {
                let tweak = lrw_block_tweak(&sector, precalc, i);
                xor_in_place(block, &tweak);
                cipher.decrypt_block(block)?;
                xor_in_place(block, &tweak);
            }
            Ok(())
        }
    }
}
