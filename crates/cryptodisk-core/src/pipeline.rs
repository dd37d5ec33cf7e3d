//! Multi-sector decrypt pipeline: the cryptodisk analogue
//! of `grub_cryptodisk_decrypt`. Validates the buffer, then walks sector by
//! sector deriving each IV and handing the sector to [`chaining::decrypt_sector`].

use cryptodisk_io::SECTOR_SIZE;

use crate::chaining::{self, Mode};
use crate::cipher::CipherHandle;
use crate::error::CryptoDiskError;
use crate::iv::{self, ModeIv, IV_MAX_LEN};

/// Decrypts `data` in place. `data.len()` must be a whole number of sectors;
/// `start_sector` is the absolute plaintext sector number of `data[0]`, the
/// quantity IV derivation is keyed on (LRW's own tweak index then derives
/// from that sector's generated IV, not from the sector number directly).
///
/// Mirrors the source's early-out: when the scheme needs no IV at all
/// (`ModeIv` is structurally absent, i.e. a bare ECB/ no-IV configuration)
/// there is nothing sector-dependent to recompute, but every call here still
/// goes through the per-sector loop since IV derivation itself is cheap and
/// keeps the code path uniform across modes.
pub fn decrypt(
    mode: &Mode,
    mode_iv: Option<&ModeIv>,
    cipher: &dyn CipherHandle,
    start_sector: u64,
    data: &mut [u8],
) -> Result<(), CryptoDiskError> {
    if data.len() % SECTOR_SIZE != 0 {
        log::warn!("decrypt: buffer length {} is not a multiple of the sector size", data.len());
        return Err(CryptoDiskError::InvalidArgument);
    }

    let blocksize = cipher.block_size();
    if blocksize == 0 || blocksize > 128 {
        log::warn!("decrypt: cipher block size {blocksize} out of range");
        return Err(CryptoDiskError::InvalidArgument);
    }

    log::trace!(
        "decrypt: {} sectors starting at {start_sector}",
        data.len() / SECTOR_SIZE
    );

    for (i, sector) in data.chunks_mut(SECTOR_SIZE).enumerate() {
        let sector_index = start_sector + i as u64;
        let mut iv_buf = [0u8; IV_MAX_LEN];
        let iv_slice: &[u8] = match mode_iv {
            Some(scheme) => {
                iv::generate(scheme, sector_index, blocksize, &mut iv_buf);
                &iv_buf[..blocksize]
            }
            None => &iv_buf[..blocksize],
        };

        chaining::decrypt_sector(mode, cipher, iv_slice, sector)?;
    }

    Ok(())
}
