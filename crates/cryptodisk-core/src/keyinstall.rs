//! Key installation: `grub_cryptodisk_setkey`'s split of
//! a caller-supplied key material blob into the primary cipher key, the
//! XTS secondary key, and the LRW tweak key, followed by whatever
//! derived setup each mode needs (ESSIV's hashed key, LRW's precalc table).

use crate::chaining::build_lrw_precalc;
use crate::cipher::{CipherHandle, HashHandle};
use crate::descriptor::Mode;
use crate::error::CryptoDiskError;
use crate::gf::GF_BYTES;
use crate::iv::ModeIv;

/// Installs `key` into `cipher`, and into any secondary key material `mode`
/// and `mode_iv` structurally carry.
///
/// `real_keysize` is the number of bytes of `key` that belong to the
/// *primary* cipher: for XTS this is half of `key.len()`, computed as a
/// single expression rather than GRUB's two-branch `is_doubled` dance since
/// "half the total" is what both branches reduce to. For LRW it is
/// `key.len() - GF_BYTES` (the tweak key occupies the tail). For every
/// other mode it is the whole of `key`.
pub fn setkey(
    cipher: &mut dyn CipherHandle,
    mode: &mut Mode,
    mode_iv: &mut Option<ModeIv>,
    key: &[u8],
) -> Result<(), CryptoDiskError> {
    let real_keysize = match mode {
        Mode::Xts { .. } => key.len() / 2,
        Mode::Lrw { .. } => key
            .len()
            .checked_sub(GF_BYTES)
            .ok_or(CryptoDiskError::InvalidArgument)?,
        Mode::Ecb | Mode::Cbc | Mode::Pcbc => key.len(),
    };

    log::trace!("setkey: installing a {real_keysize}-byte primary key out of {} bytes total", key.len());
    cipher.set_key(&key[..real_keysize])?;

    match mode {
        Mode::Xts { secondary } => {
            secondary.set_key(&key[real_keysize..])?;
        }
        Mode::Lrw { precalc, lrw_key } => {
            lrw_key.copy_from_slice(&key[real_keysize..real_keysize + GF_BYTES]);
            **precalc = build_lrw_precalc(lrw_key);
        }
        Mode::Ecb | Mode::Cbc | Mode::Pcbc => {}
    }

    if let Some(ModeIv::Essiv { cipher: essiv_cipher, hash }) = mode_iv {
        let mut digest = [0u8; 64];
        let len = hash.digest_len();
        if len > digest.len() {
            return Err(CryptoDiskError::InvalidArgument);
        }
        hash.digest(&[key], &mut digest[..len]);
        essiv_cipher.set_key(&digest[..len])?;
    }

    Ok(())
}
