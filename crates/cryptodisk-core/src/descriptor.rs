//! The cryptodisk descriptor and its decrypt entry point, tying together
//! mode, mode_iv, and the installed ciphers into the one object the
//! registry hands out.

use alloc::boxed::Box;
use alloc::string::String;

use crate::chaining::{LrwPrecalc, Mode as ChainMode};
use crate::cipher::CipherHandle;
use crate::error::CryptoDiskError;
use crate::gf;
use crate::iv::ModeIv;
use crate::pipeline;

/// The chaining mode and whatever key material it structurally requires:
/// XTS carries a secondary cipher, LRW carries a precalculated tweak table
/// plus the raw tweak key the table was built from (needed again per sector
/// to derive that sector's tweak base from its IV).
pub enum Mode {
    Ecb,
    Cbc,
    Pcbc,
    Xts { secondary: Box<dyn CipherHandle> },
    Lrw {
        precalc: Box<LrwPrecalc>,
        lrw_key: [u8; gf::GF_BYTES],
    },
}

/// A single configured cryptodisk, the unit the registry stores and looks
/// up.
pub struct CryptoDisk {
    /// Numeric id assigned on insertion, surfaced as device name `crypto<id>`.
    pub id: u32,
    /// Lowercase hex UUID, matched case-insensitively on lookup.
    pub uuid: String,
    /// Name of the backing disk this descriptor decrypts, e.g. `"hd0,gpt1"`.
    pub source_name: String,
    /// Identity of the currently-open backing disk, if any.
    pub source: Option<cryptodisk_io::DiskIdentity>,
    /// First sector of the encrypted payload on the backing disk.
    pub offset_sectors: u64,
    /// Length of the encrypted payload, in 512-byte sectors.
    pub total_sectors: u64,
    /// Open reference count; the backing disk is released when this drops
    /// to zero.
    pub ref_count: u32,

    pub mode: Mode,
    pub mode_iv: Option<ModeIv>,
    pub cipher: Box<dyn CipherHandle>,
}

impl CryptoDisk {
    /// Decrypts `data` read from absolute backing-disk sector `disk_sector`.
    ///
    /// Callers must ensure `disk_sector >= self.offset_sectors` and
    /// `disk_sector + data.len() / 512 <= self.offset_sectors + self.total_sectors`;
    /// this method trusts the range it's given rather than re-checking it.
    pub fn decrypt(&self, disk_sector: u64, data: &mut [u8]) -> Result<(), CryptoDiskError> {
        let plain_sector = disk_sector - self.offset_sectors;
        let chain_mode = match &self.mode {
            Mode::Ecb => ChainMode::Ecb,
            Mode::Cbc => ChainMode::Cbc,
            Mode::Pcbc => ChainMode::Pcbc,
            Mode::Xts { secondary } => ChainMode::Xts {
                secondary: secondary.as_ref(),
            },
            Mode::Lrw { precalc, lrw_key } => ChainMode::Lrw {
                precalc: precalc.as_ref(),
                lrw_key,
            },
        };

        pipeline::decrypt(
            &chain_mode,
            self.mode_iv.as_ref(),
            self.cipher.as_ref(),
            plain_sector,
            data,
        )
    }
}
