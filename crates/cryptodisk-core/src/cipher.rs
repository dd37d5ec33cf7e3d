//! Capability traits for the block ciphers and hashes the core consumes.
//!
//! Block-cipher and hash primitives are treated as external collaborators:
//! this module only describes the shape of what the core needs from them,
//! an in-place, `GenericArray`-free convention matching how RustCrypto's
//! own `cipher::BlockEncrypt`/`BlockDecrypt` traits are typically wrapped.
//! Concrete ciphers live outside this crate entirely; tests supply thin
//! adapters around real RustCrypto crates.

use crate::error::CryptoDiskError;

/// A block cipher handle: fixed block size, installable key, in-place
/// single-block encrypt/decrypt.
pub trait CipherHandle {
    /// Block size in bytes, expected in `1..=128`; in practice 16.
    fn block_size(&self) -> usize;

    /// Installs a raw key. Implementations validate key length themselves.
    fn set_key(&mut self, key: &[u8]) -> Result<(), CryptoDiskError>;

    /// Encrypts one block of `block_size()` bytes in place.
    fn encrypt_block(&self, block: &mut [u8]);

    /// Decrypts one block of `block_size()` bytes in place.
    ///
    /// Returns [`CryptoDiskError::NotSupported`] if this handle has no
    /// decryption implementation.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoDiskError>;
}

/// ECB-decrypts every block of `data` in place using `cipher`.
///
/// `data.len()` must be a multiple of the cipher's block size.
pub fn ecb_decrypt(cipher: &dyn CipherHandle, data: &mut [u8]) -> Result<(), CryptoDiskError> {
    let bs = cipher.block_size();
    if data.len() % bs != 0 {
        return Err(CryptoDiskError::InvalidArgument);
    }
    for block in data.chunks_mut(bs) {
        cipher.decrypt_block(block)?;
    }
    Ok(())
}

/// ECB-encrypts every block of `data` in place using `cipher`.
pub fn ecb_encrypt(cipher: &dyn CipherHandle, data: &mut [u8]) -> Result<(), CryptoDiskError> {
    let bs = cipher.block_size();
    if data.len() % bs != 0 {
        return Err(CryptoDiskError::InvalidArgument);
    }
    for block in data.chunks_mut(bs) {
        cipher.encrypt_block(block);
    }
    Ok(())
}

/// A hash handle: fixed digest length, one-shot digest over concatenated
/// input parts.
pub trait HashHandle {
    /// Length in bytes of one digest.
    fn digest_len(&self) -> usize;

    /// Hashes the concatenation of `parts` into `out`, truncating to
    /// `out.len()` bytes if the digest is longer.
    fn digest(&self, parts: &[&[u8]], out: &mut [u8]);
}
