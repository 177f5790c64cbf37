//! ChaCha20-Poly1305 with a 256-bit key, 96-bit nonce, 128-bit tag, and
//! always-empty associated data. The combined `Aead::encrypt`/`decrypt`
//! calls hand back ciphertext with the tag appended; this module splits
//! the trailing 16 bytes off into their own field at every call site,
//! because the on-disk record layout stores ciphertext and tag in
//! separate fixed-width fields rather than one packed blob.

use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, Key, KeyInit, Nonce};

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key`/`nonce` with empty associated data.
/// Returns ciphertext (same length as `plaintext`) and the 16-byte tag.
pub fn encrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::internal("chacha20poly1305 encryption failed"))?;
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&sealed[sealed.len() - TAG_LEN..]);
    sealed.truncate(sealed.len() - TAG_LEN);
    Ok((sealed, tag))
}

/// Decrypt and verify `ciphertext` against `tag`. Authentication failure
/// (wrong key or tampered bytes) is the sole signal this function gives;
/// callers decide whether that means "wrong passphrase" or "corrupted
/// item" based on which layer is calling.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
        .map_err(|_| Error::AuthFailed)
}
