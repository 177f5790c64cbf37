//! Argon2id key derivation with label-based domain separation.
//!
//! Parameters are fixed at compile time per the vault's security
//! argument: parallelism 4, memory cost 8192 KiB, time cost 100
//! iterations, version 1.3. Every derivation is deliberately slow —
//! on the order of a second on commodity hardware — since that cost is
//! what stands between an attacker and a brute-force search of the
//! passphrase space.
//!
//! The `argon2` crate's public `hash_password_into` takes only password,
//! salt, and an output buffer — it has no raw associated-data parameter.
//! Domain separation between the `"data"`, `"names"`, and `"files"` uses
//! is instead achieved by folding the label into the salt before Argon2
//! ever sees it: `effective_salt = SHA-256(label || 0x00 || salt)`. A
//! different label therefore always derives an independent key for a
//! fixed (passphrase, salt) pair, which is the guarantee the vault
//! actually depends on (see DESIGN.md).

use argon2::{Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::secure::SensitiveBuffer;

pub const SALT_LEN: usize = 32;

const ARGON2_MEMORY_KIB: u32 = 8192;
const ARGON2_TIME_COST: u32 = 100;
const ARGON2_PARALLELISM: u32 = 4;

fn effective_salt(salt: &[u8; SALT_LEN], label: &str) -> [u8; SALT_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update([0u8]);
    hasher.update(salt);
    let digest = hasher.finalize();
    let mut out = [0u8; SALT_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Derive `out_len` raw bytes of key material from `passphrase`, `salt`,
/// and `label`. The result is held in a sensitive buffer for the rest of
/// its life. `passphrase` is the raw UTF-8 bytes of the master
/// passphrase with no terminator.
pub fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN], label: &str, out_len: usize) -> Result<SensitiveBuffer> {
    let salt = effective_salt(salt, label);
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_TIME_COST, ARGON2_PARALLELISM, Some(out_len))
        .map_err(|e| Error::internal(format!("invalid Argon2 parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut buf = SensitiveBuffer::acquire(out_len)?;
    argon2
        .hash_password_into(passphrase, &salt, buf.as_mut_slice())
        .map_err(|e| Error::internal(format!("Argon2 derivation failed: {e}")))?;
    Ok(buf)
}

/// Derive a NUL-terminated lowercase-hex filename of `max_chars`
/// characters (including the terminator), i.e. `max_chars - 1` hex
/// digits from `(max_chars - 1) / 2` derived bytes. With
/// `max_chars = 65` this yields the 64-hex-digit filenames the vault
/// uses to hide item names in directory listings.
pub fn derive_name(passphrase: &[u8], salt: &[u8; SALT_LEN], label: &str, max_chars: usize) -> Result<String> {
    if max_chars == 0 || max_chars % 2 != 1 {
        return Err(Error::internal("derive_name requires an odd max_chars (NUL terminator + even hex digits)"));
    }
    let hex_digits = max_chars - 1;
    let byte_len = hex_digits / 2;
    let buf = derive_key(passphrase, salt, label, byte_len)?;
    Ok(hex::encode(buf.as_slice()))
}
