//! Cryptographically strong random bytes for salts, nonces, and generated
//! passwords. Must not block and must not silently hand back a short
//! buffer — either is a fatal internal error for a vault.

use rand_core::{OsRng, RngCore};

use crate::error::{Error, Result};

/// Fill `buf` with cryptographically strong random bytes from the OS
/// source. A failure to fill the entire buffer is treated as fatal: the
/// vault refuses to proceed with weakened randomness.
pub fn fill(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::internal(format!("random source failed: {e}")))
}

pub fn bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    fill(&mut buf)?;
    Ok(buf)
}
