use rand::TryRngCore;
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("secure random source unavailable: {0}")]
pub struct EntropyError(String);

/// `len` bytes from the operating system CSPRNG, lowercase hex encoded.
///
/// There is no fallback generator: if the OS source fails the caller gets
/// the error.
pub fn random_hex(len: usize) -> Result<String, EntropyError> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| EntropyError(e.to_string()))?;
    Ok(hex::encode(buf))
}
