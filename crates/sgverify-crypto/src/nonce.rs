//! Cryptographically random hex tokens for request nonces and transaction numbers.

use crate::error::CryptoError;

/// Default nonce size: 20 bytes, 40 hex characters.
pub const NONCE_BYTES: usize = 20;

/// Transaction number size: 10 bytes, 20 hex characters.
pub const TX_NO_BYTES: usize = 10;

/// Generate `bytes` random bytes from the OS CSPRNG, hex encoded.
pub fn generate_nonce_with_len(bytes: usize) -> Result<String, CryptoError> {
    let mut buf = vec![0u8; bytes];
    getrandom::getrandom(&mut buf).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(hex::encode(buf))
}

/// Generate a 40-character request nonce.
pub fn generate_nonce() -> Result<String, CryptoError> {
    generate_nonce_with_len(NONCE_BYTES)
}

/// Generate a 20-character transaction number.
pub fn generate_tx_no() -> Result<String, CryptoError> {
    generate_nonce_with_len(TX_NO_BYTES)
}
