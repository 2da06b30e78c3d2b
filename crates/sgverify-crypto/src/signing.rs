//! RSASSA-PKCS1-v1_5 with SHA-256 (RS256) signing and verification.

use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::encoding::base64_encode;
use crate::error::CryptoError;

/// Sign a message with RS256.
///
/// # Returns
/// Raw signature bytes (modulus length).
pub fn sign_rs256(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let digest = Sha256::digest(message);
    private_key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))
}

/// Sign a message with RS256 and encode the signature as standard base64.
pub fn sign_rs256_base64(private_key: &RsaPrivateKey, message: &[u8]) -> Result<String, CryptoError> {
    sign_rs256(private_key, message).map(|signature| base64_encode(&signature))
}

/// Verify an RS256 signature.
///
/// # Returns
/// true if valid, false otherwise (never errors on invalid signature)
pub fn verify_rs256(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let digest = Sha256::digest(message);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .is_ok()
}
