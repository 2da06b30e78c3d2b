use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("JWS signature verification failed")]
    SignatureInvalid,

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("JWE decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("JWE encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] sgverify_crypto::CryptoError),
}
