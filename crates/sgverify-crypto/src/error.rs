use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid public certificate: {0}")]
    InvalidCertificate(String),

    #[error("Unsupported PEM label: {0}")]
    UnsupportedPemLabel(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Base64 decode error: {0}")]
    Base64Decode(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
