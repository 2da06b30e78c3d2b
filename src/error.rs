use sgverify_auth::AuthError;
use sgverify_crypto::CryptoError;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by the connector. Every failure aborts the whole call.
#[derive(Debug, Error)]
pub enum SgVerifyError {
    #[error("Auth code not found in callback")]
    MissingAuthCode,

    #[error("Error occurred in callback [{error}] [{description}]")]
    CallbackError { error: String, description: String },

    #[error("Provider returned an error. Response code [{code}] [{message}]")]
    ProviderError { code: String, message: String },

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Auth error: {0}")]
    Auth(AuthError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<AuthError> for SgVerifyError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedToken(reason) => SgVerifyError::MalformedToken(reason),
            AuthError::SignatureInvalid => SgVerifyError::SignatureInvalid,
            AuthError::Crypto(inner) => SgVerifyError::Crypto(inner),
            other => SgVerifyError::Auth(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SgVerifyError>;
