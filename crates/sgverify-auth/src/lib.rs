//! Provider-facing authentication primitives for the SG Verify connector.
//!
//! This crate provides:
//! - `PKI_SIGN` authorization headers over canonical base strings
//! - RS256 JWS verification (and signing, for provider simulators)
//! - RSA-OAEP / AES-GCM JWE decryption, chained into JWS verification
//!
//! Request orchestration (token exchange, person retrieval) lives in the
//! `sgverify` crate.

mod error;
mod jwe;
mod jws;
mod pki;

pub use error::AuthError;
pub use jwe::{
    decrypt_compact, decrypt_jwe, decrypt_jwe_as, encrypt_jwe, unwrap_jwe, ContentEncryption,
    KeyManagement, NestedJws,
};
pub use jws::{decode_jws_payload_unverified, sign_jws, verify_jws, verify_jws_as, RS256};
pub use pki::{
    signature_base_string, AuthorizationHeader, HttpMethod, PkiSigner, SigningRequest,
    FORM_URLENCODED, PKI_SIGN,
};
