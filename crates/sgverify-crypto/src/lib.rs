//! Cryptographic primitives for the SG Verify connector.
//!
//! - PEM loading of the caller's RSA private key and the provider certificate
//! - RS256 signing and verification
//! - Base64 and base64url helpers
//! - CSPRNG nonces and transaction numbers

pub mod encoding;
pub mod error;
pub mod keys;
pub mod nonce;
pub mod signing;

pub use encoding::{base64_decode, base64_encode, base64url_decode, base64url_encode};
pub use error::CryptoError;
pub use keys::{load_private_key, load_public_key};
pub use nonce::{generate_nonce, generate_nonce_with_len, generate_tx_no, NONCE_BYTES, TX_NO_BYTES};
pub use signing::{sign_rs256, sign_rs256_base64, verify_rs256};

pub use rsa::{RsaPrivateKey, RsaPublicKey};
