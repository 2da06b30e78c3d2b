//! Compact JWE (RFC 7516) with RSA-OAEP key transport and AES-GCM content encryption.
//!
//! Person-data responses are signed by the provider and then encrypted to
//! the caller's public key. Opening one is a two-stage pipeline:
//!
//! ```text
//! JWE --unwrap_jwe(private key)--> NestedJws --verify(provider key)--> JSON
//! ```
//!
//! [`NestedJws`] is decrypted but not yet trusted; the only way to read its
//! claims is through signature verification.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};
use rsa::rand_core::OsRng;
use rsa::Oaep;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sgverify_crypto::{base64url_decode, base64url_encode, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::AuthError;
use crate::jws::verify_jws_as;

/// AES-GCM IV length.
const IV_LENGTH: usize = 12;
/// AES-GCM authentication tag length.
const TAG_LENGTH: usize = 16;

/// JWE key management algorithm (`alg`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyManagement {
    /// RSAES OAEP with SHA-1 and MGF1-SHA-1
    RsaOaep,
    /// RSAES OAEP with SHA-256 and MGF1-SHA-256
    RsaOaep256,
}

impl KeyManagement {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyManagement::RsaOaep => "RSA-OAEP",
            KeyManagement::RsaOaep256 => "RSA-OAEP-256",
        }
    }

    pub fn parse(alg: &str) -> Result<Self, AuthError> {
        match alg {
            "RSA-OAEP" => Ok(KeyManagement::RsaOaep),
            "RSA-OAEP-256" => Ok(KeyManagement::RsaOaep256),
            other => Err(AuthError::UnsupportedAlgorithm(format!("JWE alg: {}", other))),
        }
    }

    fn padding(self) -> Oaep {
        match self {
            KeyManagement::RsaOaep => Oaep::new::<sha1::Sha1>(),
            KeyManagement::RsaOaep256 => Oaep::new::<sha2::Sha256>(),
        }
    }
}

/// JWE content encryption algorithm (`enc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncryption {
    A128Gcm,
    A256Gcm,
}

impl ContentEncryption {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentEncryption::A128Gcm => "A128GCM",
            ContentEncryption::A256Gcm => "A256GCM",
        }
    }

    pub fn parse(enc: &str) -> Result<Self, AuthError> {
        match enc {
            "A128GCM" => Ok(ContentEncryption::A128Gcm),
            "A256GCM" => Ok(ContentEncryption::A256Gcm),
            other => Err(AuthError::UnsupportedAlgorithm(format!("JWE enc: {}", other))),
        }
    }

    /// Content encryption key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            ContentEncryption::A128Gcm => 16,
            ContentEncryption::A256Gcm => 32,
        }
    }
}

/// A compact JWS recovered from a JWE, not yet signature-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedJws(String);

impl NestedJws {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify the inner signature and parse the payload.
    pub fn verify(&self, public_key: &RsaPublicKey) -> Result<Value, AuthError> {
        verify_jws_as(&self.0, public_key)
    }

    pub fn verify_as<T: DeserializeOwned>(&self, public_key: &RsaPublicKey) -> Result<T, AuthError> {
        verify_jws_as(&self.0, public_key)
    }
}

/// Decrypt a signed-then-encrypted payload and verify the inner signature.
///
/// # Arguments
/// * `jwe` - Compact JWE string (5 base64url parts separated by dots)
/// * `public_key` - Provider key that signed the inner JWS
/// * `private_key` - Caller key the JWE was encrypted to
pub fn decrypt_jwe(
    jwe: &str,
    public_key: &RsaPublicKey,
    private_key: &RsaPrivateKey,
) -> Result<Value, AuthError> {
    unwrap_jwe(jwe, private_key)?.verify(public_key)
}

/// Like [`decrypt_jwe`], deserializing the verified payload into `T`.
pub fn decrypt_jwe_as<T: DeserializeOwned>(
    jwe: &str,
    public_key: &RsaPublicKey,
    private_key: &RsaPrivateKey,
) -> Result<T, AuthError> {
    unwrap_jwe(jwe, private_key)?.verify_as(public_key)
}

/// Decrypt a compact JWE, yielding the nested JWS.
pub fn unwrap_jwe(jwe: &str, private_key: &RsaPrivateKey) -> Result<NestedJws, AuthError> {
    let plaintext = decrypt_compact(jwe, private_key)?;
    let text = String::from_utf8(plaintext)
        .map_err(|_| AuthError::MalformedToken("JWE plaintext is not UTF-8".to_string()))?;

    // Some providers JSON-encode the nested token as a string literal.
    let text = text.trim();
    let inner = if text.starts_with('"') {
        serde_json::from_str::<String>(text)
            .map_err(|e| AuthError::MalformedToken(format!("JWE plaintext: {}", e)))?
    } else {
        text.to_string()
    };
    Ok(NestedJws(inner))
}

/// Decrypt a compact JWE string to its raw plaintext bytes.
pub fn decrypt_compact(jwe: &str, private_key: &RsaPrivateKey) -> Result<Vec<u8>, AuthError> {
    // 1. Parse compact JWE: header.encrypted_key.iv.ciphertext.tag
    let parts: Vec<&str> = jwe.trim().split('.').collect();
    if parts.len() != 5 {
        return Err(AuthError::MalformedToken(format!(
            "JWE: expected 5 segments, got {}",
            parts.len()
        )));
    }

    let header_b64 = parts[0];
    let encrypted_key_b64 = parts[1];
    let iv_b64 = parts[2];
    let ciphertext_b64 = parts[3];
    let tag_b64 = parts[4];

    // 2. Decode header and resolve algorithms
    let header_bytes = decode_segment(header_b64, "header")?;
    let header: Value = serde_json::from_slice(&header_bytes)
        .map_err(|e| AuthError::MalformedToken(format!("JWE header: {}", e)))?;

    let alg = header["alg"]
        .as_str()
        .ok_or_else(|| AuthError::MalformedToken("missing alg in JWE header".to_string()))?;
    let enc = header["enc"]
        .as_str()
        .ok_or_else(|| AuthError::MalformedToken("missing enc in JWE header".to_string()))?;
    let alg = KeyManagement::parse(alg)?;
    let enc = ContentEncryption::parse(enc)?;

    // 3. Decode the remaining segments
    let encrypted_key = decode_segment(encrypted_key_b64, "encrypted key")?;
    let iv = decode_segment(iv_b64, "iv")?;
    if iv.len() != IV_LENGTH {
        return Err(AuthError::MalformedToken(format!(
            "JWE iv: expected {} bytes, got {}",
            IV_LENGTH,
            iv.len()
        )));
    }
    let ciphertext = decode_segment(ciphertext_b64, "ciphertext")?;
    let tag = decode_segment(tag_b64, "tag")?;

    // 4. RSA-OAEP unwrap CEK
    let cek = Zeroizing::new(
        private_key
            .decrypt(alg.padding(), &encrypted_key)
            .map_err(|e| AuthError::DecryptionFailed(format!("{} unwrap: {}", alg.as_str(), e)))?,
    );
    if cek.len() != enc.key_len() {
        return Err(AuthError::DecryptionFailed(format!(
            "CEK for {}: expected {} bytes, got {}",
            enc.as_str(),
            enc.key_len(),
            cek.len()
        )));
    }

    // 5. AES-GCM decrypt; aes-gcm expects ciphertext || tag
    let mut ct_with_tag = ciphertext;
    ct_with_tag.extend_from_slice(&tag);

    // AAD is the protected header base64url string (ASCII bytes)
    gcm_decrypt(enc, &cek, &iv, &ct_with_tag, header_b64.as_bytes())
}

/// Encrypt plaintext as a compact JWE to the recipient's RSA public key.
///
/// # Returns
/// Compact JWE string (5 base64url parts separated by dots).
pub fn encrypt_jwe(
    plaintext: &[u8],
    recipient: &RsaPublicKey,
    alg: KeyManagement,
    enc: ContentEncryption,
) -> Result<String, AuthError> {
    let mut cek = Zeroizing::new(vec![0u8; enc.key_len()]);
    getrandom::getrandom(&mut cek)
        .map_err(|e| AuthError::EncryptionFailed(format!("RNG failed: {}", e)))?;

    let wrapped_cek = recipient
        .encrypt(&mut OsRng, alg.padding(), &cek)
        .map_err(|e| AuthError::EncryptionFailed(format!("{} wrap: {}", alg.as_str(), e)))?;

    let header = serde_json::json!({ "alg": alg.as_str(), "enc": enc.as_str() });
    let header_b64 = base64url_encode(serde_json::to_string(&header)?.as_bytes());

    let mut iv = [0u8; IV_LENGTH];
    getrandom::getrandom(&mut iv)
        .map_err(|e| AuthError::EncryptionFailed(format!("RNG failed: {}", e)))?;

    let nonce = Nonce::from_slice(&iv);
    let payload = Payload {
        msg: plaintext,
        aad: header_b64.as_bytes(),
    };
    let sealed = match enc {
        ContentEncryption::A128Gcm => Aes128Gcm::new_from_slice(&cek)
            .map_err(|e| AuthError::EncryptionFailed(format!("AES-GCM init: {:?}", e)))?
            .encrypt(nonce, payload),
        ContentEncryption::A256Gcm => Aes256Gcm::new_from_slice(&cek)
            .map_err(|e| AuthError::EncryptionFailed(format!("AES-GCM init: {:?}", e)))?
            .encrypt(nonce, payload),
    };
    let ciphertext_with_tag =
        sealed.map_err(|e| AuthError::EncryptionFailed(format!("AES-GCM encrypt: {:?}", e)))?;

    // Last 16 bytes are the tag
    let tag_offset = ciphertext_with_tag.len() - TAG_LENGTH;

    Ok(format!(
        "{}.{}.{}.{}.{}",
        header_b64,
        base64url_encode(&wrapped_cek),
        base64url_encode(&iv),
        base64url_encode(&ciphertext_with_tag[..tag_offset]),
        base64url_encode(&ciphertext_with_tag[tag_offset..])
    ))
}

fn gcm_decrypt(
    enc: ContentEncryption,
    cek: &[u8],
    iv: &[u8],
    ct_with_tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, AuthError> {
    let nonce = Nonce::from_slice(iv);
    let payload = Payload {
        msg: ct_with_tag,
        aad,
    };
    let opened = match enc {
        ContentEncryption::A128Gcm => Aes128Gcm::new_from_slice(cek)
            .map_err(|e| AuthError::DecryptionFailed(format!("AES-GCM init: {:?}", e)))?
            .decrypt(nonce, payload),
        ContentEncryption::A256Gcm => Aes256Gcm::new_from_slice(cek)
            .map_err(|e| AuthError::DecryptionFailed(format!("AES-GCM init: {:?}", e)))?
            .decrypt(nonce, payload),
    };
    opened.map_err(|e| AuthError::DecryptionFailed(format!("AES-GCM decrypt: {:?}", e)))
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, AuthError> {
    base64url_decode(segment).map_err(|e| AuthError::MalformedToken(format!("JWE {}: {}", name, e)))
}
