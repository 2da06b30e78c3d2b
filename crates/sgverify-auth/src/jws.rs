//! Compact JWS (RFC 7515) with RS256.
//!
//! Access tokens and the inner layer of person-data responses are RS256 JWS
//! objects signed by the provider. Only RS256 is accepted; a token claiming
//! any other `alg` is rejected before the signature is looked at.

use serde::de::DeserializeOwned;
use serde_json::Value;
use sgverify_crypto::{
    base64url_decode, base64url_encode, sign_rs256, verify_rs256, RsaPrivateKey, RsaPublicKey,
};

use crate::error::AuthError;

pub const RS256: &str = "RS256";

/// Verify a compact JWS against the provider key and parse its payload as JSON.
///
/// # Errors
/// - `MalformedToken` if the token is not three base64url segments with a JSON header
/// - `UnsupportedAlgorithm` if the header `alg` is not RS256
/// - `SignatureInvalid` if the signature does not verify
pub fn verify_jws(jws: &str, public_key: &RsaPublicKey) -> Result<Value, AuthError> {
    verify_jws_as(jws, public_key)
}

/// Like [`verify_jws`], deserializing the payload into `T`.
pub fn verify_jws_as<T: DeserializeOwned>(
    jws: &str,
    public_key: &RsaPublicKey,
) -> Result<T, AuthError> {
    let jws = jws.trim();
    let (header_b64, payload_b64, signature_b64) = split_jws(jws)?;

    let header = decode_json_segment(header_b64, "header")?;
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::MalformedToken("missing alg in JWS header".to_string()))?;
    if alg != RS256 {
        return Err(AuthError::UnsupportedAlgorithm(format!(
            "JWS alg: expected {}, got {}",
            RS256, alg
        )));
    }

    let signature = base64url_decode(signature_b64)
        .map_err(|e| AuthError::MalformedToken(format!("JWS signature: {}", e)))?;

    // Signing input is the ASCII of `header.payload` exactly as received.
    let signing_input = &jws[..header_b64.len() + 1 + payload_b64.len()];
    if !verify_rs256(public_key, signing_input.as_bytes(), &signature) {
        return Err(AuthError::SignatureInvalid);
    }

    let payload = base64url_decode(payload_b64)
        .map_err(|e| AuthError::MalformedToken(format!("JWS payload: {}", e)))?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Decode a JWS payload without checking the signature.
///
/// Only for environments where the provider does not sign its tokens.
pub fn decode_jws_payload_unverified(jws: &str) -> Result<Value, AuthError> {
    let (_, payload_b64, _) = split_jws(jws.trim())?;
    decode_json_segment(payload_b64, "payload")
}

/// Sign a JSON payload as a compact RS256 JWS.
pub fn sign_jws(payload: &Value, private_key: &RsaPrivateKey) -> Result<String, AuthError> {
    let header = serde_json::json!({ "alg": RS256, "typ": "JWT" });
    let header_b64 = base64url_encode(serde_json::to_string(&header)?.as_bytes());
    let payload_b64 = base64url_encode(serde_json::to_string(payload)?.as_bytes());

    let signing_input = format!("{}.{}", header_b64, payload_b64);
    let signature = sign_rs256(private_key, signing_input.as_bytes())?;

    Ok(format!("{}.{}", signing_input, base64url_encode(&signature)))
}

fn split_jws(jws: &str) -> Result<(&str, &str, &str), AuthError> {
    let parts: Vec<&str> = jws.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::MalformedToken(format!(
            "JWS: expected 3 segments, got {}",
            parts.len()
        )));
    }
    Ok((parts[0], parts[1], parts[2]))
}

fn decode_json_segment(segment: &str, name: &str) -> Result<Value, AuthError> {
    let bytes = base64url_decode(segment)
        .map_err(|e| AuthError::MalformedToken(format!("JWS {}: {}", name, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("JWS {}: {}", name, e)))
}
