//! Provider simulator: token and person endpoints on a wiremock server, plus
//! helpers to check the `PKI_SIGN` headers the connector sent.

use std::collections::HashMap;

use serde_json::{json, Value};
use sgverify_auth::{
    encrypt_jwe, sign_jws, signature_base_string, ContentEncryption, HttpMethod, KeyManagement,
    SigningRequest, FORM_URLENCODED,
};
use sgverify_crypto::{base64_decode, base64url_encode, verify_rs256, RsaPrivateKey};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::common::{client_cert, provider_key, CLIENT_ID, SUBJECT};

// ============================================================================
// Payloads
// ============================================================================

pub fn access_token_signed_by(key: &RsaPrivateKey) -> String {
    sign_jws(&json!({ "sub": SUBJECT, "iat": 1_700_000_000 }), key).unwrap()
}

pub fn access_token() -> String {
    access_token_signed_by(&provider_key())
}

/// A token whose signature segment is garbage. Accepted only where tokens
/// are not verified.
pub fn unsigned_access_token() -> String {
    let header = base64url_encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = base64url_encode(json!({ "sub": SUBJECT }).to_string().as_bytes());
    format!("{}.{}.not-a-signature", header, payload)
}

/// Sign with `signer`, then encrypt to the client certificate.
pub fn encrypted_person_signed_by(payload: &Value, signer: &RsaPrivateKey) -> String {
    let jws = sign_jws(payload, signer).unwrap();
    encrypt_jwe(
        jws.as_bytes(),
        &client_cert(),
        KeyManagement::RsaOaep256,
        ContentEncryption::A256Gcm,
    )
    .unwrap()
}

pub fn encrypted_person(payload: &Value) -> String {
    encrypted_person_signed_by(payload, &provider_key())
}

// ============================================================================
// Mounts
// ============================================================================

pub async fn mount_token(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mount_person(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/person/{}", SUBJECT)))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn requests_to(server: &MockServer, target: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.url.path() == target)
        .collect()
}

// ============================================================================
// Authorization header checks
// ============================================================================

/// Parsed `PKI_SIGN` header.
#[derive(Debug)]
pub struct PkiHeader {
    pub fields: HashMap<String, String>,
    pub bearer: Option<String>,
}

impl PkiHeader {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }
}

pub fn authorization(request: &Request) -> Option<String> {
    request
        .headers
        .get("Authorization")
        .map(|value| value.to_str().unwrap().to_string())
}

pub fn parse_pki_header(header: &str) -> PkiHeader {
    let (pki, bearer) = match header.split_once(",Bearer ") {
        Some((pki, token)) => (pki, Some(token.to_string())),
        None => (header, None),
    };
    let fields = pki
        .strip_prefix("PKI_SIGN ")
        .expect("PKI_SIGN prefix")
        .split(',')
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap();
            (key.to_string(), value.trim_matches('"').to_string())
        })
        .collect();
    PkiHeader { fields, bearer }
}

/// Recompute the base string the provider would and check the signature.
pub fn assert_signed(
    header: &PkiHeader,
    method: HttpMethod,
    url: &str,
    params: &[(&str, &str)],
    content_type: Option<&str>,
) {
    assert_eq!(header.field("app_id"), CLIENT_ID);
    assert_eq!(header.field("signature_method"), "RS256");

    let timestamp: i64 = header.field("timestamp").parse().unwrap();
    let request = SigningRequest {
        method,
        url,
        params,
        content_type,
    };
    let base = signature_base_string(&request, CLIENT_ID, header.field("nonce"), timestamp);
    let signature = base64_decode(header.field("signature")).unwrap();
    assert!(
        verify_rs256(&client_cert(), base.as_bytes(), &signature),
        "signature does not cover {}",
        base
    );
}

/// Form body fields, decoded, in wire order.
pub fn form_fields(request: &Request) -> Vec<(String, String)> {
    std::str::from_utf8(&request.body)
        .unwrap()
        .split('&')
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap();
            (key.to_string(), urlencoding::decode(value).unwrap().into_owned())
        })
        .collect()
}

/// Query fields exactly as sent, in wire order.
pub fn query_fields(request: &Request) -> Vec<(String, String)> {
    request
        .url
        .query()
        .unwrap_or_default()
        .split('&')
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap();
            (key.to_string(), value.to_string())
        })
        .collect()
}

pub fn as_params(fields: &[(String, String)]) -> Vec<(&str, &str)> {
    fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

pub fn assert_token_request_signed(request: &Request, server_uri: &str) {
    let header = parse_pki_header(&authorization(request).expect("token Authorization header"));
    assert!(header.bearer.is_none());
    let fields = form_fields(request);
    assert_signed(
        &header,
        HttpMethod::Post,
        &format!("{}/token", server_uri),
        &as_params(&fields),
        Some(FORM_URLENCODED),
    );
}
