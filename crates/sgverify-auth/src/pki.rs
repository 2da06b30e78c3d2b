//! PKI_SIGN authorization headers.
//!
//! The provider recomputes the same base string on its side, so every step
//! here must be reproducible byte for byte:
//!
//! 1. Default parameters: `app_id`, `nonce`, `signature_method`, `timestamp`.
//! 2. Business parameters are merged over the defaults, except for a POST
//!    whose body is not form-urlencoded (only the defaults are signed then).
//! 3. The merged set is sorted by key and joined as an unencoded
//!    `key=value&...` string.
//! 4. Base string: `METHOD&URL&params`, signed with RS256, base64 encoded.

use std::collections::BTreeMap;
use std::fmt;

use sgverify_crypto::{generate_nonce, sign_rs256_base64, RsaPrivateKey};

use crate::error::AuthError;
use crate::jws::RS256;

/// Authorization scheme prefix.
pub const PKI_SIGN: &str = "PKI_SIGN";

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to be signed.
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    pub method: HttpMethod,
    /// Target URL without query string.
    pub url: &'a str,
    /// Business parameters (query parameters or form body fields).
    pub params: &'a [(&'a str, &'a str)],
    pub content_type: Option<&'a str>,
}

/// A rendered `PKI_SIGN` authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub timestamp: i64,
    pub nonce: String,
    pub app_id: String,
    pub signature: String,
}

impl fmt::Display for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} timestamp=\"{}\",nonce=\"{}\",app_id=\"{}\",signature_method=\"{}\",signature=\"{}\"",
            PKI_SIGN, self.timestamp, self.nonce, self.app_id, RS256, self.signature
        )
    }
}

/// Build the canonical base string for a request.
///
/// Pure: the result depends only on the arguments.
pub fn signature_base_string(
    request: &SigningRequest<'_>,
    app_id: &str,
    nonce: &str,
    timestamp: i64,
) -> String {
    let timestamp = timestamp.to_string();

    let mut params: BTreeMap<&str, &str> = BTreeMap::new();
    params.insert("app_id", app_id);
    params.insert("nonce", nonce);
    params.insert("signature_method", RS256);
    params.insert("timestamp", &timestamp);

    let signs_params = request.method != HttpMethod::Post
        || request.content_type == Some(FORM_URLENCODED);
    if signs_params {
        for &(key, value) in request.params {
            params.insert(key, value);
        }
    }

    let param_string = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}&{}&{}", request.method, request.url, param_string)
}

/// Signs requests on behalf of one client application.
pub struct PkiSigner<'a> {
    app_id: &'a str,
    private_key: &'a RsaPrivateKey,
}

impl<'a> PkiSigner<'a> {
    pub fn new(app_id: &'a str, private_key: &'a RsaPrivateKey) -> Self {
        Self {
            app_id,
            private_key,
        }
    }

    /// Sign with a fresh nonce and the current time.
    pub fn sign(&self, request: &SigningRequest<'_>) -> Result<AuthorizationHeader, AuthError> {
        let nonce = generate_nonce()?;
        let timestamp = chrono::Utc::now().timestamp_millis();
        self.sign_with(request, &nonce, timestamp)
    }

    /// Sign with a caller-supplied nonce and millisecond timestamp.
    pub fn sign_with(
        &self,
        request: &SigningRequest<'_>,
        nonce: &str,
        timestamp: i64,
    ) -> Result<AuthorizationHeader, AuthError> {
        let base_string = signature_base_string(request, self.app_id, nonce, timestamp);
        let signature = sign_rs256_base64(self.private_key, base_string.as_bytes())?;

        Ok(AuthorizationHeader {
            timestamp,
            nonce: nonce.to_string(),
            app_id: self.app_id.to_string(),
            signature,
        })
    }
}
