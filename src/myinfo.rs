//! Token exchange and person-data retrieval.
//!
//! One `get_person_data` call runs two provider exchanges back to back:
//!
//! 1. POST the authorization code to the token endpoint and verify the
//!    returned access token to learn the subject id.
//! 2. GET `{person_url}/{sub}` with the access token, then decrypt and verify
//!    (or, in SANDBOX, just parse) the response and transform it.
//!
//! Any failure aborts the whole call. There is no partial result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sgverify_auth::{
    decode_jws_payload_unverified, decrypt_jwe_as, verify_jws_as, HttpMethod, PkiSigner,
    SigningRequest, FORM_URLENCODED,
};
use sgverify_crypto::generate_tx_no;
use tracing::{debug, error, info};

use crate::config::Context;
use crate::error::{Result, SgVerifyError};
use crate::person::{attributes_param, transform_person_data, PersonData, RawPersonData};
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

// ============================================================================
// Types
// ============================================================================

/// Callback parameters forwarded by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRequest {
    #[serde(default, alias = "code")]
    pub auth_code: Option<String>,
    pub state: String,
    #[serde(default, alias = "txnNo")]
    pub tx_no: Option<String>,
    /// Upstream error reported on the callback instead of a code.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, alias = "error_description")]
    pub error_description: Option<String>,
}

impl PersonRequest {
    pub fn new(auth_code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            auth_code: Some(auth_code.into()),
            state: state.into(),
            ..Self::default()
        }
    }

    pub fn tx_no(mut self, tx_no: impl Into<String>) -> Self {
        self.tx_no = Some(tx_no.into());
        self
    }
}

/// Person data together with the request's `state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonResponse<T> {
    pub data: T,
    pub state: String,
}

/// Verified access token payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: the person identifier used in the person URL.
    pub sub: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub claims: AccessTokenClaims,
}

#[derive(Debug, Deserialize)]
struct TokenApiResponse {
    access_token: Option<String>,
}

// ============================================================================
// MyInfo client
// ============================================================================

#[derive(Clone)]
pub struct MyInfo {
    context: Arc<Context>,
    transport: Arc<dyn Transport>,
}

impl MyInfo {
    pub(crate) fn new(context: Arc<Context>, transport: Arc<dyn Transport>) -> Self {
        Self { context, transport }
    }

    /// Fetch and transform the person record for an authorization code.
    pub async fn get_person_data(
        &self,
        request: &PersonRequest,
    ) -> Result<PersonResponse<PersonData>> {
        self.get_person_data_with(request, |raw| transform_person_data(&raw))
            .await
    }

    /// Like [`get_person_data`](Self::get_person_data), with a caller-supplied
    /// transform over the raw provider payload.
    pub async fn get_person_data_with<T, F>(
        &self,
        request: &PersonRequest,
        transform: F,
    ) -> Result<PersonResponse<T>>
    where
        F: FnOnce(RawPersonData) -> T,
    {
        info!(state = %request.state, "Getting person data");

        let result = self.fetch_person(request).await;
        match result {
            Ok(raw) => {
                debug!(attributes = raw.len(), "Transforming person data");
                Ok(PersonResponse {
                    data: transform(raw),
                    state: request.state.clone(),
                })
            }
            Err(err) => {
                error!(state = %request.state, error = %err, "Error occurred while getting person data");
                Err(err)
            }
        }
    }

    async fn fetch_person(&self, request: &PersonRequest) -> Result<RawPersonData> {
        if request.error.is_some() || request.error_description.is_some() {
            return Err(SgVerifyError::CallbackError {
                error: request.error.clone().unwrap_or_default(),
                description: request.error_description.clone().unwrap_or_default(),
            });
        }
        let auth_code = request
            .auth_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(SgVerifyError::MissingAuthCode)?;

        let token = self.get_token(auth_code, &request.state).await?;
        let tx_no = resolve_tx_no(request.tx_no.as_deref())?;

        let ctx = &self.context;
        let attributes = attributes_param(&ctx.person_attributes);
        let params = [
            ("client_id", ctx.client_id.as_str()),
            ("attributes", attributes.as_str()),
            ("txNo", tx_no.as_str()),
        ];
        let url = format!("{}/{}", ctx.endpoints.person_url, token.claims.sub);
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut outbound = TransportRequest::new(HttpMethod::Get, format!("{}?{}", url, query))
            .header("Content-Type", "application/text")
            .header("Cache-Control", "no-cache")
            .timeout(ctx.timeout);

        if ctx.require_security {
            let header = PkiSigner::new(&ctx.client_id, &ctx.private_key).sign(&SigningRequest {
                method: HttpMethod::Get,
                url: &url,
                params: &params,
                content_type: None,
            })?;
            outbound = outbound.header(
                "Authorization",
                format!("{},Bearer {}", header, token.access_token),
            );
        }

        debug!(tx_no = %tx_no, "Requesting person data");
        let response = self.transport.request(outbound).await?;
        check_response(&response)?;
        info!(status = response.status, "Person url success");

        let payload: Value = if ctx.require_security {
            decrypt_jwe_as(response.text(), ctx.provider_key()?, &ctx.private_key)?
        } else {
            response
                .json()
                .map_err(|e| SgVerifyError::InvalidResponse(format!("person data: {}", e)))?
        };

        match payload {
            Value::Object(raw) => Ok(raw),
            other => Err(SgVerifyError::InvalidResponse(format!(
                "person data is not an object: {}",
                json_kind(&other)
            ))),
        }
    }

    /// Exchange an authorization code for a verified access token.
    pub async fn get_token(&self, auth_code: &str, state: &str) -> Result<TokenResponse> {
        info!(state = %state, "Getting token");

        let ctx = &self.context;
        let url = ctx.endpoints.token_url.as_str();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", auth_code),
            ("redirect_uri", ctx.callback_url.as_str()),
            ("client_id", ctx.client_id.as_str()),
            ("client_secret", ctx.client_secret.as_str()),
            ("state", state),
        ];
        let body = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let mut outbound = TransportRequest::new(HttpMethod::Post, url)
            .header("Content-Type", FORM_URLENCODED)
            .header("Cache-Control", "no-cache")
            .body(body)
            .timeout(ctx.timeout);

        if ctx.require_security {
            let header = PkiSigner::new(&ctx.client_id, &ctx.private_key).sign(&SigningRequest {
                method: HttpMethod::Post,
                url,
                params: &params,
                content_type: Some(FORM_URLENCODED),
            })?;
            outbound = outbound.header("Authorization", header.to_string());
        }

        let response = self.transport.request(outbound).await?;
        check_response(&response)?;
        debug!(status = response.status, "Token url success");

        let access_token = response
            .json::<TokenApiResponse>()
            .map_err(|e| SgVerifyError::InvalidResponse(format!("token response: {}", e)))?
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                SgVerifyError::InvalidResponse("token response has no access_token".to_string())
            })?;

        debug!("Decoding access token");
        let claims: AccessTokenClaims = if ctx.require_security {
            verify_jws_as(&access_token, ctx.provider_key()?)?
        } else {
            serde_json::from_value(decode_jws_payload_unverified(&access_token)?)
                .map_err(|e| SgVerifyError::InvalidResponse(format!("access token: {}", e)))?
        };

        Ok(TokenResponse {
            access_token,
            claims,
        })
    }
}

/// The caller's transaction number, or a fresh one. Called once per request.
fn resolve_tx_no(supplied: Option<&str>) -> Result<String> {
    match supplied {
        Some(tx_no) if !tx_no.is_empty() => Ok(tx_no.to_string()),
        _ => Ok(generate_tx_no()?),
    }
}

/// Fail on a provider error body, then on a non-success status.
fn check_response(response: &TransportResponse) -> Result<()> {
    if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(response.text()) {
        if let Some(code) = body.get("code").filter(|code| !is_blank(code)) {
            return Err(SgVerifyError::ProviderError {
                code: plain_text(code),
                message: body.get("message").map(plain_text).unwrap_or_default(),
            });
        }
    }

    if !response.is_success() {
        return Err(TransportError::with_status(response.text(), response.status).into());
    }
    Ok(())
}

/// Null, `false`, `0` and `""` mean "no error code".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
