//! QR code URL builder.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sgverify_auth::RS256;
use sgverify_crypto::{generate_nonce, sign_rs256_base64};
use tracing::{debug, info};

use crate::config::Context;
use crate::error::{Result, SgVerifyError};

/// Default QR code lifetime.
pub const DEFAULT_QR_EXPIRY_SECS: u64 = 180;

/// QR payload version understood by the provider app.
pub const QR_VERSION: &str = "2";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    Static,
    #[default]
    Dynamic,
}

impl QrType {
    pub fn as_str(self) -> &'static str {
        match self {
            QrType::Static => "static",
            QrType::Dynamic => "dynamic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRequest {
    /// Opaque session state, echoed back on the callback.
    pub state: String,
    #[serde(default)]
    pub qr_type: QrType,
    #[serde(default)]
    pub qr_code_expiry_in_sec: Option<u64>,
}

impl QrCodeRequest {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            qr_type: QrType::default(),
            qr_code_expiry_in_sec: None,
        }
    }

    pub fn qr_type(mut self, qr_type: QrType) -> Self {
        self.qr_type = qr_type;
        self
    }

    pub fn expiry_in_sec(mut self, seconds: u64) -> Self {
        self.qr_code_expiry_in_sec = Some(seconds);
        self
    }
}

/// Builds signed QR code URLs. Makes no network calls.
#[derive(Clone)]
pub struct SgVerify {
    context: Arc<Context>,
}

impl SgVerify {
    pub(crate) fn new(context: Arc<Context>) -> Self {
        Self { context }
    }

    pub fn generate_qr_code_url(&self, request: &QrCodeRequest) -> Result<String> {
        self.generate_qr_code_url_at(request, Utc::now().timestamp_millis())
    }

    /// As [`generate_qr_code_url`](Self::generate_qr_code_url) with an
    /// explicit `timestamp_start` in epoch milliseconds.
    pub fn generate_qr_code_url_at(&self, request: &QrCodeRequest, now_ms: i64) -> Result<String> {
        info!(state = %request.state, qr_type = request.qr_type.as_str(), "Generating QR code");

        let expiry_secs = request.qr_code_expiry_in_sec.unwrap_or(DEFAULT_QR_EXPIRY_SECS);
        let expiry_ms = i64::try_from(expiry_secs)
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(|ms| now_ms.checked_add(ms))
            .ok_or_else(|| {
                SgVerifyError::Config(format!("QR code expiry out of range: {}s", expiry_secs))
            })?;

        let nonce = generate_nonce()?;
        let url = format!(
            "{base}?callback={callback}&client_id={client_id}&qr_type={qr_type}\
             &signature_method={method}&v={version}&nonce={nonce}&state={state}\
             &timestamp_expiry={expiry}&timestamp_start={start}",
            base = self.context.endpoints.qr_code_url,
            callback = urlencoding::encode(&self.context.callback_url),
            client_id = self.context.client_id,
            qr_type = request.qr_type.as_str(),
            method = RS256,
            version = QR_VERSION,
            nonce = nonce,
            state = urlencoding::encode(&request.state),
            expiry = expiry_ms,
            start = now_ms,
        );
        debug!(url = %url, "Signing QR code URL");

        let signature = sign_rs256_base64(&self.context.private_key, url.as_bytes())?;
        Ok(format!("{}&signature={}", url, urlencoding::encode(&signature)))
    }
}
