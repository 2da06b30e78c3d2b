//! Entry point tying the QR builder and the MyInfo client to one configuration.

use std::sync::Arc;

use crate::config::{Context, Environment, SgVerifyOptions};
use crate::error::Result;
use crate::myinfo::{MyInfo, PersonRequest, PersonResponse, TokenResponse};
use crate::person::{PersonData, RawPersonData};
use crate::qr::{QrCodeRequest, SgVerify};
use crate::transport::{ReqwestTransport, Transport};

/// SG Verify connector.
///
/// Cheap to clone; clones share the parsed keys and the transport.
#[derive(Clone)]
pub struct SgVerifyConnector {
    environment: Environment,
    sgverify: SgVerify,
    myinfo: MyInfo,
}

impl SgVerifyConnector {
    /// Build a connector that talks to the provider over `reqwest`, through
    /// the configured proxy if any.
    pub fn new(options: SgVerifyOptions) -> Result<Self> {
        let transport = ReqwestTransport::with_proxy(options.proxy.as_ref())?;
        Self::with_transport(options, Arc::new(transport))
    }

    /// Build a connector over a caller-supplied transport.
    pub fn with_transport(options: SgVerifyOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        let context = Arc::new(Context::load(options)?);
        tracing::debug!(
            environment = %context.environment,
            secure = context.require_security,
            "SG Verify connector configured"
        );
        Ok(Self {
            environment: context.environment,
            sgverify: SgVerify::new(Arc::clone(&context)),
            myinfo: MyInfo::new(context, transport),
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn generate_qr_code_url(&self, request: &QrCodeRequest) -> Result<String> {
        self.sgverify.generate_qr_code_url(request)
    }

    pub async fn get_token(&self, auth_code: &str, state: &str) -> Result<TokenResponse> {
        self.myinfo.get_token(auth_code, state).await
    }

    pub async fn get_person_data(
        &self,
        request: &PersonRequest,
    ) -> Result<PersonResponse<PersonData>> {
        self.myinfo.get_person_data(request).await
    }

    pub async fn get_person_data_with<T, F>(
        &self,
        request: &PersonRequest,
        transform: F,
    ) -> Result<PersonResponse<T>>
    where
        F: FnOnce(RawPersonData) -> T,
    {
        self.myinfo.get_person_data_with(request, transform).await
    }

    pub fn sgverify(&self) -> &SgVerify {
        &self.sgverify
    }

    pub fn myinfo(&self) -> &MyInfo {
        &self.myinfo
    }
}
