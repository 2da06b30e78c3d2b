//! SG Verify connector.
//!
//! Generates signed SG Verify QR code URLs and, once the user has scanned and
//! consented, exchanges the callback's authorization code for their MyInfo
//! person data.
//!
//! ```no_run
//! # async fn run(options: sgverify::SgVerifyOptions) -> sgverify::Result<()> {
//! use sgverify::{PersonRequest, QrCodeRequest, SgVerifyConnector};
//!
//! let connector = SgVerifyConnector::new(options)?;
//! let qr_url = connector.generate_qr_code_url(&QrCodeRequest::new("session-1"))?;
//!
//! // ... the provider redirects to the callback URL with `code` and `state` ...
//! let person = connector
//!     .get_person_data(&PersonRequest::new("auth-code", "session-1"))
//!     .await?;
//! # let _ = (qr_url, person);
//! # Ok(())
//! # }
//! ```
//!
//! In `PROD` and `TEST` every provider call carries a `PKI_SIGN`
//! authorization header, the access token is verified against the provider
//! certificate, and the person data arrives signed and encrypted. `SANDBOX`
//! skips all three.

pub mod config;
pub mod connector;
pub mod error;
pub mod myinfo;
pub mod person;
pub mod qr;
pub mod transport;

pub use config::{ClientCredentials, Endpoints, Environment, ProxyAuth, ProxyConfig, SgVerifyOptions};
pub use connector::SgVerifyConnector;
pub use error::{Result, SgVerifyError};
pub use myinfo::{AccessTokenClaims, MyInfo, PersonRequest, PersonResponse, TokenResponse};
pub use person::{
    attributes_param, transform_person_data, Address, CodeValue, DrivingLicence, LicenceClass,
    PersonAttribute, PersonData, PersonField, PhoneNumber, RawPersonData,
};
pub use qr::{QrCodeRequest, QrType, SgVerify, DEFAULT_QR_EXPIRY_SECS, QR_VERSION};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};
