//! # dondominio-provider
//!
//! Client for the [DonDominio](https://www.dondominio.com/) simple-api and
//! the TXT record operations needed to answer ACME DNS-01 challenges.
//!
//! ## Feature Flags
//!
//! - **`rustls`** *(default)*: Use rustls for outbound TLS.
//! - **`native-tls`**: Use the platform's native TLS implementation.
//! - **`test-utils`**: Export [`test_utils::MockRecordApi`], an in-memory
//!   [`RecordApi`] for tests of dependent crates.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dondominio_provider::{Client, RecordApi, get_domain, get_sub_domain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("dondominio", "api-user", "api-password")?;
//!
//!     let fqdn = "_acme-challenge.www.example.com.";
//!     let domain = get_domain(fqdn);
//!     let sub_domain = get_sub_domain(domain, fqdn);
//!
//!     client.add_txt_record(domain, sub_domain, "proof").await?;
//!     client.remove_txt_record(domain, "proof").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Credentials
//!
//! Arguments left empty are looked up in `DD_ENDPOINT`,
//! `DD_APPLICATION_KEY`, `DD_APPLICATION_SECRET`, then in a TOML
//! credentials file. See [`Credentials::resolve`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError). Nothing
//! is retried: a non-2xx reply surfaces as [`ProviderError::Api`] with the
//! status code, message and `X-Dd-QueryID`.

mod credentials;
mod domain;
mod error;
mod http_client;
mod records;
mod types;
mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use credentials::{
    Credentials, DEFAULT_ENDPOINT_ALIAS, DONDOMINIO_API_BASE, resolve_endpoint,
};
pub use domain::{get_domain, get_sub_domain, un_fqdn};
pub use error::{ApiError, ProviderError, Result};
pub use http_client::{
    Client, ClientBuilder, DEFAULT_TIMEOUT, PROXY_ENV, QUERY_ID_HEADER, check_status, decode_response,
};
pub use records::{RecordApi, SERVICE_STATUS_ACTIVE, TXT};
pub use types::{
    DnsCreateParams, DnsDeleteParams, DnsListData, DnsListParams, DnsListResponse, DnsRecord,
    QueryInfo, ServiceInfo, ServiceInfoResponse, ServiceStatusParams,
};

// Re-exported so callers can pass methods to `Client::call_api`.
pub use reqwest::Method;
