use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error returned by the DonDominio API for a non-2xx reply.
///
/// `code` is the HTTP status. `message` comes from the JSON payload when it
/// decodes, otherwise it holds the raw response body. `query_id` is copied
/// from the `X-Dd-QueryID` response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status code of the failed call.
    #[serde(default)]
    pub code: u16,
    /// Error message reported by the API.
    #[serde(default, alias = "errorCodeMsg")]
    pub message: String,
    /// Error class, when the API sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Provider-assigned query identifier, if the header was present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {}: {:?}", self.code, self.message)?;
        if let Some(query_id) = &self.query_id {
            write!(f, " (X-Dd-QueryID: {query_id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Unified error type for every DonDominio client operation.
///
/// # Kinds
///
/// - configuration: [`MissingField`](Self::MissingField),
///   [`InvalidConfig`](Self::InvalidConfig),
///   [`UnknownEndpoint`](Self::UnknownEndpoint)
/// - remote: [`Api`](Self::Api), [`ServiceInactive`](Self::ServiceInactive)
/// - transport: [`NetworkError`](Self::NetworkError),
///   [`Timeout`](Self::Timeout), [`Cancelled`](Self::Cancelled)
/// - decode: [`ParseError`](Self::ParseError),
///   [`SerializationError`](Self::SerializationError)
///
/// Nothing here is retried by the client. Errors propagate unchanged and the
/// caller decides what to do with them.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required configuration value is empty or absent.
    #[error("missing {field} in DonDominio config")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Configuration could not be read or decoded.
    #[error("invalid DonDominio config: {detail}")]
    InvalidConfig {
        /// What went wrong.
        detail: String,
    },

    /// The endpoint is neither a known alias nor an http(s) URL.
    #[error("unknown DonDominio endpoint '{endpoint}'")]
    UnknownEndpoint {
        /// The rejected endpoint value.
        endpoint: String,
    },

    /// The remote API answered with a status outside 200..300.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The domain's DonDominio service is not in the `active` state.
    #[error("DonDominio service not deployed for domain {domain} (status: {status:?})")]
    ServiceInactive {
        /// Domain that was checked.
        domain: String,
        /// Status literal reported by the API.
        status: String,
    },

    /// A network-level error occurred (DNS resolution, connection refused, ...).
    #[error("Network error: {detail}")]
    NetworkError {
        /// Error details.
        detail: String,
    },

    /// The HTTP request ran past the client timeout.
    #[error("Request timeout: {detail}")]
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The caller's cancellation signal fired before the request completed.
    #[error("request cancelled")]
    Cancelled,

    /// The response body was not valid JSON for the expected shape.
    #[error("Parse error: {detail}")]
    ParseError {
        /// Details about the parse failure.
        detail: String,
    },

    /// A request body could not be form-encoded.
    #[error("Serialization error: {detail}")]
    SerializationError {
        /// Details about the serialization failure.
        detail: String,
    },

    /// A record operation failed; names the endpoint and keeps the cause.
    #[error("DonDominio API call failed: {method} {path} - {source}")]
    ApiCall {
        /// Verb reported for the operation.
        method: &'static str,
        /// Endpoint path.
        path: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Wraps `self` with the endpoint it failed on.
    #[must_use]
    pub fn on_call(self, method: &'static str, path: &'static str) -> Self {
        Self::ApiCall {
            method,
            path,
            source: Box::new(self),
        }
    }

    /// Returns the innermost [`ApiError`], looking through [`ApiCall`](Self::ApiCall).
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::ApiCall { source, .. } => source.api_error(),
            _ => None,
        }
    }

    /// Whether the failure happened on the wire rather than in the API.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::Cancelled => true,
            Self::ApiCall { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
