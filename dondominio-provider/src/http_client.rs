//! DonDominio HTTP client
//!
//! Every call is a single attempt: build a form-encoded body, add the shared
//! `apiuser`/`apipasswd` fields, send it with the configured timeout and
//! decode the JSON reply.
//!
//! # Response handling
//! - status outside `200..300`: an [`ApiError`] is built from the body (or the
//!   raw text when it does not decode) and the `X-Dd-QueryID` header
//! - empty body: `Ok(None)`
//! - the `*_no_output` calls stop after the status check
//! - otherwise the body is decoded into the requested type

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Method, Proxy};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::credentials::Credentials;
use crate::error::{ApiError, ProviderError, Result};
use crate::utils::log_sanitizer::{mask_form_secrets, truncate_for_log};

/// Requests give up after this long unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Header carrying the provider's query identifier.
pub const QUERY_ID_HEADER: &str = "X-Dd-QueryID";

/// Environment variable naming an outbound proxy URL.
pub const PROXY_ENV: &str = "PROXY";

const USER_AGENT: &str = "dondominio-webhook";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

const PROVIDER_NAME: &str = "dondominio";

/// Client for the DonDominio simple-api.
///
/// One instance per challenge operation; it is cheap to build and nothing is
/// shared between instances.
pub struct Client {
    http: reqwest::Client,
    credentials: Credentials,
    timeout: Duration,
    time_delta: OnceCell<TimeDelta>,
}

/// Builder for [`Client`] with configurable timeout, user agent and proxy.
pub struct ClientBuilder {
    endpoint: String,
    application_key: String,
    application_secret: String,
    timeout: Duration,
    user_agent: Option<String>,
    proxy: Option<String>,
}

impl ClientBuilder {
    fn new(endpoint: String, application_key: String, application_secret: String) -> Self {
        Self {
            endpoint,
            application_key,
            application_secret,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            proxy: std::env::var(PROXY_ENV).ok().filter(|p| !p.is_empty()),
        }
    }

    /// Set the per-request timeout (default: 180s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Append an identifier to the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Route every request through `proxy`; `None` disables the `PROXY` default.
    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Resolve credentials and build the [`Client`].
    pub fn build(self) -> Result<Client> {
        let credentials = Credentials::resolve(
            &self.endpoint,
            &self.application_key,
            &self.application_secret,
        )?;

        let user_agent = match &self.user_agent {
            Some(ua) => format!("{USER_AGENT} ({ua})"),
            None => USER_AGENT.to_string(),
        };

        let mut http = reqwest::Client::builder().user_agent(user_agent);
        if let Some(proxy_url) = &self.proxy {
            log::info!("[{PROVIDER_NAME}] Using proxy {proxy_url}");
            let proxy = Proxy::all(proxy_url).map_err(|e| ProviderError::InvalidConfig {
                detail: format!("invalid proxy URL '{proxy_url}': {e}"),
            })?;
            http = http.proxy(proxy);
        }
        let http = http.build().map_err(|e| ProviderError::InvalidConfig {
            detail: format!("cannot build HTTP client: {e}"),
        })?;

        Ok(Client {
            http,
            credentials,
            timeout: self.timeout,
            time_delta: OnceCell::new(),
        })
    }
}

impl Client {
    /// Creates a client with default settings.
    ///
    /// Empty arguments are filled from the environment and the credentials
    /// file, see [`Credentials::resolve`].
    pub fn new(endpoint: &str, application_key: &str, application_secret: &str) -> Result<Self> {
        Self::builder(endpoint, application_key, application_secret).build()
    }

    /// Returns a builder for customizing the client.
    pub fn builder(
        endpoint: impl Into<String>,
        application_key: impl Into<String>,
        application_secret: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(
            endpoint.into(),
            application_key.into(),
            application_secret.into(),
        )
    }

    /// Resolved API base URL.
    pub fn endpoint(&self) -> &str {
        &self.credentials.endpoint
    }

    /// Configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ============ High level helpers ============

    /// Checks the API is reachable by asking for its time.
    pub async fn ping(&self) -> Result<()> {
        self.time().await.map(|_| ())
    }

    /// Server time, from `GET /auth/time`.
    pub async fn time(&self) -> Result<DateTime<Utc>> {
        let timestamp: serde_json::Number = self
            .get("/auth/time")
            .await?
            .ok_or_else(|| ProviderError::ParseError {
                detail: "empty /auth/time response".to_string(),
            })?;

        timestamp
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| ProviderError::ParseError {
                detail: format!("invalid timestamp {timestamp}"),
            })
    }

    /// Offset between the local clock and the API clock.
    ///
    /// Computed on first use and cached for the life of the client. A failed
    /// lookup is not cached.
    pub async fn time_delta(&self) -> Result<TimeDelta> {
        self.time_delta
            .get_or_try_init(|| async { Ok::<_, ProviderError>(Utc::now() - self.time().await?) })
            .await
            .copied()
    }

    // ============ Request wrappers ============

    /// `GET path`, decoded into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        self.call_api(Method::GET, path, None::<&()>).await
    }

    /// `POST path` with `body`, decoded into `T`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call_api(Method::POST, path, Some(body)).await
    }

    /// `PUT path` with `body`, decoded into `T`.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call_api(Method::PUT, path, Some(body)).await
    }

    /// `DELETE path`, decoded into `T`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        self.call_api(Method::DELETE, path, None::<&()>).await
    }

    /// [`get`](Self::get) that stops when `cancel` resolves.
    pub async fn get_with_cancel<T, C>(&self, path: &str, cancel: C) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        C: Future<Output = ()>,
    {
        self.call_api_with_cancel(Method::GET, path, None::<&()>, cancel)
            .await
    }

    /// [`post`](Self::post) that stops when `cancel` resolves.
    pub async fn post_with_cancel<B, T, C>(&self, path: &str, body: &B, cancel: C) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
        C: Future<Output = ()>,
    {
        self.call_api_with_cancel(Method::POST, path, Some(body), cancel)
            .await
    }

    /// [`put`](Self::put) that stops when `cancel` resolves.
    pub async fn put_with_cancel<B, T, C>(&self, path: &str, body: &B, cancel: C) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
        C: Future<Output = ()>,
    {
        self.call_api_with_cancel(Method::PUT, path, Some(body), cancel)
            .await
    }

    /// [`delete`](Self::delete) that stops when `cancel` resolves.
    pub async fn delete_with_cancel<T, C>(&self, path: &str, cancel: C) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        C: Future<Output = ()>,
    {
        self.call_api_with_cancel(Method::DELETE, path, None::<&()>, cancel)
            .await
    }

    /// Lowest level call helper without a cancellation signal.
    pub async fn call_api<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call_api_with_cancel(method, path, body, std::future::pending())
            .await
    }

    /// Lowest level call helper.
    ///
    /// The request is dropped, and the call fails with
    /// [`ProviderError::Cancelled`], as soon as `cancel` resolves.
    pub async fn call_api_with_cancel<B, T, C>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        cancel: C,
    ) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
        C: Future<Output = ()>,
    {
        let reply = self.exchange_with_cancel(method, path, body, cancel).await?;
        decode_response(reply.status, reply.query_id, &reply.body)
    }

    /// `POST path` with `body` when the reply carries nothing the caller needs.
    ///
    /// Only the status is checked; a 2xx body is never decoded.
    pub async fn post_no_output<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.call_api_no_output_with_cancel(Method::POST, path, Some(body), std::future::pending())
            .await
    }

    /// [`call_api_with_cancel`](Self::call_api_with_cancel) without an output:
    /// non-2xx still fails, any 2xx body is accepted as is.
    pub async fn call_api_no_output_with_cancel<B, C>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        cancel: C,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        C: Future<Output = ()>,
    {
        let reply = self.exchange_with_cancel(method, path, body, cancel).await?;
        check_status(reply.status, reply.query_id, &reply.body)
    }

    /// Sends one request and reads the whole reply, racing `cancel`.
    async fn exchange_with_cancel<B, C>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        cancel: C,
    ) -> Result<RawReply>
    where
        B: Serialize + ?Sized,
        C: Future<Output = ()>,
    {
        let form = self.encode_form(body)?;
        let url = format!("{}{path}", self.credentials.endpoint);

        log::debug!("[{PROVIDER_NAME}] {method} {url}");
        log::debug!("[{PROVIDER_NAME}] Request Body: {}", mask_form_secrets(&form));

        let request = self
            .http
            .request(method, &url)
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .body(form);

        let exchange = async {
            let response = request.send().await.map_err(transport_error)?;

            let status = response.status().as_u16();
            log::debug!("[{PROVIDER_NAME}] Response Status: {status}");

            let query_id = response
                .headers()
                .get(QUERY_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = response.text().await.map_err(|e| {
                if e.is_timeout() {
                    transport_error(e)
                } else {
                    ProviderError::NetworkError {
                        detail: format!("Failed to read response body: {e}"),
                    }
                }
            })?;

            log::debug!("[{PROVIDER_NAME}] Response Body: {}", truncate_for_log(&body));

            Ok(RawReply {
                status,
                query_id,
                body,
            })
        };

        tokio::select! {
            biased;
            () = cancel => {
                log::warn!("[{PROVIDER_NAME}] {path} cancelled by caller");
                Err(ProviderError::Cancelled)
            }
            result = exchange => result,
        }
    }

    /// Flattens `body` into form fields and adds the authentication pair.
    fn encode_form<B: Serialize + ?Sized>(&self, body: Option<&B>) -> Result<String> {
        let mut fields = BTreeMap::new();
        if let Some(body) = body {
            let value =
                serde_json::to_value(body).map_err(|e| ProviderError::SerializationError {
                    detail: e.to_string(),
                })?;
            flatten_value("", &value, &mut fields);
        }

        fields.insert("apiuser".to_string(), self.credentials.application_key.clone());
        fields.insert(
            "apipasswd".to_string(),
            self.credentials.application_secret.clone(),
        );

        Ok(encode_pairs(&fields))
    }
}

/// Status, `X-Dd-QueryID` and body of a finished exchange.
struct RawReply {
    status: u16,
    query_id: Option<String>,
    body: String,
}

/// Applies the status / empty-body / decode rules to a finished exchange.
///
/// A non-2xx status never decodes into `T`.
pub fn decode_response<T: DeserializeOwned>(
    status: u16,
    query_id: Option<String>,
    body: &str,
) -> Result<Option<T>> {
    check_status(status, query_id, body)?;

    if body.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(body).map(Some).map_err(|e| {
        log::error!("[{PROVIDER_NAME}] JSON parse failed: {e}");
        log::error!("[{PROVIDER_NAME}] Raw response: {}", truncate_for_log(body));
        ProviderError::ParseError {
            detail: e.to_string(),
        }
    })
}

/// Turns a non-2xx exchange into [`ProviderError::Api`]; the body is only
/// read for the error message.
pub fn check_status(status: u16, query_id: Option<String>, body: &str) -> Result<()> {
    if !(200..300).contains(&status) {
        let mut api_error = serde_json::from_str::<ApiError>(body).unwrap_or_else(|_| ApiError {
            code: status,
            message: body.to_string(),
            class: None,
            query_id: None,
        });
        api_error.code = status;
        api_error.query_id = query_id;
        log::error!("[{PROVIDER_NAME}] API error: {api_error}");
        return Err(ProviderError::Api(api_error));
    }
    Ok(())
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout {
            detail: e.to_string(),
        }
    } else {
        ProviderError::NetworkError {
            detail: e.to_string(),
        }
    }
}

/// Flattens a JSON value into dotted form keys; `null` fields are dropped.
fn flatten_value(prefix: &str, value: &serde_json::Value, result: &mut BTreeMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let new_key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten_value(&new_key, v, result);
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                flatten_value(&format!("{prefix}.{i}"), v, result);
            }
        }
        serde_json::Value::String(s) => {
            result.insert(prefix.to_string(), s.clone());
        }
        serde_json::Value::Number(n) => {
            result.insert(prefix.to_string(), n.to_string());
        }
        serde_json::Value::Bool(b) => {
            result.insert(prefix.to_string(), b.to_string());
        }
        serde_json::Value::Null => {}
    }
}

fn encode_pairs(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
