//! Endpoint and credential resolution
//!
//! Values passed explicitly always win. Anything left empty is filled from
//! the environment (`DD_ENDPOINT`, `DD_APPLICATION_KEY`,
//! `DD_APPLICATION_SECRET`) and then from a TOML credentials file:
//!
//! ```toml
//! [default]
//! endpoint = "dondominio"
//!
//! [dondominio]
//! application_key = "my-api-user"
//! application_secret = "my-api-password"
//! ```
//!
//! The file is read from `DD_CONFIG_FILE`, else `./dondominio.toml`, else
//! `$HOME/.dondominio.toml`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ProviderError, Result};

/// Production base URL of the DonDominio simple-api.
pub const DONDOMINIO_API_BASE: &str = "https://simple-api.dondominio.net";

/// Endpoint alias resolving to [`DONDOMINIO_API_BASE`].
pub const DEFAULT_ENDPOINT_ALIAS: &str = "dondominio";

pub(crate) const ENV_ENDPOINT: &str = "DD_ENDPOINT";
pub(crate) const ENV_APPLICATION_KEY: &str = "DD_APPLICATION_KEY";
pub(crate) const ENV_APPLICATION_SECRET: &str = "DD_APPLICATION_SECRET";
pub(crate) const ENV_CONFIG_FILE: &str = "DD_CONFIG_FILE";

const LOCAL_CONFIG_FILE: &str = "dondominio.toml";
const HOME_CONFIG_FILE: &str = ".dondominio.toml";

/// Fully resolved connection settings for one [`Client`](crate::Client).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Base URL, without trailing slash.
    pub endpoint: String,
    /// API user (`apiuser`).
    pub application_key: String,
    /// API password (`apipasswd`).
    pub application_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("application_key", &self.application_key)
            .field("application_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CredentialsFile {
    #[serde(default)]
    default: DefaultSection,
    #[serde(flatten)]
    endpoints: HashMap<String, EndpointSection>,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultSection {
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointSection {
    application_key: Option<String>,
    application_secret: Option<String>,
}

impl CredentialsFile {
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ProviderError::InvalidConfig {
            detail: format!("credentials file: {e}"),
        })
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ProviderError::InvalidConfig {
            detail: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::parse(&text)
    }

    /// Loads the first credentials file found, if any.
    pub(crate) fn discover() -> Result<Option<Self>> {
        if let Some(path) = non_empty(std::env::var(ENV_CONFIG_FILE).ok()) {
            return Self::read(Path::new(&path)).map(Some);
        }

        let candidates = [
            Some(PathBuf::from(LOCAL_CONFIG_FILE)),
            dirs::home_dir().map(|home| home.join(HOME_CONFIG_FILE)),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                log::debug!("Loading DonDominio credentials from {}", path.display());
                return Self::read(&path).map(Some);
            }
        }
        Ok(None)
    }
}

impl Credentials {
    /// Resolves credentials against the process environment and the
    /// credentials file.
    pub fn resolve(endpoint: &str, application_key: &str, application_secret: &str) -> Result<Self> {
        // The file is only consulted when something is still missing.
        let needs_ambient =
            endpoint.is_empty() || application_key.is_empty() || application_secret.is_empty();
        let file = if needs_ambient {
            CredentialsFile::discover()?
        } else {
            None
        };

        Self::resolve_with(
            endpoint,
            application_key,
            application_secret,
            |name| std::env::var(name).ok(),
            file.as_ref(),
        )
    }

    pub(crate) fn resolve_with(
        endpoint: &str,
        application_key: &str,
        application_secret: &str,
        env: impl Fn(&str) -> Option<String>,
        file: Option<&CredentialsFile>,
    ) -> Result<Self> {
        let endpoint_id = first_non_empty([
            Some(endpoint.to_string()),
            env(ENV_ENDPOINT),
            file.and_then(|f| f.default.endpoint.clone()),
        ])
        .ok_or(ProviderError::MissingField { field: "endpoint" })?;

        let section = file.and_then(|f| f.endpoints.get(&endpoint_id));

        let application_key = first_non_empty([
            Some(application_key.to_string()),
            env(ENV_APPLICATION_KEY),
            section.and_then(|s| s.application_key.clone()),
        ])
        .ok_or(ProviderError::MissingField {
            field: "application key",
        })?;

        let application_secret = first_non_empty([
            Some(application_secret.to_string()),
            env(ENV_APPLICATION_SECRET),
            section.and_then(|s| s.application_secret.clone()),
        ])
        .ok_or(ProviderError::MissingField {
            field: "application secret",
        })?;

        Ok(Self {
            endpoint: resolve_endpoint(&endpoint_id)?,
            application_key,
            application_secret,
        })
    }
}

/// Maps an endpoint alias or URL to a base URL.
pub fn resolve_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.eq_ignore_ascii_case(DEFAULT_ENDPOINT_ALIAS) {
        return Ok(DONDOMINIO_API_BASE.to_string());
    }
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        return Ok(endpoint.trim_end_matches('/').to_string());
    }
    Err(ProviderError::UnknownEndpoint {
        endpoint: endpoint.to_string(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn first_non_empty<const N: usize>(values: [Option<String>; N]) -> Option<String> {
    values.into_iter().find_map(non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn alias_resolves_to_production_url() {
        assert_eq!(resolve_endpoint("dondominio").unwrap(), DONDOMINIO_API_BASE);
        assert_eq!(resolve_endpoint("DonDominio").unwrap(), DONDOMINIO_API_BASE);
    }

    #[test]
    fn url_used_verbatim_without_trailing_slash() {
        assert_eq!(
            resolve_endpoint("http://localhost:8080/").unwrap(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn unknown_endpoint_rejected() {
        let err = resolve_endpoint("ovh-eu").unwrap_err();
        assert!(matches!(err, ProviderError::UnknownEndpoint { .. }));
    }

    #[test]
    fn explicit_values_win() {
        let env = |name: &str| Some(format!("env-{name}"));
        let creds = Credentials::resolve_with("dondominio", "key", "secret", env, None).unwrap();
        assert_eq!(creds.endpoint, DONDOMINIO_API_BASE);
        assert_eq!(creds.application_key, "key");
        assert_eq!(creds.application_secret, "secret");
    }

    #[test]
    fn environment_fills_missing_values() {
        let env = |name: &str| match name {
            ENV_ENDPOINT => Some("https://api.test".to_string()),
            ENV_APPLICATION_KEY => Some("env-key".to_string()),
            ENV_APPLICATION_SECRET => Some("env-secret".to_string()),
            _ => None,
        };
        let creds = Credentials::resolve_with("", "", "", env, None).unwrap();
        assert_eq!(creds.endpoint, "https://api.test");
        assert_eq!(creds.application_key, "env-key");
        assert_eq!(creds.application_secret, "env-secret");
    }

    #[test]
    fn file_section_selected_by_endpoint() {
        let file = CredentialsFile::parse(
            r#"
            [default]
            endpoint = "dondominio"

            [dondominio]
            application_key = "file-key"
            application_secret = "file-secret"

            ["https://sandbox.test"]
            application_key = "sandbox-key"
            application_secret = "sandbox-secret"
            "#,
        )
        .unwrap();

        let creds = Credentials::resolve_with("", "", "", no_env, Some(&file)).unwrap();
        assert_eq!(creds.endpoint, DONDOMINIO_API_BASE);
        assert_eq!(creds.application_key, "file-key");

        let sandbox =
            Credentials::resolve_with("https://sandbox.test", "", "", no_env, Some(&file)).unwrap();
        assert_eq!(sandbox.application_secret, "sandbox-secret");
    }

    #[test]
    fn missing_secret_reported() {
        let err = Credentials::resolve_with("dondominio", "key", "", no_env, None).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MissingField {
                field: "application secret"
            }
        ));
    }

    #[test]
    fn missing_endpoint_reported() {
        let err = Credentials::resolve_with("", "key", "secret", no_env, None).unwrap_err();
        assert!(matches!(err, ProviderError::MissingField { field: "endpoint" }));
    }

    #[test]
    fn debug_hides_secret() {
        let creds = Credentials::resolve_with("dondominio", "key", "hunter2", no_env, None).unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
