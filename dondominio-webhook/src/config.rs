//! Process configuration
//!
//! Read from an optional TOML file (`WEBHOOK_CONFIG`) and then overridden by
//! environment variables of the same name in upper case.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

const ENV_CONFIG_FILE: &str = "WEBHOOK_CONFIG";
const ENV_GROUP_NAME: &str = "GROUP_NAME";
const ENV_LISTEN: &str = "WEBHOOK_LISTEN";
const ENV_TLS_CERT_FILE: &str = "TLS_CERT_FILE";
const ENV_TLS_KEY_FILE: &str = "TLS_KEY_FILE";
const ENV_PROXY: &str = dondominio_provider::PROXY_ENV;

const DEFAULT_LISTEN: &str = "0.0.0.0:443";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    group_name: Option<String>,
    listen: Option<String>,
    tls_cert_file: Option<PathBuf>,
    tls_key_file: Option<PathBuf>,
    proxy: Option<String>,
}

/// Certificate and key served to the API aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// API group the webhook registers under.
    pub group_name: String,
    pub listen: SocketAddr,
    /// Plain HTTP when absent.
    pub tls: Option<TlsFiles>,
    /// Outbound proxy for DonDominio calls.
    pub proxy: Option<String>,
}

impl WebhookConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(ENV_CONFIG_FILE) {
            Ok(path) if !path.is_empty() => {
                let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::File {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
                Some(parse_file(&path, &text)?)
            }
            _ => None,
        };
        Self::from_sources(file.unwrap_or_default(), |name| std::env::var(name).ok())
    }

    fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |name: &str| env(name).filter(|v| !v.is_empty());

        let group_name = lookup(ENV_GROUP_NAME)
            .or(file.group_name)
            .filter(|g| !g.is_empty())
            .ok_or(ConfigError::Missing(ENV_GROUP_NAME))?;

        let listen = lookup(ENV_LISTEN)
            .or(file.listen)
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            name: ENV_LISTEN,
            detail: format!("{listen}: {e}"),
        })?;

        let cert = lookup(ENV_TLS_CERT_FILE).map(PathBuf::from).or(file.tls_cert_file);
        let key = lookup(ENV_TLS_KEY_FILE).map(PathBuf::from).or(file.tls_key_file);
        let tls = match (cert, key) {
            (Some(cert), Some(key)) => Some(TlsFiles { cert, key }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: ENV_TLS_CERT_FILE,
                    detail: format!("{ENV_TLS_CERT_FILE} and {ENV_TLS_KEY_FILE} must be set together"),
                });
            }
        };

        Ok(Self {
            group_name,
            listen,
            tls,
            proxy: lookup(ENV_PROXY).or(file.proxy).filter(|p| !p.is_empty()),
        })
    }
}

fn parse_file(path: &str, text: &str) -> Result<FileConfig, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::File {
        path: path.to_string(),
        detail: e.to_string(),
    })
}
