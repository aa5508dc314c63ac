//! Error types for the solver and the process configuration

use dondominio_provider::ProviderError;
use thiserror::Error;

/// Failure of a solver entry point.
#[derive(Error, Debug)]
pub enum SolverError {
    /// A secret was needed before `initialize` built the cluster client.
    #[error("solver not initialized: no cluster client available")]
    NotInitialized,

    /// The host signalled shutdown; no new challenge is started.
    #[error("solver is shutting down")]
    ShuttingDown,

    /// The challenge's provider config is missing a field or does not decode.
    #[error("{0}")]
    Config(String),

    /// The referenced secret could not be fetched.
    #[error("cannot read secret '{namespace}/{name}': {detail}")]
    Secret {
        namespace: String,
        name: String,
        detail: String,
    },

    /// The secret exists but lacks the referenced key.
    #[error("key not found {key:?} in secret '{namespace}/{name}'")]
    KeyNotFound {
        key: String,
        namespace: String,
        name: String,
    },

    /// The cluster client could not be built.
    #[error("Kubernetes client error: {0}")]
    Kube(String),

    /// Any DonDominio client or API failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Invalid process configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be specified")]
    Missing(&'static str),

    #[error("cannot read config file {path}: {detail}")]
    File { path: String, detail: String },

    #[error("invalid value for {name}: {detail}")]
    Invalid { name: &'static str, detail: String },
}

pub type SolverResult<T> = std::result::Result<T, SolverError>;
