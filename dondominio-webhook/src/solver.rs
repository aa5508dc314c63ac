//! DNS-01 solver entry points
//!
//! [`Solver`] is the contract the webhook host calls. [`DonDominioSolver`]
//! resolves credentials per challenge, builds a fresh DonDominio client and
//! drives the TXT record operations.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use dondominio_provider::{
    Client, DEFAULT_TIMEOUT, ProviderError, RecordApi, get_domain, get_sub_domain,
};
use serde::Deserialize;
use tokio::sync::watch;

use crate::error::{SolverError, SolverResult};
use crate::payload::ChallengeRequest;
use crate::secrets::{KubeSecretStore, SecretStore, secret_value};

/// Solver name used by Issuers to reference this webhook.
pub const SOLVER_NAME: &str = "don-dominio";

/// Contract between the webhook host and a DNS provider.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Unique within the webhook's API group.
    fn name(&self) -> &'static str;

    /// Called once at startup with the cluster client configuration.
    ///
    /// `stop` flips to `true` when the process is shutting down.
    async fn initialize(
        &self,
        kube_config: kube::Config,
        stop: watch::Receiver<bool>,
    ) -> SolverResult<()>;

    /// Publishes the challenge TXT record. Must tolerate repeated calls.
    async fn present(&self, challenge: &ChallengeRequest) -> SolverResult<()>;

    /// Removes the TXT record holding this challenge's key, and only that one.
    async fn clean_up(&self, challenge: &ChallengeRequest) -> SolverResult<()>;
}

/// Decoded solver config from the Issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverConfig {
    pub endpoint: String,
    pub application_key: String,
    pub application_secret_ref: SecretKeySelector,
}

/// Reference to one key of a secret in the challenge namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
}

/// Settings handed to a [`Connector`] for one challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub application_key: String,
    pub application_secret: String,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("endpoint", &self.endpoint)
            .field("application_key", &self.application_key)
            .field("application_secret", &"***")
            .finish()
    }
}

/// Builds the record API used for one challenge.
pub trait Connector: Send + Sync {
    fn connect(&self, settings: &ClientSettings) -> Result<Arc<dyn RecordApi>, ProviderError>;
}

/// [`Connector`] producing real DonDominio clients.
pub struct DonDominioConnector {
    proxy: Option<String>,
    timeout: Duration,
}

impl DonDominioConnector {
    pub fn new(proxy: Option<String>) -> Self {
        Self {
            proxy,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Connector for DonDominioConnector {
    fn connect(&self, settings: &ClientSettings) -> Result<Arc<dyn RecordApi>, ProviderError> {
        let client = Client::builder(
            settings.endpoint.as_str(),
            settings.application_key.as_str(),
            settings.application_secret.as_str(),
        )
        .timeout(self.timeout)
        .user_agent(SOLVER_NAME)
        .proxy(self.proxy.clone())
        .build()?;
        Ok(Arc::new(client))
    }
}

pub struct DonDominioSolver {
    secrets: RwLock<Option<Arc<dyn SecretStore>>>,
    stop: RwLock<Option<watch::Receiver<bool>>>,
    connector: Arc<dyn Connector>,
}

impl DonDominioSolver {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            secrets: RwLock::new(None),
            stop: RwLock::new(None),
            connector,
        }
    }

    /// Installs the shutdown signal without going through `initialize`.
    #[must_use]
    pub fn with_stop_signal(self, stop: watch::Receiver<bool>) -> Self {
        self.set_stop_signal(stop);
        self
    }

    fn set_stop_signal(&self, stop: watch::Receiver<bool>) {
        *self.stop.write().unwrap_or_else(PoisonError::into_inner) = Some(stop);
    }

    /// New challenges are refused once the host has signalled shutdown.
    fn ensure_running(&self) -> SolverResult<()> {
        let stopping = self
            .stop
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|stop| *stop.borrow());
        if stopping {
            return Err(SolverError::ShuttingDown);
        }
        Ok(())
    }

    /// Skips `initialize` by installing a secret store directly.
    #[must_use]
    pub fn with_secret_store(self, store: Arc<dyn SecretStore>) -> Self {
        self.set_secret_store(store);
        self
    }

    fn set_secret_store(&self, store: Arc<dyn SecretStore>) {
        *self.secrets.write().unwrap_or_else(PoisonError::into_inner) = Some(store);
    }

    fn secret_store(&self) -> Option<Arc<dyn SecretStore>> {
        self.secrets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reads the application secret referenced by `selector`.
    ///
    /// An empty reference yields an empty secret so ambient credentials can
    /// fill it in.
    async fn application_secret(
        &self,
        selector: &SecretKeySelector,
        namespace: &str,
    ) -> SolverResult<String> {
        if selector.name.is_empty() {
            return Ok(String::new());
        }
        let store = self.secret_store().ok_or(SolverError::NotInitialized)?;
        secret_value(store.as_ref(), namespace, &selector.name, &selector.key).await
    }

    async fn record_api(&self, challenge: &ChallengeRequest) -> SolverResult<Arc<dyn RecordApi>> {
        self.ensure_running()?;
        let cfg = load_config(challenge.config.as_ref())?;
        validate(&cfg, challenge.allow_ambient_credentials)?;

        let application_secret = self
            .application_secret(&cfg.application_secret_ref, &challenge.resource_namespace)
            .await?;

        let settings = ClientSettings {
            endpoint: cfg.endpoint,
            application_key: cfg.application_key,
            application_secret,
        };
        Ok(self.connector.connect(&settings)?)
    }
}

#[async_trait]
impl Solver for DonDominioSolver {
    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    async fn initialize(
        &self,
        kube_config: kube::Config,
        stop: watch::Receiver<bool>,
    ) -> SolverResult<()> {
        self.set_stop_signal(stop);
        let client =
            kube::Client::try_from(kube_config).map_err(|e| SolverError::Kube(e.to_string()))?;
        self.set_secret_store(Arc::new(KubeSecretStore::new(client)));
        tracing::info!("DonDominio solver initialized");
        Ok(())
    }

    async fn present(&self, challenge: &ChallengeRequest) -> SolverResult<()> {
        let api = self.record_api(challenge).await?;

        tracing::info!(
            resolved_zone = %challenge.resolved_zone,
            resolved_fqdn = %challenge.resolved_fqdn,
            "Presenting challenge"
        );
        let domain = get_domain(&challenge.resolved_fqdn);
        let sub_domain = get_sub_domain(domain, &challenge.resolved_fqdn);

        api.add_txt_record(domain, sub_domain, &challenge.key).await?;
        Ok(())
    }

    async fn clean_up(&self, challenge: &ChallengeRequest) -> SolverResult<()> {
        let api = self.record_api(challenge).await?;

        tracing::info!(resolved_fqdn = %challenge.resolved_fqdn, "Cleaning up challenge");
        let domain = get_domain(&challenge.resolved_fqdn);

        api.remove_txt_record(domain, &challenge.key).await?;
        Ok(())
    }
}

/// Runs `initialize` on every solver, stopping at the first failure.
///
/// The webhook must not serve with a solver that failed to initialize.
pub async fn initialize_all(
    solvers: &[Arc<dyn Solver>],
    kube_config: &kube::Config,
    stop: &watch::Receiver<bool>,
) -> SolverResult<()> {
    for solver in solvers {
        solver
            .initialize(kube_config.clone(), stop.clone())
            .await
            .inspect_err(|e| {
                tracing::error!(solver = solver.name(), "Failed to initialize solver: {e}");
            })?;
    }
    Ok(())
}

/// Decodes the Issuer's solver config; absent config is the empty config.
pub fn load_config(raw: Option<&serde_json::Value>) -> SolverResult<SolverConfig> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(SolverConfig::default()),
        Some(value) => SolverConfig::deserialize(value)
            .map_err(|e| SolverError::Config(format!("error decoding DonDominio config: {e}"))),
    }
}

/// Explicit config must be complete unless ambient credentials are allowed.
pub fn validate(cfg: &SolverConfig, allow_ambient_credentials: bool) -> SolverResult<()> {
    if allow_ambient_credentials {
        return Ok(());
    }
    if cfg.endpoint.is_empty() {
        return Err(SolverError::Config(
            "no endpoint provided in DonDominio config".to_string(),
        ));
    }
    if cfg.application_key.is_empty() {
        return Err(SolverError::Config(
            "no application key provided in DonDominio config".to_string(),
        ));
    }
    if cfg.application_secret_ref.name.is_empty() {
        return Err(SolverError::Config(
            "no application secret provided in DonDominio config".to_string(),
        ));
    }
    Ok(())
}
