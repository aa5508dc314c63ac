//! Test doubles for the solver and the HTTP surface.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dondominio_provider::test_utils::MockRecordApi;
use dondominio_provider::{ProviderError, RecordApi};
use tokio::sync::watch;

use crate::error::{SolverError, SolverResult};
use crate::payload::{ChallengeAction, ChallengeRequest};
use crate::secrets::SecretStore;
use crate::solver::{ClientSettings, Connector, Solver};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A challenge for `_acme-challenge.www.example.com.` in `cert-manager`.
pub fn challenge(
    action: ChallengeAction,
    key: &str,
    config: Option<serde_json::Value>,
) -> ChallengeRequest {
    ChallengeRequest {
        uid: "test-uid".to_string(),
        action,
        challenge_type: "dns-01".to_string(),
        dns_name: "www.example.com".to_string(),
        key: key.to_string(),
        resource_namespace: "cert-manager".to_string(),
        resolved_fqdn: "_acme-challenge.www.example.com.".to_string(),
        resolved_zone: "example.com.".to_string(),
        allow_ambient_credentials: false,
        config,
    }
}

/// In-memory secrets keyed by `(namespace, name)`.
#[derive(Default)]
pub struct MockSecretStore {
    secrets: BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>,
}

impl MockSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, namespace: &str, name: &str, key: &str, value: &[u8]) -> Self {
        self.secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_vec());
        self
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> SolverResult<BTreeMap<String, Vec<u8>>> {
        self.secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| SolverError::Secret {
                namespace: namespace.to_string(),
                name: name.to_string(),
                detail: "secrets not found".to_string(),
            })
    }
}

/// Hands out one shared [`MockRecordApi`] and remembers what it was asked for.
pub struct MockConnector {
    api: Arc<MockRecordApi>,
    settings: Mutex<Vec<ClientSettings>>,
}

impl MockConnector {
    pub fn new(api: Arc<MockRecordApi>) -> Self {
        Self {
            api,
            settings: Mutex::new(Vec::new()),
        }
    }

    pub fn last_settings(&self) -> Option<ClientSettings> {
        lock(&self.settings).last().cloned()
    }

    pub fn connect_calls(&self) -> usize {
        lock(&self.settings).len()
    }
}

impl Connector for MockConnector {
    fn connect(&self, settings: &ClientSettings) -> Result<Arc<dyn RecordApi>, ProviderError> {
        lock(&self.settings).push(settings.clone());
        Ok(self.api.clone())
    }
}

/// Solver that succeeds or fails every call with a fixed message.
pub struct StaticSolver {
    name: &'static str,
    failure: Option<String>,
    init_failure: Option<String>,
    initialize_calls: AtomicUsize,
    stop: Mutex<Option<watch::Receiver<bool>>>,
    calls: Mutex<Vec<(ChallengeAction, String)>>,
}

impl StaticSolver {
    pub fn ok(name: &'static str) -> Self {
        Self {
            name,
            failure: None,
            init_failure: None,
            initialize_calls: AtomicUsize::new(0),
            stop: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `initialize` fail with [`SolverError::Kube`].
    #[must_use]
    pub fn failing_initialize(mut self, message: &str) -> Self {
        self.init_failure = Some(message.to_string());
        self
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    /// Whether the stop signal handed to `initialize` has fired.
    pub fn stopped(&self) -> bool {
        lock(&self.stop).as_ref().is_some_and(|stop| *stop.borrow())
    }

    pub fn failing(name: &'static str, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::ok(name)
        }
    }

    /// `(action, key)` of every call received.
    pub fn calls(&self) -> Vec<(ChallengeAction, String)> {
        lock(&self.calls).clone()
    }

    fn record(&self, challenge: &ChallengeRequest) -> SolverResult<()> {
        lock(&self.calls).push((challenge.action, challenge.key.clone()));
        match &self.failure {
            Some(message) => Err(SolverError::Config(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Solver for StaticSolver {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn initialize(
        &self,
        _kube_config: kube::Config,
        stop: watch::Receiver<bool>,
    ) -> SolverResult<()> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.stop) = Some(stop);
        match &self.init_failure {
            Some(message) => Err(SolverError::Kube(message.clone())),
            None => Ok(()),
        }
    }

    async fn present(&self, challenge: &ChallengeRequest) -> SolverResult<()> {
        self.record(challenge)
    }

    async fn clean_up(&self, challenge: &ChallengeRequest) -> SolverResult<()> {
        self.record(challenge)
    }
}
