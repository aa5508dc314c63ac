//! Cluster secret lookup

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::Api;

use crate::error::{SolverError, SolverResult};

/// Read access to key/value secrets by namespace and name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the secret's data, or an error if it cannot be fetched.
    async fn secret_data(&self, namespace: &str, name: &str)
    -> SolverResult<BTreeMap<String, Vec<u8>>>;
}

/// [`SecretStore`] backed by the Kubernetes API.
pub struct KubeSecretStore {
    client: kube::Client,
}

impl KubeSecretStore {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> SolverResult<BTreeMap<String, Vec<u8>>> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets.get(name).await.map_err(|e| SolverError::Secret {
            namespace: namespace.to_string(),
            name: name.to_string(),
            detail: e.to_string(),
        })?;

        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect())
    }
}

/// Looks up `key` in a secret and returns it as text without one trailing newline.
pub async fn secret_value(
    store: &dyn SecretStore,
    namespace: &str,
    name: &str,
    key: &str,
) -> SolverResult<String> {
    let data = store.secret_data(namespace, name).await?;
    let bytes = data.get(key).ok_or_else(|| SolverError::KeyNotFound {
        key: key.to_string(),
        namespace: namespace.to_string(),
        name: name.to_string(),
    })?;

    let text = std::str::from_utf8(bytes).map_err(|e| SolverError::Secret {
        namespace: namespace.to_string(),
        name: name.to_string(),
        detail: format!("value of {key:?} is not UTF-8: {e}"),
    })?;
    Ok(text.strip_suffix('\n').unwrap_or(text).to_string())
}
