//! Kubernetes client wrapper
//!
//! Wraps the kube-rs Client with the API server it was configured for.

use kube::{Client, Config};

use super::error::{K8sError, K8sResult};

/// Wrapper around kube-rs Client
#[derive(Clone)]
pub struct K8sClient {
    inner: Client,
    api_server: String,
}

impl K8sClient {
    /// Create a client from the ambient environment.
    ///
    /// Uses the in-cluster service account when running as a pod, otherwise
    /// the local kubeconfig (`KUBECONFIG` or `~/.kube/config`).
    pub async fn infer() -> K8sResult<Self> {
        let config = Config::infer()
            .await
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to infer config: {}", e)))?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> K8sResult<Self> {
        let api_server = config.cluster_url.to_string();

        let client = Client::try_from(config)
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            inner: client,
            api_server,
        })
    }

    /// Get the inner kube-rs Client
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Get API server URL
    pub fn api_server(&self) -> &str {
        &self.api_server
    }
}

impl std::fmt::Debug for K8sClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("K8sClient")
            .field("api_server", &self.api_server)
            .finish()
    }
}
