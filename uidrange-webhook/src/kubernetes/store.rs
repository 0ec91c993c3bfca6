//! Namespace annotation storage
//!
//! The tracker never caches ranges; every lookup goes through a
//! [`RangeStore`]. Production uses the API server, tests use memory.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::client::K8sClient;
use super::error::K8sResult;

/// A namespace name together with its annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceAnnotations {
    pub name: String,
    pub annotations: BTreeMap<String, String>,
}

impl From<Namespace> for NamespaceAnnotations {
    fn from(ns: Namespace) -> Self {
        Self {
            name: ns.metadata.name.unwrap_or_default(),
            annotations: ns.metadata.annotations.unwrap_or_default(),
        }
    }
}

/// Read access to namespace annotations
#[async_trait]
pub trait RangeStore: Send + Sync {
    /// Annotations of one namespace, `None` if the namespace does not exist
    async fn get(&self, namespace: &str) -> K8sResult<Option<BTreeMap<String, String>>>;

    /// Annotations of every namespace
    async fn list(&self) -> K8sResult<Vec<NamespaceAnnotations>>;
}

/// Range store backed by the Kubernetes API server
#[derive(Debug, Clone)]
pub struct KubeRangeStore {
    client: K8sClient,
}

impl KubeRangeStore {
    pub fn new(client: K8sClient) -> Self {
        Self { client }
    }

    fn api(&self) -> Api<Namespace> {
        Api::all(self.client.inner().clone())
    }
}

#[async_trait]
impl RangeStore for KubeRangeStore {
    async fn get(&self, namespace: &str) -> K8sResult<Option<BTreeMap<String, String>>> {
        let ns = self.api().get_opt(namespace).await?;
        Ok(ns.map(|ns| ns.metadata.annotations.unwrap_or_default()))
    }

    async fn list(&self) -> K8sResult<Vec<NamespaceAnnotations>> {
        let list = self.api().list(&ListParams::default()).await?;
        tracing::debug!(count = list.items.len(), "Listed namespaces");

        Ok(list.items.into_iter().map(NamespaceAnnotations::from).collect())
    }
}

/// In-memory range store for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryRangeStore {
    namespaces: RwLock<BTreeMap<String, BTreeMap<String, String>>>,
}

impl MemoryRangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(namespace, [(key, value)])` pairs
    pub fn with_namespaces<I, N, A, K, V>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = (N, A)>,
        N: Into<String>,
        A: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let namespaces = namespaces
            .into_iter()
            .map(|(name, annotations)| {
                let annotations = annotations
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect();
                (name.into(), annotations)
            })
            .collect();

        Self {
            namespaces: RwLock::new(namespaces),
        }
    }

    /// Insert or replace a namespace
    pub async fn put(&self, name: impl Into<String>, annotations: BTreeMap<String, String>) {
        self.namespaces.write().await.insert(name.into(), annotations);
    }
}

#[async_trait]
impl RangeStore for MemoryRangeStore {
    async fn get(&self, namespace: &str) -> K8sResult<Option<BTreeMap<String, String>>> {
        Ok(self.namespaces.read().await.get(namespace).cloned())
    }

    async fn list(&self) -> K8sResult<Vec<NamespaceAnnotations>> {
        Ok(self
            .namespaces
            .read()
            .await
            .iter()
            .map(|(name, annotations)| NamespaceAnnotations {
                name: name.clone(),
                annotations: annotations.clone(),
            })
            .collect())
    }
}
