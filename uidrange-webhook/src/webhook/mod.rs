//! Admission webhooks
//!
//! - `POST /mutate--v1-namespace`: assigns ID ranges and the baseline
//!   pod-security label to namespaces
//! - `POST /validate--v1-pod`: rejects pods running outside their
//!   namespace's ID range

pub mod namespace;
pub mod pod;
mod review;

pub use namespace::{NamespaceAnnotation, NamespaceAnnotator, RangeAction};
pub use pod::{PodDecision, PodValidator};

use axum::{routing::post, Router};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use uidrange_common::RangeError;

use crate::kubernetes::K8sError;
use crate::state::AppState;

pub const NAMESPACE_MUTATE_PATH: &str = "/mutate--v1-namespace";
pub const POD_VALIDATE_PATH: &str = "/validate--v1-pod";

/// Errors raised while annotating namespaces or validating pods
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Store(#[from] K8sError),

    #[error("range tracker is not initialized")]
    NotInitialized,

    #[error("range tracker is already initialized")]
    AlreadyInitialized,

    #[error("no ID block remains after {0}")]
    Exhausted(i64),

    #[error("failed to build admission patch: {0}")]
    Patch(String),
}

/// Namespaces ignored by every policy
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    names: Arc<BTreeSet<String>>,
}

impl ExclusionList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Arc::new(names.into_iter().map(Into::into).collect()),
        }
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.names.contains(namespace)
    }
}

/// Admission routes, served on the TLS listener
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(NAMESPACE_MUTATE_PATH, post(review::mutate_namespace))
        .route(POD_VALIDATE_PATH, post(review::validate_pod))
        .with_state(state)
}
