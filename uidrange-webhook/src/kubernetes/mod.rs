//! Kubernetes integration
//!
//! - Client construction from the ambient kubeconfig / service account
//! - Namespace annotation storage ([`RangeStore`])
//! - SubjectAccessReview-backed validation bypass ([`BypassCheck`])

pub mod bypass;
pub mod client;
pub mod error;
pub mod store;

pub use bypass::{BypassCheck, NoBypass, SubjectAccessReviewBypass};
pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use store::{KubeRangeStore, MemoryRangeStore, NamespaceAnnotations, RangeStore};
