//! Pod bounds validation

use std::sync::Arc;

use k8s_openapi::api::authentication::v1::UserInfo;
use k8s_openapi::api::core::v1::Pod;
use uidrange_common::{IdRange, PodIdentity};

use super::{ExclusionList, WebhookError};
use crate::kubernetes::BypassCheck;
use crate::tracker::RangeTracker;

/// Why a pod was admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodDecision {
    /// Namespace is on the exclusion list
    Excluded,
    /// Requesting user holds the bypass permission
    Bypassed,
    /// Namespace has no range annotations
    Unenforced,
    /// Every identity is inside the namespace range
    InRange(IdRange),
}

/// Validating policy for pods
#[derive(Clone)]
pub struct PodValidator {
    tracker: Arc<RangeTracker>,
    exclusions: ExclusionList,
    bypass: Arc<dyn BypassCheck>,
}

impl PodValidator {
    pub fn new(tracker: Arc<RangeTracker>, exclusions: ExclusionList, bypass: Arc<dyn BypassCheck>) -> Self {
        Self {
            tracker,
            exclusions,
            bypass,
        }
    }

    /// Admit or reject `pod` being created in `namespace` by `user`.
    ///
    /// `Ok` admits the pod; any `Err` is a rejection carrying the reason.
    pub async fn validate(&self, namespace: &str, pod: &Pod, user: &UserInfo) -> Result<PodDecision, WebhookError> {
        if self.exclusions.contains(namespace) {
            return Ok(PodDecision::Excluded);
        }

        if self.bypass.allows_bypass(namespace, user).await {
            tracing::debug!(namespace, user = ?user.username, "Range enforcement bypassed");
            return Ok(PodDecision::Bypassed);
        }

        let Some(range) = self.tracker.lookup_range(namespace).await? else {
            return Ok(PodDecision::Unenforced);
        };

        PodIdentity::from(pod).check_bounds(&range)?;

        Ok(PodDecision::InRange(range))
    }
}
