//! Namespace annotation policy

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Namespace;
use uidrange_common::range::{GROUP_RANGE_KEY, UID_RANGE_KEY};
use uidrange_common::IdRange;

use super::{ExclusionList, WebhookError};
use crate::tracker::RangeTracker;

pub const POD_SECURITY_PREFIX: &str = "pod-security.kubernetes.io/";
const POD_SECURITY_MODES: [&str; 3] = ["enforce", "audit", "warn"];
pub const ENFORCE_LABEL: &str = "pod-security.kubernetes.io/enforce";
pub const BASELINE_LEVEL: &str = "restricted";

/// What happened to the range annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeAction {
    /// Excluded namespace or range assignment disabled
    Skipped,
    /// Both annotations were already present
    Kept,
    /// The one valid annotation was copied to the missing one
    Reused(IdRange),
    /// A new block was allocated and written to both annotations
    Minted(IdRange),
}

/// Result of running the policy on one namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceAnnotation {
    pub range: RangeAction,
    /// Whether the baseline enforce label was added
    pub labeled: bool,
}

/// Mutating policy for namespaces
#[derive(Clone)]
pub struct NamespaceAnnotator {
    tracker: Arc<RangeTracker>,
    exclusions: ExclusionList,
    assign_ranges: bool,
}

impl NamespaceAnnotator {
    pub fn new(tracker: Arc<RangeTracker>, exclusions: ExclusionList, assign_ranges: bool) -> Self {
        Self {
            tracker,
            exclusions,
            assign_ranges,
        }
    }

    /// Apply the policy to `ns` in place
    pub fn annotate(&self, ns: &mut Namespace) -> Result<NamespaceAnnotation, WebhookError> {
        let name = ns.metadata.name.clone().unwrap_or_default();

        if self.exclusions.contains(&name) {
            return Ok(NamespaceAnnotation {
                range: RangeAction::Skipped,
                labeled: false,
            });
        }

        let labels = ns.metadata.labels.get_or_insert_with(BTreeMap::new);
        let labeled = !has_pod_security_labels(labels);
        if labeled {
            labels.insert(ENFORCE_LABEL.to_string(), BASELINE_LEVEL.to_string());
        }

        let range = if self.assign_ranges {
            let annotations = ns.metadata.annotations.get_or_insert_with(BTreeMap::new);
            self.assign_range(annotations)?
        } else {
            RangeAction::Skipped
        };

        tracing::info!(namespace = %name, ?range, labeled, "Annotated namespace");

        Ok(NamespaceAnnotation { range, labeled })
    }

    fn assign_range(&self, annotations: &mut BTreeMap<String, String>) -> Result<RangeAction, WebhookError> {
        let uid = annotations.get(UID_RANGE_KEY);
        let group = annotations.get(GROUP_RANGE_KEY);

        let existing = match (uid, group) {
            (Some(_), Some(_)) => return Ok(RangeAction::Kept),
            (Some(value), None) | (None, Some(value)) => value.parse::<IdRange>().ok(),
            (None, None) => None,
        };

        let (range, action) = match existing {
            Some(range) => (range, RangeAction::Reused(range)),
            None => {
                let range = IdRange::block(self.tracker.allocate_next()?);
                (range, RangeAction::Minted(range))
            }
        };

        let value = range.to_annotation();
        annotations.insert(UID_RANGE_KEY.to_string(), value.clone());
        annotations.insert(GROUP_RANGE_KEY.to_string(), value);

        Ok(action)
    }
}

/// Whether the namespace already declares a pod-security posture
pub fn has_pod_security_labels(labels: &BTreeMap<String, String>) -> bool {
    labels.keys().any(|key| {
        let Some(rest) = key.strip_prefix(POD_SECURITY_PREFIX) else {
            return false;
        };
        POD_SECURITY_MODES.iter().any(|mode| {
            rest == *mode
                || rest
                    .strip_prefix(mode)
                    .is_some_and(|tail| tail.starts_with('-'))
        })
    })
}
