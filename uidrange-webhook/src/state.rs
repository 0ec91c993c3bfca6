//! Application State
//!
//! Shared state for the admission and ops listeners

use std::sync::Arc;

use crate::config::UidRangeConfig;
use crate::health::HealthChecker;
use crate::kubernetes::{BypassCheck, RangeStore};
use crate::tracker::RangeTracker;
use crate::webhook::{ExclusionList, NamespaceAnnotator, PodValidator};

/// Shared application state
pub struct AppState {
    pub config: Arc<UidRangeConfig>,
    pub tracker: Arc<RangeTracker>,
    pub store: Arc<dyn RangeStore>,
    pub annotator: NamespaceAnnotator,
    pub pod_validator: PodValidator,
    pub health: HealthChecker,
}

impl AppState {
    pub fn new(
        config: UidRangeConfig,
        store: Arc<dyn RangeStore>,
        tracker: Arc<RangeTracker>,
        bypass: Arc<dyn BypassCheck>,
    ) -> Self {
        let exclusions = ExclusionList::new(config.ranges.excluded_namespaces.iter().cloned());

        Self {
            annotator: NamespaceAnnotator::new(tracker.clone(), exclusions.clone(), config.ranges.assign),
            pod_validator: PodValidator::new(tracker.clone(), exclusions, bypass),
            health: HealthChecker::new(env!("CARGO_PKG_VERSION")),
            config: Arc::new(config),
            tracker,
            store,
        }
    }
}
