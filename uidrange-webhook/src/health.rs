//! Liveness and readiness probes
//!
//! The webhook is live as soon as the ops listener answers and ready once the
//! range tracker has been seeded from the cluster.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::tracker::RangeTracker;

/// Liveness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub alive: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: i64,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub reason: Option<String>,
    pub timestamp: i64,
}

pub struct HealthChecker {
    start_time: Instant,
    version: String,
}

impl HealthChecker {
    pub fn new(version: &str) -> Self {
        Self {
            start_time: Instant::now(),
            version: version.to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn liveness(&self) -> LivenessResponse {
        LivenessResponse {
            alive: true,
            version: self.version.clone(),
            uptime_seconds: self.uptime_seconds(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Ready once the tracker can allocate
    pub fn readiness(&self, tracker: &RangeTracker) -> ReadinessResponse {
        let (ready, reason) = if tracker.is_initialized() {
            (true, None)
        } else {
            (false, Some("Range tracker not initialized".to_string()))
        };

        ReadinessResponse {
            ready,
            reason,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
