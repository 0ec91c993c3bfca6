//! Ops API payloads shared by the webhook and the CLI

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::range::{self, GROUP_RANGE_KEY, UID_RANGE_KEY};
use crate::{IdRange, RangeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStatus {
    /// Both annotations present and equal
    Ok,
    /// Neither annotation present
    Unset,
    /// Annotations disagree or only one is present
    Mismatch,
    /// An annotation does not parse
    Malformed,
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RangeStatus::Ok => "ok",
            RangeStatus::Unset => "unset",
            RangeStatus::Mismatch => "mismatch",
            RangeStatus::Malformed => "malformed",
        };
        f.write_str(s)
    }
}

/// One namespace's range annotations as stored in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRecord {
    pub namespace: String,
    pub uid_range: Option<String>,
    pub group_range: Option<String>,
    pub status: RangeStatus,
    /// Effective range when `status` is `ok`
    pub range: Option<IdRange>,
    pub message: Option<String>,
}

impl RangeRecord {
    pub fn from_annotations(namespace: impl Into<String>, annotations: &BTreeMap<String, String>) -> Self {
        let (status, range, message) = match range::namespace_range(annotations) {
            Ok(Some(range)) => (RangeStatus::Ok, Some(range), None),
            Ok(None) => (RangeStatus::Unset, None, None),
            Err(e @ RangeError::MalformedRange { .. }) => (RangeStatus::Malformed, None, Some(e.to_string())),
            Err(e) => (RangeStatus::Mismatch, None, Some(e.to_string())),
        };

        Self {
            namespace: namespace.into(),
            uid_range: annotations.get(UID_RANGE_KEY).cloned(),
            group_range: annotations.get(GROUP_RANGE_KEY).cloned(),
            status,
            range,
            message,
        }
    }
}

/// Allocator counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorStatus {
    pub initialized: bool,
    /// Start of the block the next new namespace receives
    pub next_start: Option<i64>,
    pub block_size: i64,
    pub default_start: i64,
}

impl AllocatorStatus {
    pub fn new(next_start: Option<i64>) -> Self {
        Self {
            initialized: next_start.is_some(),
            next_start,
            block_size: range::BLOCK_SIZE,
            default_start: range::DEFAULT_START,
        }
    }
}
