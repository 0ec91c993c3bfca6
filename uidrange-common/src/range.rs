//! ID range wire format and namespace range records
//!
//! A namespace carries its block twice, once per annotation:
//!
//! ```text
//! openshift.io/sa.scc.uid-range: 1000580000/10000
//! openshift.io/sa.scc.supplemental-groups: 1000580000/10000
//! ```

use crate::RangeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Annotation holding the process user range
pub const UID_RANGE_KEY: &str = "openshift.io/sa.scc.uid-range";

/// Annotation holding the supplemental group range
pub const GROUP_RANGE_KEY: &str = "openshift.io/sa.scc.supplemental-groups";

/// Width of every block minted by the allocator
pub const BLOCK_SIZE: i64 = 10_000;

/// First block handed out on a cluster with no existing ranges
pub const DEFAULT_START: i64 = 1_000_100_000;

/// A contiguous block of IDs, `start` through `start + size` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdRange {
    pub start: i64,
    pub size: i64,
}

impl IdRange {
    pub const fn new(start: i64, size: i64) -> Self {
        Self { start, size }
    }

    /// A block of the fixed allocator width
    pub const fn block(start: i64) -> Self {
        Self::new(start, BLOCK_SIZE)
    }

    /// Upper bound, inclusive
    pub fn end(&self) -> i64 {
        self.start.saturating_add(self.size)
    }

    pub fn contains(&self, id: i64) -> bool {
        id >= self.start && id <= self.end()
    }

    /// Annotation value for this block
    pub fn to_annotation(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.size)
    }
}

/// Why an annotation value failed to parse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseRangeError {
    #[error("value is not in <start>/<size> format")]
    MissingSeparator,

    #[error("start {0:?} is not an integer")]
    InvalidStart(String),

    #[error("size {0:?} is not an integer")]
    InvalidSize(String),

    #[error("start {0} is negative")]
    NegativeStart(i64),

    #[error("size {0} is not positive")]
    NonPositiveSize(i64),

    #[error("range {0}/{1} runs past the largest ID")]
    Overflow(i64, i64),
}

impl FromStr for IdRange {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, size) = s.split_once('/').ok_or(ParseRangeError::MissingSeparator)?;

        let start = start
            .parse::<i64>()
            .map_err(|_| ParseRangeError::InvalidStart(start.to_string()))?;
        let size = size
            .parse::<i64>()
            .map_err(|_| ParseRangeError::InvalidSize(size.to_string()))?;

        if start < 0 {
            return Err(ParseRangeError::NegativeStart(start));
        }
        if size <= 0 {
            return Err(ParseRangeError::NonPositiveSize(size));
        }
        if start.checked_add(size).is_none() {
            return Err(ParseRangeError::Overflow(start, size));
        }

        Ok(Self { start, size })
    }
}

fn parse_annotation(key: &str, value: &str) -> Result<IdRange, RangeError> {
    value.parse().map_err(|reason| RangeError::MalformedRange {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    })
}

/// Resolve the range a namespace is enforcing.
///
/// Returns `Ok(None)` when neither annotation is present. Exactly one
/// annotation, or two that parse to different blocks, is a mismatch.
pub fn namespace_range(annotations: &BTreeMap<String, String>) -> Result<Option<IdRange>, RangeError> {
    let uid = annotations.get(UID_RANGE_KEY);
    let group = annotations.get(GROUP_RANGE_KEY);

    let (uid, group) = match (uid, group) {
        (None, None) => return Ok(None),
        (Some(uid), Some(group)) => (uid, group),
        (uid, group) => {
            return Err(RangeError::RangeMismatch {
                uid: uid.cloned().unwrap_or_default(),
                group: group.cloned().unwrap_or_default(),
            })
        }
    };

    let uid_range = parse_annotation(UID_RANGE_KEY, uid)?;
    let group_range = parse_annotation(GROUP_RANGE_KEY, group)?;

    if uid_range != group_range {
        return Err(RangeError::RangeMismatch {
            uid: uid.clone(),
            group: group.clone(),
        });
    }

    Ok(Some(uid_range))
}

/// Highest block start recorded on a namespace, for seeding the allocator.
///
/// Unparseable values are skipped. Two values that both parse but start at
/// different IDs are a mismatch.
pub fn observed_start(annotations: &BTreeMap<String, String>) -> Result<Option<i64>, RangeError> {
    let parsed = |key: &str| {
        annotations
            .get(key)
            .and_then(|value| value.parse::<IdRange>().ok())
    };

    match (parsed(UID_RANGE_KEY), parsed(GROUP_RANGE_KEY)) {
        (Some(uid), Some(group)) if uid.start != group.start => Err(RangeError::RangeMismatch {
            uid: uid.to_string(),
            group: group.to_string(),
        }),
        (uid, group) => Ok(uid.into_iter().chain(group).map(|r| r.start).max()),
    }
}
