//! Common types shared between uidrange-webhook and uidrange-cli
//!
//! Holds the ID range wire format, the namespace range record rules and the
//! pod bounds rules. Nothing in here talks to a cluster.

pub mod api;
pub mod identity;
pub mod range;

pub use api::{AllocatorStatus, RangeRecord, RangeStatus};
pub use identity::{ContainerIdentity, IdField, PodIdentity};
pub use range::{IdRange, ParseRangeError};

/// Errors raised while reading or enforcing namespace ID ranges
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The uid-range and supplemental-groups annotations disagree
    #[error("uid range {uid} and supplemental groups range {group} do not match")]
    RangeMismatch { uid: String, group: String },

    /// An annotation value is not `<start>/<size>`
    #[error("{key} annotation value {value:?} is malformed: {reason}")]
    MalformedRange {
        key: String,
        value: String,
        #[source]
        reason: ParseRangeError,
    },

    /// A pod or container identity is outside the namespace block
    #[error("{}{field} {value} must be within range {range}", scope(.container))]
    OutOfRange {
        container: Option<String>,
        field: IdField,
        value: i64,
        range: IdRange,
    },

    /// A container has no resolvable runAsUser
    #[error("container {container} runAsUser is not set")]
    MissingIdentity { container: String },
}

fn scope(container: &Option<String>) -> String {
    match container {
        Some(name) => format!("container {} ", name),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, RangeError>;
