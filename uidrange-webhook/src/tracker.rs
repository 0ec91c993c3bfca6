//! Namespace ID range allocator
//!
//! One [`RangeTracker`] exists per process. It is seeded from the namespaces
//! already in the cluster and then hands out blocks with a single atomic
//! add, so concurrent admission requests never receive overlapping ranges.
//! Restarting the process re-seeds from cluster state.

use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;

use uidrange_common::range::{self, BLOCK_SIZE, DEFAULT_START};
use uidrange_common::IdRange;

use crate::kubernetes::{K8sError, NamespaceAnnotations, RangeStore};
use crate::webhook::WebhookError;

const UNINITIALIZED: u8 = 0;
const SEEDING: u8 = 1;
const READY: u8 = 2;

/// Process-wide allocator and lookup front for namespace ranges
pub struct RangeTracker {
    /// Start of the next block to hand out
    next: AtomicI64,
    state: AtomicU8,
    store: Arc<dyn RangeStore>,
}

impl RangeTracker {
    pub fn new(store: Arc<dyn RangeStore>) -> Self {
        Self {
            next: AtomicI64::new(DEFAULT_START),
            state: AtomicU8::new(UNINITIALIZED),
            store,
        }
    }

    /// List every namespace from the store and seed the counter from it
    pub async fn initialize(&self) -> Result<i64, WebhookError> {
        let namespaces = self.store.list().await?;
        self.initialize_from(&namespaces)
    }

    /// Seed the counter from a namespace listing.
    ///
    /// Returns the start of the first block that will be allocated. Fails if
    /// any namespace carries two parseable annotations with different
    /// starts, or if the tracker was already seeded.
    pub fn initialize_from(&self, namespaces: &[NamespaceAnnotations]) -> Result<i64, WebhookError> {
        if self
            .state
            .compare_exchange(UNINITIALIZED, SEEDING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WebhookError::AlreadyInitialized);
        }

        let next = match Self::seed(namespaces) {
            Ok(next) => next,
            Err(e) => {
                self.state.store(UNINITIALIZED, Ordering::Release);
                return Err(e);
            }
        };

        self.next.store(next, Ordering::SeqCst);
        self.state.store(READY, Ordering::Release);

        tracing::info!(
            namespaces = namespaces.len(),
            next_start = next,
            "Range tracker initialized"
        );

        Ok(next)
    }

    fn seed(namespaces: &[NamespaceAnnotations]) -> Result<i64, WebhookError> {
        match Self::highest_start(namespaces)? {
            Some(max) => max
                .checked_add(BLOCK_SIZE)
                .ok_or(WebhookError::Exhausted(max)),
            None => Ok(DEFAULT_START),
        }
    }

    fn highest_start(namespaces: &[NamespaceAnnotations]) -> Result<Option<i64>, WebhookError> {
        let mut highest = None;

        for ns in namespaces {
            match range::observed_start(&ns.annotations) {
                Ok(Some(start)) => highest = highest.max(Some(start)),
                Ok(None) => {
                    tracing::debug!(namespace = %ns.name, "No usable range annotations");
                }
                Err(e) => {
                    tracing::error!(namespace = %ns.name, "Inconsistent range annotations: {}", e);
                    return Err(e.into());
                }
            }
        }

        Ok(highest)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    /// Reserve a fresh block and return its start.
    ///
    /// The counter only moves forward; once another block would not fit in
    /// an `i64` every call fails with [`WebhookError::Exhausted`].
    pub fn allocate_next(&self) -> Result<i64, WebhookError> {
        if !self.is_initialized() {
            return Err(WebhookError::NotInitialized);
        }

        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                next.checked_add(BLOCK_SIZE)
            })
            .map_err(WebhookError::Exhausted)
    }

    /// Start of the block the next allocation will return
    pub fn next_start(&self) -> Option<i64> {
        self.is_initialized()
            .then(|| self.next.load(Ordering::SeqCst))
    }

    /// Current range of a namespace, `None` if it has no range annotations
    pub async fn lookup_range(&self, namespace: &str) -> Result<Option<IdRange>, WebhookError> {
        let annotations = self
            .store
            .get(namespace)
            .await?
            .ok_or_else(|| K8sError::NamespaceNotFound(namespace.to_string()))?;

        Ok(range::namespace_range(&annotations)?)
    }
}
