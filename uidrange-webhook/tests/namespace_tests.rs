//! Namespace mutating webhook tests
//! Drive `/mutate--v1-namespace` with AdmissionReview payloads

mod common;

use common::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use uidrange_webhook::config::UidRangeConfig;
use uidrange_webhook::kubernetes::{MemoryRangeStore, NoBypass};
use uidrange_webhook::webhook::{self, NAMESPACE_MUTATE_PATH};

async fn mutate(state: &Arc<uidrange_webhook::state::AppState>, object: &Value) -> Value {
    let body = review("Namespace", "CREATE", None, object.clone());
    let (status, response) = send(webhook::router(state.clone()), "POST", NAMESPACE_MUTATE_PATH, Some(body)).await;
    assert!(status.is_success());
    response
}

fn uid_range(object: &Value) -> Option<&str> {
    object["metadata"]["annotations"][UID_KEY].as_str()
}

// ============== Range Assignment ==============

#[tokio::test]
async fn test_new_namespace_gets_default_block() {
    let state = ready_state(MemoryRangeStore::new()).await;
    let ns = namespace("team-a", Value::Null, Value::Null);

    let response = mutate(&state, &ns).await;
    assert!(allowed(&response));

    let mutated = patched(&response, &ns);
    assert_eq!(uid_range(&mutated), Some("1000100000/10000"));
    assert_eq!(
        mutated["metadata"]["annotations"][GROUP_KEY].as_str(),
        Some("1000100000/10000")
    );
    assert_eq!(
        mutated["metadata"]["labels"]["pod-security.kubernetes.io/enforce"].as_str(),
        Some("restricted")
    );
}

#[tokio::test]
async fn test_allocation_continues_after_existing_namespaces() {
    let store = MemoryRangeStore::with_namespaces([
        annotated("team-a", "1000580000/10000"),
        annotated("team-b", "1000200000/10000"),
        bare("default"),
    ]);
    let state = ready_state(store).await;

    let first = namespace("team-c", Value::Null, Value::Null);
    let second = namespace("team-d", Value::Null, Value::Null);

    let first = patched(&mutate(&state, &first).await, &first);
    let second = patched(&mutate(&state, &second).await, &second);

    assert_eq!(uid_range(&first), Some("1000590000/10000"));
    assert_eq!(uid_range(&second), Some("1000600000/10000"));
}

#[tokio::test]
async fn test_annotated_namespace_is_left_alone() {
    let state = ready_state(MemoryRangeStore::new()).await;
    let ns = namespace(
        "team-a",
        json!({ "pod-security.kubernetes.io/enforce": "baseline" }),
        json!({ UID_KEY: "1000580000/10000", GROUP_KEY: "1000580000/10000" }),
    );

    let response = mutate(&state, &ns).await;

    assert!(allowed(&response));
    assert!(patch(&response).is_none());
    assert_eq!(state.tracker.next_start(), Some(1000100000));
}

#[tokio::test]
async fn test_partial_annotation_is_completed() {
    let state = ready_state(MemoryRangeStore::new()).await;
    let ns = namespace(
        "team-a",
        Value::Null,
        json!({ GROUP_KEY: "1000580000/10000" }),
    );

    let mutated = patched(&mutate(&state, &ns).await, &ns);

    assert_eq!(uid_range(&mutated), Some("1000580000/10000"));
    assert_eq!(state.tracker.next_start(), Some(1000100000));
}

#[tokio::test]
async fn test_existing_pod_security_labels_are_kept() {
    let state = ready_state(MemoryRangeStore::new()).await;
    let ns = namespace(
        "team-a",
        json!({ "pod-security.kubernetes.io/warn": "privileged" }),
        Value::Null,
    );

    let mutated = patched(&mutate(&state, &ns).await, &ns);

    assert!(mutated["metadata"]["labels"]["pod-security.kubernetes.io/enforce"].is_null());
    assert_eq!(
        mutated["metadata"]["labels"]["pod-security.kubernetes.io/warn"].as_str(),
        Some("privileged")
    );
    assert_eq!(uid_range(&mutated), Some("1000100000/10000"));
}

// ============== Exclusions and Configuration ==============

#[tokio::test]
async fn test_excluded_namespace_is_not_patched() {
    let state = ready_state(MemoryRangeStore::new()).await;
    let ns = namespace("kube-system", Value::Null, Value::Null);

    let response = mutate(&state, &ns).await;

    assert!(allowed(&response));
    assert!(patch(&response).is_none());
}

#[tokio::test]
async fn test_custom_exclusion_list() {
    let mut config = UidRangeConfig::default();
    config.ranges.excluded_namespaces = BTreeSet::from(["platform".to_string()]);
    let state = state_with(MemoryRangeStore::new(), Arc::new(NoBypass), config, true).await;

    let platform = namespace("platform", Value::Null, Value::Null);
    assert!(patch(&mutate(&state, &platform).await).is_none());

    // kube-system is no longer excluded once the list is replaced
    let system = namespace("kube-system", Value::Null, Value::Null);
    let mutated = patched(&mutate(&state, &system).await, &system);
    assert_eq!(uid_range(&mutated), Some("1000100000/10000"));
}

#[tokio::test]
async fn test_assignment_disabled_only_labels() {
    let mut config = UidRangeConfig::default();
    config.ranges.assign = false;
    let state = state_with(MemoryRangeStore::new(), Arc::new(NoBypass), config, true).await;
    let ns = namespace("team-a", Value::Null, Value::Null);

    let mutated = patched(&mutate(&state, &ns).await, &ns);

    assert!(uid_range(&mutated).is_none());
    assert_eq!(
        mutated["metadata"]["labels"]["pod-security.kubernetes.io/enforce"].as_str(),
        Some("restricted")
    );
}

// ============== Failures ==============

#[tokio::test]
async fn test_uninitialized_tracker_denies() {
    let state = state_with(
        MemoryRangeStore::new(),
        Arc::new(NoBypass),
        UidRangeConfig::default(),
        false,
    )
    .await;
    let ns = namespace("team-a", Value::Null, Value::Null);

    let response = mutate(&state, &ns).await;

    assert!(!allowed(&response));
    assert!(denial(&response).contains("not initialized"));
}

#[tokio::test]
async fn test_review_without_request_is_invalid() {
    let state = ready_state(MemoryRangeStore::new()).await;
    let body = json!({ "apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview" });

    let (status, response) = send(webhook::router(state), "POST", NAMESPACE_MUTATE_PATH, Some(body)).await;

    assert!(status.is_success());
    assert!(!allowed(&response));
}

// ============== Concurrency ==============

#[tokio::test]
async fn test_concurrent_creates_get_disjoint_blocks() {
    let state = ready_state(MemoryRangeStore::new()).await;

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                let ns = namespace(&format!("team-{}", i), Value::Null, Value::Null);
                let mutated = patched(&mutate(&state, &ns).await, &ns);
                uid_range(&mutated).unwrap().to_string()
            })
        })
        .collect();

    let mut ranges = BTreeSet::new();
    for handle in handles {
        assert!(ranges.insert(handle.await.unwrap()));
    }

    assert_eq!(ranges.len(), 32);
    assert_eq!(state.tracker.next_start(), Some(1000100000 + 32 * 10_000));
}
