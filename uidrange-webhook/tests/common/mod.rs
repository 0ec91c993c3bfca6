//! Common test utilities and helpers
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use uidrange_webhook::config::UidRangeConfig;
use uidrange_webhook::kubernetes::{BypassCheck, MemoryRangeStore, NoBypass};
use uidrange_webhook::state::AppState;
use uidrange_webhook::tracker::RangeTracker;

pub const UID_KEY: &str = "openshift.io/sa.scc.uid-range";
pub const GROUP_KEY: &str = "openshift.io/sa.scc.supplemental-groups";

/// Build state over `store` with a seeded tracker and default config
pub async fn ready_state(store: MemoryRangeStore) -> Arc<AppState> {
    state_with(store, Arc::new(NoBypass), UidRangeConfig::default(), true).await
}

pub async fn state_with(
    store: MemoryRangeStore,
    bypass: Arc<dyn BypassCheck>,
    config: UidRangeConfig,
    initialize: bool,
) -> Arc<AppState> {
    let store = Arc::new(store);
    let tracker = Arc::new(RangeTracker::new(store.clone()));
    if initialize {
        tracker.initialize().await.expect("tracker seeds from store");
    }

    Arc::new(AppState::new(config, store, tracker, bypass))
}

/// Namespace store entry carrying both range annotations
pub fn annotated(name: &str, range: &str) -> (String, Vec<(String, String)>) {
    (
        name.to_string(),
        vec![
            (UID_KEY.to_string(), range.to_string()),
            (GROUP_KEY.to_string(), range.to_string()),
        ],
    )
}

pub fn bare(name: &str) -> (String, Vec<(String, String)>) {
    (name.to_string(), Vec::new())
}

/// Send a request through `app` and decode the JSON body
pub async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Wrap `object` in an admission.k8s.io/v1 AdmissionReview request
pub fn review(kind: &str, operation: &str, namespace: Option<&str>, object: Value) -> Value {
    let resource = format!("{}s", kind.to_lowercase());
    let name = object["metadata"]["name"].as_str().unwrap_or_default().to_string();

    let mut request = json!({
        "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
        "kind": { "group": "", "version": "v1", "kind": kind },
        "resource": { "group": "", "version": "v1", "resource": resource },
        "name": name,
        "operation": operation,
        "userInfo": { "username": "alice", "groups": ["system:authenticated"] },
        "object": object,
        "dryRun": false
    });
    if let Some(namespace) = namespace {
        request["namespace"] = json!(namespace);
    }

    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": request
    })
}

pub fn namespace(name: &str, labels: Value, annotations: Value) -> Value {
    let mut metadata = json!({ "name": name });
    if !labels.is_null() {
        metadata["labels"] = labels;
    }
    if !annotations.is_null() {
        metadata["annotations"] = annotations;
    }

    json!({ "apiVersion": "v1", "kind": "Namespace", "metadata": metadata })
}

/// Decode the base64 JSON patch of an admission response, if any
pub fn patch(review: &Value) -> Option<json_patch::Patch> {
    let bytes = match &review["response"]["patch"] {
        Value::String(encoded) => base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap(),
        Value::Array(raw) => raw.iter().map(|b| b.as_u64().unwrap() as u8).collect(),
        _ => return None,
    };
    Some(serde_json::from_slice(&bytes).unwrap())
}

/// Apply the response patch to `object`
pub fn patched(review: &Value, object: &Value) -> Value {
    let mut object = object.clone();
    if let Some(patch) = patch(review) {
        json_patch::patch(&mut object, &patch.0).unwrap();
    }
    object
}

pub fn allowed(review: &Value) -> bool {
    review["response"]["allowed"].as_bool().unwrap_or(false)
}

pub fn denial(review: &Value) -> &str {
    review["response"]["status"]["message"].as_str().unwrap_or_default()
}
