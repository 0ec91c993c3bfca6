//! AdmissionReview handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use kube::core::DynamicObject;

use super::{NamespaceAnnotator, WebhookError};
use crate::state::AppState;

type ReviewResponse = Json<AdmissionReview<DynamicObject>>;

/// `POST /mutate--v1-namespace`
pub(super) async fn mutate_namespace(
    State(state): State<Arc<AppState>>,
    Json(review): Json<AdmissionReview<Namespace>>,
) -> ReviewResponse {
    let req: AdmissionRequest<Namespace> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Invalid namespace admission review: {}", e);
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = match mutate(&state.annotator, &req) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(namespace = %req.name, "Namespace rejected: {}", e);
            AdmissionResponse::from(&req).deny(e.to_string())
        }
    };

    Json(response.into_review())
}

fn mutate(
    annotator: &NamespaceAnnotator,
    req: &AdmissionRequest<Namespace>,
) -> Result<AdmissionResponse, WebhookError> {
    let response = AdmissionResponse::from(req);
    let Some(original) = req.object.as_ref() else {
        return Ok(response);
    };

    let mut namespace = original.clone();
    annotator.annotate(&mut namespace)?;

    let patch = json_patch::diff(&to_value(original)?, &to_value(&namespace)?);
    if patch.0.is_empty() {
        return Ok(response);
    }

    response
        .with_patch(patch)
        .map_err(|e| WebhookError::Patch(e.to_string()))
}

fn to_value(namespace: &Namespace) -> Result<serde_json::Value, WebhookError> {
    serde_json::to_value(namespace).map_err(|e| WebhookError::Patch(e.to_string()))
}

/// `POST /validate--v1-pod`
pub(super) async fn validate_pod(
    State(state): State<Arc<AppState>>,
    Json(review): Json<AdmissionReview<Pod>>,
) -> ReviewResponse {
    let req: AdmissionRequest<Pod> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Invalid pod admission review: {}", e);
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = AdmissionResponse::from(&req);
    if matches!(req.operation, Operation::Delete) {
        return Json(response.into_review());
    }

    let Some(pod) = req.object.as_ref() else {
        return Json(response.deny("admission request carries no pod").into_review());
    };

    let Some(namespace) = req
        .namespace
        .as_deref()
        .or(pod.metadata.namespace.as_deref())
    else {
        return Json(response.deny("pod namespace is unknown").into_review());
    };

    let pod_name = pod
        .metadata
        .name
        .as_deref()
        .or(pod.metadata.generate_name.as_deref())
        .unwrap_or_default();

    let response = match state.pod_validator.validate(namespace, pod, &req.user_info).await {
        Ok(decision) => {
            tracing::debug!(namespace, pod = pod_name, ?decision, "Pod admitted");
            response
        }
        Err(e) => {
            tracing::info!(namespace, pod = pod_name, "Pod rejected: {}", e);
            response.deny(e.to_string())
        }
    };

    Json(response.into_review())
}
