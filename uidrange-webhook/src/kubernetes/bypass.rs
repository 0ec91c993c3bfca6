//! Pod validation bypass
//!
//! Some identities (cluster operators, platform controllers) are allowed to
//! run pods outside their namespace block. Whether a user holds that
//! capability is an authorization decision made outside the validator.

use async_trait::async_trait;
use k8s_openapi::api::authentication::v1::UserInfo;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SubjectAccessReview, SubjectAccessReviewSpec,
};
use kube::api::{Api, PostParams};

use super::client::K8sClient;
use crate::config::BypassConfig;

/// Decides whether a requesting identity may skip range enforcement
#[async_trait]
pub trait BypassCheck: Send + Sync {
    async fn allows_bypass(&self, namespace: &str, user: &UserInfo) -> bool;
}

/// Never grants a bypass
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBypass;

#[async_trait]
impl BypassCheck for NoBypass {
    async fn allows_bypass(&self, _namespace: &str, _user: &UserInfo) -> bool {
        false
    }
}

/// Grants a bypass when a SubjectAccessReview for the configured
/// group/resource/verb in the pod's namespace is allowed
#[derive(Debug, Clone)]
pub struct SubjectAccessReviewBypass {
    client: K8sClient,
    group: String,
    resource: String,
    verb: String,
}

impl SubjectAccessReviewBypass {
    pub fn new(client: K8sClient, config: &BypassConfig) -> Self {
        Self {
            client,
            group: config.group.clone(),
            resource: config.resource.clone(),
            verb: config.verb.clone(),
        }
    }

    fn review(&self, namespace: &str, user: &UserInfo) -> SubjectAccessReview {
        SubjectAccessReview {
            spec: SubjectAccessReviewSpec {
                user: user.username.clone(),
                groups: user.groups.clone(),
                uid: user.uid.clone(),
                extra: user.extra.clone(),
                resource_attributes: Some(ResourceAttributes {
                    namespace: Some(namespace.to_string()),
                    group: Some(self.group.clone()),
                    resource: Some(self.resource.clone()),
                    verb: Some(self.verb.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[async_trait]
impl BypassCheck for SubjectAccessReviewBypass {
    async fn allows_bypass(&self, namespace: &str, user: &UserInfo) -> bool {
        let api: Api<SubjectAccessReview> = Api::all(self.client.inner().clone());
        let review = self.review(namespace, user);

        match api.create(&PostParams::default(), &review).await {
            Ok(result) => result.status.map(|s| s.allowed).unwrap_or(false),
            Err(e) => {
                // Authorizer failures deny the bypass.
                tracing::warn!(
                    namespace,
                    user = user.username.as_deref().unwrap_or_default(),
                    "SubjectAccessReview failed: {}",
                    e
                );
                false
            }
        }
    }
}
