//! Pod identity extraction and bounds checking

use crate::{IdRange, RangeError};
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric security context field being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdField {
    RunAsUser,
    RunAsGroup,
    FsGroup,
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdField::RunAsUser => "runAsUser",
            IdField::RunAsGroup => "runAsGroup",
            IdField::FsGroup => "fsGroup",
        };
        f.write_str(name)
    }
}

/// Container-level overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerIdentity {
    pub name: String,
    pub run_as_user: Option<i64>,
    pub run_as_group: Option<i64>,
}

/// The identity fields of a pod that range enforcement looks at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodIdentity {
    pub run_as_user: Option<i64>,
    pub run_as_group: Option<i64>,
    pub fs_group: Option<i64>,
    pub containers: Vec<ContainerIdentity>,
}

impl From<&Pod> for PodIdentity {
    fn from(pod: &Pod) -> Self {
        let Some(spec) = pod.spec.as_ref() else {
            return Self::default();
        };

        let pod_ctx = spec.security_context.as_ref();

        let containers = spec
            .containers
            .iter()
            .map(|c| {
                let ctx = c.security_context.as_ref();
                ContainerIdentity {
                    name: c.name.clone(),
                    run_as_user: ctx.and_then(|s| s.run_as_user),
                    run_as_group: ctx.and_then(|s| s.run_as_group),
                }
            })
            .collect();

        Self {
            run_as_user: pod_ctx.and_then(|s| s.run_as_user),
            run_as_group: pod_ctx.and_then(|s| s.run_as_group),
            fs_group: pod_ctx.and_then(|s| s.fs_group),
            containers,
        }
    }
}

impl ContainerIdentity {
    /// User and group after inheriting unset fields from the pod
    pub fn effective(&self, pod: &PodIdentity) -> (Option<i64>, Option<i64>) {
        (
            self.run_as_user.or(pod.run_as_user),
            self.run_as_group.or(pod.run_as_group),
        )
    }
}

impl PodIdentity {
    /// Check every identity against `range`, stopping at the first violation.
    ///
    /// Pod-level user, group and fsGroup are checked first, then each
    /// container in declaration order. Every container must end up with a
    /// user; an unset group is fine.
    pub fn check_bounds(&self, range: &IdRange) -> Result<(), RangeError> {
        let pod_fields = [
            (IdField::RunAsUser, self.run_as_user),
            (IdField::RunAsGroup, self.run_as_group),
            (IdField::FsGroup, self.fs_group),
        ];

        for (field, value) in pod_fields {
            if let Some(value) = value {
                check(None, field, value, range)?;
            }
        }

        for container in &self.containers {
            let (uid, gid) = container.effective(self);

            let uid = uid.ok_or_else(|| RangeError::MissingIdentity {
                container: container.name.clone(),
            })?;
            check(Some(container.name.as_str()), IdField::RunAsUser, uid, range)?;

            if let Some(gid) = gid {
                check(Some(container.name.as_str()), IdField::RunAsGroup, gid, range)?;
            }
        }

        Ok(())
    }
}

fn check(container: Option<&str>, field: IdField, value: i64, range: &IdRange) -> Result<(), RangeError> {
    if range.contains(value) {
        return Ok(());
    }

    Err(RangeError::OutOfRange {
        container: container.map(String::from),
        field,
        value,
        range: *range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: i64 = 1000580000;

    fn range() -> IdRange {
        IdRange::block(START)
    }

    fn container(name: &str, uid: Option<i64>, gid: Option<i64>) -> ContainerIdentity {
        ContainerIdentity {
            name: name.to_string(),
            run_as_user: uid,
            run_as_group: gid,
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        for uid in [START, START + 10000] {
            let pod = PodIdentity {
                run_as_user: Some(uid),
                containers: vec![container("app", None, None)],
                ..Default::default()
            };
            assert!(pod.check_bounds(&range()).is_ok(), "uid {uid} should pass");
        }

        for uid in [START - 1, START + 10001] {
            let pod = PodIdentity {
                run_as_user: Some(uid),
                containers: vec![container("app", None, None)],
                ..Default::default()
            };
            assert!(pod.check_bounds(&range()).is_err(), "uid {uid} should fail");
        }
    }

    #[test]
    fn test_pod_level_order() {
        let pod = PodIdentity {
            run_as_user: Some(START),
            run_as_group: Some(1),
            fs_group: Some(2),
            containers: vec![],
        };

        let err = pod.check_bounds(&range()).unwrap_err();
        assert!(matches!(
            err,
            RangeError::OutOfRange {
                field: IdField::RunAsGroup,
                value: 1,
                container: None,
                ..
            }
        ));
    }

    #[test]
    fn test_fs_group_checked() {
        let pod = PodIdentity {
            fs_group: Some(START + 20000),
            ..Default::default()
        };
        let err = pod.check_bounds(&range()).unwrap_err();
        assert!(matches!(
            err,
            RangeError::OutOfRange {
                field: IdField::FsGroup,
                ..
            }
        ));
    }

    #[test]
    fn test_container_without_user_rejected() {
        let pod = PodIdentity {
            containers: vec![container("app", None, Some(START))],
            ..Default::default()
        };
        assert_eq!(
            pod.check_bounds(&range()),
            Err(RangeError::MissingIdentity {
                container: "app".to_string()
            })
        );
    }

    #[test]
    fn test_container_override_out_of_range() {
        let pod = PodIdentity {
            run_as_user: Some(START + 5),
            containers: vec![
                container("bad", Some(1000), None),
                container("good", None, None),
            ],
            ..Default::default()
        };

        let err = pod.check_bounds(&range()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "container bad runAsUser 1000 must be within range 1000580000/10000"
        );
    }

    #[test]
    fn test_container_group_inherited() {
        let pod = PodIdentity {
            run_as_group: None,
            containers: vec![container("app", Some(START), Some(START - 1))],
            ..Default::default()
        };
        assert!(matches!(
            pod.check_bounds(&range()),
            Err(RangeError::OutOfRange {
                field: IdField::RunAsGroup,
                ..
            })
        ));

        let pod = PodIdentity {
            run_as_group: Some(START + 1),
            containers: vec![container("app", Some(START), None)],
            ..Default::default()
        };
        assert!(pod.check_bounds(&range()).is_ok());
    }

    #[test]
    fn test_from_pod_manifest() {
        let manifest = r#"
apiVersion: v1
kind: Pod
metadata:
  name: web
  namespace: team-a
spec:
  securityContext:
    runAsUser: 1000580001
    fsGroup: 1000580002
  containers:
    - name: app
      image: nginx
    - name: sidecar
      image: busybox
      securityContext:
        runAsUser: 1000580003
        runAsGroup: 1000580004
"#;
        let pod: Pod = serde_yaml::from_str(manifest).unwrap();
        let identity = PodIdentity::from(&pod);

        assert_eq!(identity.run_as_user, Some(1000580001));
        assert_eq!(identity.run_as_group, None);
        assert_eq!(identity.fs_group, Some(1000580002));
        assert_eq!(identity.containers.len(), 2);
        assert_eq!(
            identity.containers[0].effective(&identity),
            (Some(1000580001), None)
        );
        assert_eq!(
            identity.containers[1].effective(&identity),
            (Some(1000580003), Some(1000580004))
        );
        assert!(identity.check_bounds(&range()).is_ok());
    }
}
