//! Offline pod manifest check
//!
//! Runs the same bounds rules the validating webhook applies, against a pod
//! manifest on disk and a range given on the command line.

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use serde::Serialize;
use std::path::Path;
use uidrange_common::{IdRange, PodIdentity, RangeError};

#[derive(Debug, Serialize)]
struct CheckReport {
    pod: String,
    range: IdRange,
    allowed: bool,
    reason: Option<String>,
}

pub fn handle_check_command(manifest: &Path, range: IdRange, output_format: OutputFormat) -> Result<()> {
    let pod = load_pod(manifest)?;
    let result = check_pod(&pod, &range);

    let report = CheckReport {
        pod: pod.metadata.name.clone().unwrap_or_else(|| manifest.display().to_string()),
        range,
        allowed: result.is_ok(),
        reason: result.as_ref().err().map(ToString::to_string),
    };

    match output_format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Yaml => output::print_yaml(&report)?,
        OutputFormat::Table => match &report.reason {
            None => output::print_success(&format!("Pod '{}' fits range {}", report.pod, range)),
            Some(reason) => output::print_error(&format!("Pod '{}' rejected: {}", report.pod, reason)),
        },
    }

    if let Err(e) = result {
        anyhow::bail!(e);
    }

    Ok(())
}

fn load_pod(path: &Path) -> Result<Pod> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_pod(&contents).with_context(|| format!("Failed to parse pod manifest {}", path.display()))
}

fn parse_pod(contents: &str) -> Result<Pod> {
    Ok(serde_yaml::from_str(contents)?)
}

pub fn check_pod(pod: &Pod, range: &IdRange) -> Result<(), RangeError> {
    PodIdentity::from(pod).check_bounds(range)
}
