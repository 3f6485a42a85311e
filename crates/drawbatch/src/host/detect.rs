//! Outcome classification from filesystem side effects.
//!
//! The host has no structured return channel, so completion is inferred from
//! the result artifact with an inverted convention: the host writes the
//! artifact only when it has failures to record, so a missing artifact after
//! a clean exit IS the success signal. `JobStatus::Succeeded` must only ever
//! arise from the absence branch in this module.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::transport::ExitSignal;
use crate::batch::job::{DrawingJob, JobOutcome, JobStatus};
use crate::error::DetectError;

/// Result artifact shape. The host writes either an error-shaped payload
/// (`error: true` with a message) when its own machinery faults, or a domain
/// report carrying validation failures. Both mean the job failed; they differ
/// only in the detail we log.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReport {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub drawing: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub validation_failures: Vec<ValidationFailure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub rule: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Gives the host's artifact flush time to settle after process exit.
/// Polls every 50 ms up to `settle`; returns early once the artifact exists.
pub async fn wait_for_artifact(expected: &Path, settle: Duration) -> bool {
    const STEP: Duration = Duration::from_millis(50);

    let deadline = tokio::time::Instant::now() + settle;
    loop {
        if expected.exists() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(STEP.min(settle)).await;
    }
}

/// Classifies one finished invocation. Cancellation is handled by the caller
/// before the wait completes; everything else is decided here, in order:
/// crash without an artifact, artifact present, then the absence branch.
pub fn classify(
    job: &DrawingJob,
    expected: &Path,
    exit: &ExitSignal,
    elapsed: Duration,
) -> JobOutcome {
    let artifact_present = expected.exists();

    if let ExitSignal::Crashed(detail) = exit {
        if !artifact_present {
            return JobOutcome::failed(job, JobStatus::FailedException, elapsed, detail.clone());
        }
    }

    if artifact_present {
        let detail = read_report_detail(expected);
        debug!(artifact = %expected.display(), detail = %detail, "result artifact present");
        return JobOutcome::failed_with_artifact(job, elapsed, detail, expected.to_path_buf());
    }

    // Absence only means success while the output directory itself is still
    // readable; a directory that vanished mid-run would fake a clean result.
    if let Err(e) = verify_output_dir(expected) {
        return JobOutcome::failed(job, JobStatus::FailedException, elapsed, e.to_string());
    }

    match exit {
        ExitSignal::Clean => JobOutcome::succeeded(job, elapsed),
        ExitSignal::Failed(code) => JobOutcome::failed(
            job,
            JobStatus::FailedNoOutput,
            elapsed,
            format!("host exited with code {code} and wrote no report"),
        ),
        ExitSignal::Crashed(detail) => {
            JobOutcome::failed(job, JobStatus::FailedException, elapsed, detail.clone())
        }
    }
}

fn verify_output_dir(expected: &Path) -> Result<(), DetectError> {
    let dir = expected.parent().unwrap_or(Path::new("."));
    std::fs::read_dir(dir)
        .map(|_| ())
        .map_err(|e| DetectError::OutputDirectoryInaccessible {
            path: dir.to_path_buf(),
            source: e,
        })
}

fn read_report_detail(path: &Path) -> String {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return format!("host wrote a result artifact that could not be read: {e}"),
    };

    match serde_json::from_str::<HostReport>(&text) {
        Ok(report) => report_detail(&report),
        Err(_) => "host wrote a result artifact that could not be parsed".to_string(),
    }
}

fn report_detail(report: &HostReport) -> String {
    if report.error {
        return report
            .error_message
            .clone()
            .unwrap_or_else(|| "host reported an internal error".to_string());
    }

    if !report.validation_failures.is_empty() {
        let rules: Vec<&str> = report
            .validation_failures
            .iter()
            .map(|f| f.rule.as_str())
            .collect();
        return format!(
            "{} validation failure(s): {}",
            report.validation_failures.len(),
            rules.join(", ")
        );
    }

    // Presence alone is the failure signal under the write-only-on-failure
    // contract, even when the report carries no recognizable markers.
    "host recorded failures for this drawing".to_string()
}
