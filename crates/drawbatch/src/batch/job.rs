use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// One drawing queued for processing. Immutable once enumerated; its
/// identity is the source path.
#[derive(Debug, Clone)]
pub struct DrawingJob {
    pub id: String,
    pub source_path: PathBuf,
    /// Name shown in progress updates and used for the result artifact.
    pub display_name: String,
    /// Explicit result-file override; the default is `<display_name>.json`.
    pub result_file: Option<String>,
    /// Raw CSV row for this drawing. Consumed once during materialization.
    pub overrides: HashMap<String, String>,
}

impl DrawingJob {
    pub fn new(source_path: PathBuf) -> Self {
        Self::with_overrides(source_path, HashMap::new())
    }

    pub fn with_overrides(source_path: PathBuf, overrides: HashMap<String, String>) -> Self {
        let display_name = source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_path,
            display_name,
            result_file: None,
            overrides,
        }
    }

    pub fn with_result_file(mut self, name: impl Into<String>) -> Self {
        self.result_file = Some(name.into());
        self
    }
}

/// How one invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Clean exit and no result artifact.
    Succeeded,
    /// The host wrote a result artifact; failures were recorded in it.
    FailedWithOutput,
    /// The host exited with a nonzero code but wrote no report.
    FailedNoOutput,
    /// Crash, spawn failure, timeout, or an inaccessible output directory.
    FailedException,
    /// Abandoned mid-flight on cancellation; excluded from both result lists.
    Cancelled,
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            JobStatus::FailedWithOutput | JobStatus::FailedNoOutput | JobStatus::FailedException
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::FailedWithOutput => write!(f, "failed (host report)"),
            JobStatus::FailedNoOutput => write!(f, "failed (no report)"),
            JobStatus::FailedException => write!(f, "failed (exception)"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one invocation. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: String,
    pub drawing: String,
    pub status: JobStatus,
    pub elapsed: Duration,
    pub detail: Option<String>,
    pub artifact: Option<PathBuf>,
}

impl JobOutcome {
    pub fn succeeded(job: &DrawingJob, elapsed: Duration) -> Self {
        Self {
            job_id: job.id.clone(),
            drawing: job.display_name.clone(),
            status: JobStatus::Succeeded,
            elapsed,
            detail: None,
            artifact: None,
        }
    }

    pub fn failed(
        job: &DrawingJob,
        status: JobStatus,
        elapsed: Duration,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job.id.clone(),
            drawing: job.display_name.clone(),
            status,
            elapsed,
            detail: Some(detail.into()),
            artifact: None,
        }
    }

    pub fn failed_with_artifact(
        job: &DrawingJob,
        elapsed: Duration,
        detail: impl Into<String>,
        artifact: PathBuf,
    ) -> Self {
        Self {
            job_id: job.id.clone(),
            drawing: job.display_name.clone(),
            status: JobStatus::FailedWithOutput,
            elapsed,
            detail: Some(detail.into()),
            artifact: Some(artifact),
        }
    }

    pub fn cancelled(job: &DrawingJob, elapsed: Duration) -> Self {
        Self {
            job_id: job.id.clone(),
            drawing: job.display_name.clone(),
            status: JobStatus::Cancelled,
            elapsed,
            detail: None,
            artifact: None,
        }
    }
}
