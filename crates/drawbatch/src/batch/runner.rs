//! Sequential batch orchestration over the external CAD host.
//!
//! One host, one job at a time: the host is a stateful GUI process, so jobs
//! are never overlapped. The loop suspends only while awaiting host exit and
//! while the artifact flush settles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use super::cancel::CancelToken;
use super::job::{DrawingJob, JobOutcome, JobStatus};
use super::progress::{LogSink, ProgressSink};
use super::report::{BatchResult, RunReporter, RunStatus};
use crate::error::{BatchError, ConfigError, Result, TransportError};
use crate::host::detect;
use crate::host::transport::{ExitSignal, HostLauncher, InvocationRequest};
use crate::params::{self, ParamValue};

/// Everything a batch run needs. The core reads no ambient state; the shell
/// builds one of these from whatever settings store it keeps.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// CAD host executable.
    pub host_program: PathBuf,
    /// Arguments placed before the drawing path (typically the batch script).
    pub host_args: Vec<String>,
    /// Directory the host writes result artifacts into.
    pub output_dir: PathBuf,
    /// Shared parameter defaults applied before per-drawing overrides.
    pub base_params: BTreeMap<String, ParamValue>,
    /// Upper bound on a single invocation; overruns are terminated.
    pub invocation_timeout: Duration,
    /// Grace period for the host's artifact flush after process exit.
    pub artifact_settle: Duration,
}

impl BatchConfig {
    pub fn new(host_program: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            host_program: host_program.into(),
            host_args: Vec::new(),
            output_dir: output_dir.into(),
            base_params: BTreeMap::new(),
            invocation_timeout: Duration::from_secs(600),
            artifact_settle: Duration::from_secs(1),
        }
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.host_program.as_os_str().is_empty() {
            return Err(ConfigError::MissingHostProgram);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDirectory);
        }
        Ok(())
    }
}

/// Drives an ordered list of drawing jobs through the host, one at a time.
/// Single-flight: at most one batch run is active per runner instance.
pub struct BatchRunner {
    config: BatchConfig,
    launcher: Arc<dyn HostLauncher>,
    running: AtomicBool,
}

impl BatchRunner {
    pub fn new(config: BatchConfig, launcher: Arc<dyn HostLauncher>) -> Self {
        Self {
            config,
            launcher,
            running: AtomicBool::new(false),
        }
    }

    /// Enumerates drawings in `input_dir` and processes them as a batch.
    pub async fn process_folder(
        &self,
        input_dir: &Path,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
        log: &dyn LogSink,
    ) -> Result<BatchResult> {
        let jobs = crate::scanner::scan_drawings(input_dir)?;
        self.process_all(jobs, cancel, progress, log).await
    }

    /// Processes every job strictly in input order and returns the final
    /// partition. One job's failure never stops the batch; only cancellation
    /// ends a run early.
    pub async fn process_all(
        &self,
        jobs: Vec<DrawingJob>,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
        log: &dyn LogSink,
    ) -> Result<BatchResult> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BatchError::AlreadyRunning.into());
        }

        let result = self.run_batch(jobs, cancel, progress, log).await;
        self.running.store(false, Ordering::SeqCst);
        Ok(result)
    }

    async fn run_batch(
        &self,
        jobs: Vec<DrawingJob>,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
        log: &dyn LogSink,
    ) -> BatchResult {
        let total = jobs.len();
        let started = Instant::now();
        let mut reporter = RunReporter::new();
        // Index of the first job that was never attempted, set on cancellation.
        let mut stopped_at = None;

        log.log(&format!("Starting batch of {total} drawing(s)"));
        info!(total, "batch started");

        for (index, job) in jobs.iter().enumerate() {
            // The one checkpoint where a run stops early; jobs past it are
            // never attempted.
            if cancel.is_cancelled() {
                stopped_at = Some(index);
                break;
            }

            let position = index + 1;
            progress.progress(position, total, &job.display_name);
            log.log(&format!(
                "Processing drawing {position} of {total}: {}",
                job.display_name
            ));

            let span = info_span!("job", id = %job.id, drawing = %job.display_name);
            let outcome = self.run_job(job, cancel).instrument(span).await;

            let line = reporter.record(&outcome);
            log.log(&line);
            progress.progress(position, total, &job.display_name);

            if outcome.status == JobStatus::Cancelled {
                stopped_at = Some(index + 1);
                break;
            }
        }

        let (status, skipped) = match stopped_at {
            Some(first_skipped) => (
                RunStatus::Cancelled,
                jobs[first_skipped..]
                    .iter()
                    .map(|job| job.display_name.clone())
                    .collect(),
            ),
            None => (RunStatus::Completed, Vec::new()),
        };
        let was_cancelled = status == RunStatus::Cancelled;
        let result = reporter.finalize(status, total, skipped, started.elapsed());

        log.log(&result.summary());
        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            attempted = result.attempted,
            cancelled = was_cancelled,
            "batch finished"
        );

        result
    }

    /// Runs one job end to end. Every failure mode is folded into the
    /// returned outcome; nothing escapes to abort the batch loop.
    async fn run_job(&self, job: &DrawingJob, cancel: &CancelToken) -> JobOutcome {
        let started = Instant::now();

        // An unusable configuration fails this job but never the batch.
        if let Err(e) = self.config.validate() {
            return JobOutcome::failed(
                job,
                JobStatus::FailedException,
                started.elapsed(),
                e.to_string(),
            );
        }

        let materialized = params::materialize(&job.overrides, &self.config.base_params);
        let request = InvocationRequest::new(
            materialized.to_payload(),
            self.config.output_dir.clone(),
            job.display_name.clone(),
            job.result_file.clone(),
        );
        let expected = request.expected_artifact();

        let mut handle = match self.launcher.launch(&job.source_path, &request).await {
            Ok(handle) => handle,
            Err(e) => {
                return JobOutcome::failed(
                    job,
                    JobStatus::FailedException,
                    started.elapsed(),
                    e.to_string(),
                );
            }
        };

        // Resolve the wait first; the handle is acted on only after the
        // select ends and its borrow of the wait future is gone.
        enum WaitEvent {
            Exited(ExitSignal),
            WaitFailed(TransportError),
            TimedOut,
            Cancelled,
        }

        let event = tokio::select! {
            waited = tokio::time::timeout(self.config.invocation_timeout, handle.wait()) => {
                match waited {
                    Ok(Ok(signal)) => WaitEvent::Exited(signal),
                    Ok(Err(e)) => WaitEvent::WaitFailed(e),
                    Err(_) => WaitEvent::TimedOut,
                }
            }
            _ = cancel.cancelled() => WaitEvent::Cancelled,
        };

        let exit = match event {
            WaitEvent::Exited(signal) => signal,
            WaitEvent::WaitFailed(e) => {
                return JobOutcome::failed(
                    job,
                    JobStatus::FailedException,
                    started.elapsed(),
                    e.to_string(),
                );
            }
            WaitEvent::TimedOut => {
                // Hung host: kill it so the batch keeps moving.
                if let Err(e) = handle.terminate().await {
                    warn!(error = %e, "failed to terminate timed-out host process");
                }
                return JobOutcome::failed(
                    job,
                    JobStatus::FailedException,
                    started.elapsed(),
                    format!(
                        "invocation exceeded {:.0}s and was terminated",
                        self.config.invocation_timeout.as_secs_f64()
                    ),
                );
            }
            WaitEvent::Cancelled => {
                // In-flight work is abandoned, not rolled back; a partially
                // written artifact stays where it is.
                if let Err(e) = handle.terminate().await {
                    warn!(error = %e, "failed to terminate host process on cancellation");
                }
                return JobOutcome::cancelled(job, started.elapsed());
            }
        };

        detect::wait_for_artifact(&expected, self.config.artifact_settle).await;
        detect::classify(job, &expected, &exit, started.elapsed())
    }
}
