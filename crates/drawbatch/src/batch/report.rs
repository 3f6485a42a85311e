//! Outcome aggregation and run summaries.

use std::time::Duration;

use super::job::{JobOutcome, JobStatus};

/// Final status of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
    Faulted,
}

/// One failed drawing with the reason recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub drawing: String,
    pub reason: String,
}

/// Read-only view of a run in progress.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedItem>,
    pub attempted: usize,
}

/// Aggregate result of one batch run. Immutable once returned.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub status: RunStatus,
    /// Drawings that succeeded, in input order.
    pub succeeded: Vec<String>,
    /// Drawings that failed, in input order, with reasons.
    pub failed: Vec<FailedItem>,
    /// Drawings never attempted because the run was cancelled, in input order.
    pub skipped: Vec<String>,
    /// Jobs that were started, including a job abandoned on cancellation.
    pub attempted: usize,
    /// Size of the input list.
    pub total: usize,
    pub elapsed: Duration,
}

impl BatchResult {
    /// Jobs never started because the run stopped early.
    pub fn not_attempted(&self) -> usize {
        self.total - self.attempted
    }

    pub fn summary(&self) -> String {
        match self.status {
            RunStatus::Cancelled => {
                let mut line = format!(
                    "Batch cancelled after {} of {} drawing(s) ({} succeeded, {} failed)",
                    self.attempted,
                    self.total,
                    self.succeeded.len(),
                    self.failed.len(),
                );
                if !self.skipped.is_empty() {
                    line.push_str(&format!("; never attempted: {}", self.skipped.join(", ")));
                }
                line
            }
            _ => {
                let mut line = format!(
                    "Batch finished: {} succeeded, {} failed in {:.1}s",
                    self.succeeded.len(),
                    self.failed.len(),
                    self.elapsed.as_secs_f64(),
                );
                if !self.failed.is_empty() {
                    let names: Vec<&str> =
                        self.failed.iter().map(|f| f.drawing.as_str()).collect();
                    line.push_str(&format!("; failed: {}", names.join(", ")));
                }
                line
            }
        }
    }
}

/// Sole writer of the growing outcome lists. The orchestrator feeds it one
/// `JobOutcome` at a time; everyone else sees snapshots or the finalized
/// result.
#[derive(Debug, Default)]
pub struct RunReporter {
    succeeded: Vec<String>,
    failed: Vec<FailedItem>,
    attempted: usize,
}

impl RunReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished job and returns the log line for it.
    pub fn record(&mut self, outcome: &JobOutcome) -> String {
        self.attempted += 1;

        match outcome.status {
            JobStatus::Succeeded => self.succeeded.push(outcome.drawing.clone()),
            // An abandoned in-flight job counts as attempted but lands in
            // neither list.
            JobStatus::Cancelled => {}
            _ => self.failed.push(FailedItem {
                drawing: outcome.drawing.clone(),
                reason: outcome
                    .detail
                    .clone()
                    .unwrap_or_else(|| outcome.status.to_string()),
            }),
        }

        job_line(outcome)
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            succeeded: self.succeeded.clone(),
            failed: self.failed.clone(),
            attempted: self.attempted,
        }
    }

    pub fn finalize(
        self,
        status: RunStatus,
        total: usize,
        skipped: Vec<String>,
        elapsed: Duration,
    ) -> BatchResult {
        BatchResult {
            status,
            succeeded: self.succeeded,
            failed: self.failed,
            skipped,
            attempted: self.attempted,
            total,
            elapsed,
        }
    }
}

fn job_line(outcome: &JobOutcome) -> String {
    let seconds = outcome.elapsed.as_secs_f64();
    match (&outcome.status, &outcome.detail) {
        (JobStatus::Succeeded, _) => {
            format!("Processed '{}' in {seconds:.1}s: OK", outcome.drawing)
        }
        (JobStatus::Cancelled, _) => {
            format!("Abandoned '{}' after {seconds:.1}s: cancelled", outcome.drawing)
        }
        (status, Some(detail)) => format!(
            "Processed '{}' in {seconds:.1}s: {status}: {detail}",
            outcome.drawing
        ),
        (status, None) => {
            format!("Processed '{}' in {seconds:.1}s: {status}", outcome.drawing)
        }
    }
}
