//! Progress and log callbacks surfaced to the embedding shell.

/// Receives batch progress updates: how many jobs are accounted for, the
/// batch size, and the drawing currently in flight. Called at least once
/// before and once after each job; the numerator never decreases.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, current: usize, total: usize, drawing: &str);
}

/// Receives human-readable lifecycle log lines.
pub trait LogSink: Send + Sync {
    fn log(&self, line: &str);
}

/// No-op sinks for unit tests and headless callers.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn progress(&self, _current: usize, _total: usize, _drawing: &str) {}
}

impl LogSink for NoopProgress {
    fn log(&self, _line: &str) {}
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn progress(&self, current: usize, total: usize, drawing: &str) {
        self(current, total, drawing)
    }
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, line: &str) {
        self(line)
    }
}
