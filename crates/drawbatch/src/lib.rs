pub mod batch;
pub mod error;
pub mod host;
pub mod params;
pub mod scanner;

pub use batch::{
    BatchConfig, BatchResult, BatchRunner, CancelToken, DrawingJob, FailedItem, JobOutcome,
    JobStatus, LogSink, NoopProgress, ProgressSink, RunReporter, RunSnapshot, RunStatus,
};
pub use error::{
    BatchError, ConfigError, DetectError, DrawbatchError, Result, ScanError, TransportError,
};
pub use host::{
    classify, wait_for_artifact, CommandLauncher, ExitSignal, HostHandle, HostLauncher,
    HostReport, InvocationRequest, ValidationFailure,
};
pub use params::{materialize, validate_required_columns, MaterializedParams, ParamValue};
pub use scanner::scan_drawings;
