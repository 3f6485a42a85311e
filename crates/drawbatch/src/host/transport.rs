//! Launching the external CAD host against one drawing.
//!
//! The host is a GUI application driven through its command-line/script
//! interface; per-invocation configuration travels in environment variables,
//! never in temporary files.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::TransportError;

/// Environment variables the host's embedded command handler reads.
pub const ENV_PARAMS: &str = "DRAWBATCH_PARAMS";
pub const ENV_OUTPUT_DIR: &str = "DRAWBATCH_OUTPUT_DIR";
pub const ENV_RUN_STAMP: &str = "DRAWBATCH_RUN_STAMP";
pub const ENV_DRAWING: &str = "DRAWBATCH_DRAWING";
pub const ENV_RESULT_FILE: &str = "DRAWBATCH_RESULT_FILE";

/// Everything one invocation transmits to the host.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// Serialized parameter payload (see `MaterializedParams::to_payload`).
    pub payload: String,
    /// Directory the host writes its result artifact into.
    pub output_dir: PathBuf,
    /// Correlation timestamp for this invocation.
    pub stamp: DateTime<Utc>,
    /// Display name of the drawing, shown in host-side logs.
    pub drawing_name: String,
    /// File name of the result artifact the host would write on failure.
    pub result_file: String,
}

impl InvocationRequest {
    pub fn new(
        payload: String,
        output_dir: PathBuf,
        drawing_name: String,
        result_file: Option<String>,
    ) -> Self {
        let result_file = result_file.unwrap_or_else(|| format!("{drawing_name}.json"));
        Self {
            payload,
            output_dir,
            stamp: Utc::now(),
            drawing_name,
            result_file,
        }
    }

    /// Deterministic path of the artifact the host writes when it has
    /// failures to report.
    pub fn expected_artifact(&self) -> PathBuf {
        self.output_dir.join(&self.result_file)
    }

    fn env_vars(&self) -> [(&'static str, String); 5] {
        [
            (ENV_PARAMS, self.payload.clone()),
            (ENV_OUTPUT_DIR, self.output_dir.display().to_string()),
            (
                ENV_RUN_STAMP,
                self.stamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (ENV_DRAWING, self.drawing_name.clone()),
            (ENV_RESULT_FILE, self.result_file.clone()),
        ]
    }
}

/// How the host process signalled its termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitSignal {
    /// Exit code 0.
    Clean,
    /// Nonzero exit code.
    Failed(i32),
    /// Terminated without an exit code (killed by a signal); carries a
    /// diagnostic string.
    Crashed(String),
}

impl ExitSignal {
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(0) => ExitSignal::Clean,
            Some(code) => ExitSignal::Failed(code),
            None => ExitSignal::Crashed(format!("host terminated by signal ({status})")),
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ExitSignal::Clean)
    }
}

/// A running host invocation. Owned exclusively by the orchestrator for the
/// duration of one job.
#[async_trait]
pub trait HostHandle: Send {
    /// Waits for the underlying process to terminate.
    async fn wait(&mut self) -> Result<ExitSignal, TransportError>;

    /// Forcibly stops the process. A no-op once the process has exited.
    async fn terminate(&mut self) -> Result<(), TransportError>;
}

/// Starts host invocations. Substitutable with a stub in tests.
#[async_trait]
pub trait HostLauncher: Send + Sync {
    async fn launch(
        &self,
        drawing: &Path,
        request: &InvocationRequest,
    ) -> Result<Box<dyn HostHandle>, TransportError>;
}

/// Production launcher: one host process per drawing, configured through the
/// environment channel.
pub struct CommandLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl HostLauncher for CommandLauncher {
    async fn launch(
        &self,
        drawing: &Path,
        request: &InvocationRequest,
    ) -> Result<Box<dyn HostHandle>, TransportError> {
        // The host aborts a job whose output directory is missing; make it
        // exist before the process starts. Idempotent.
        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|e| TransportError::CreateOutputDirectory {
                path: request.output_dir.clone(),
                source: e,
            })?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(drawing)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        for (key, value) in request.env_vars() {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|e| TransportError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        debug!(
            program = %self.program.display(),
            drawing = %drawing.display(),
            "host process started"
        );

        Ok(Box::new(CommandHandle { child }))
    }
}

struct CommandHandle {
    child: Child,
}

#[async_trait]
impl HostHandle for CommandHandle {
    async fn wait(&mut self) -> Result<ExitSignal, TransportError> {
        let status = self.child.wait().await.map_err(TransportError::Wait)?;
        Ok(ExitSignal::from_status(status))
    }

    async fn terminate(&mut self) -> Result<(), TransportError> {
        match self.child.try_wait() {
            Ok(Some(_)) => Ok(()),
            _ => self.child.kill().await.map_err(TransportError::Terminate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(output_dir: &Path) -> InvocationRequest {
        InvocationRequest::new(
            "{}".to_string(),
            output_dir.to_path_buf(),
            "bracket-42".to_string(),
            None,
        )
    }

    #[test]
    fn test_expected_artifact_defaults_to_drawing_name() {
        let req = request(Path::new("/out"));
        assert_eq!(req.expected_artifact(), PathBuf::from("/out/bracket-42.json"));
    }

    #[test]
    fn test_expected_artifact_honors_override() {
        let req = InvocationRequest::new(
            "{}".to_string(),
            PathBuf::from("/out"),
            "bracket-42".to_string(),
            Some("custom.json".to_string()),
        );
        assert_eq!(req.expected_artifact(), PathBuf::from("/out/custom.json"));
    }

    #[test]
    fn test_env_vars_cover_the_whole_channel() {
        let req = request(Path::new("/out"));
        let vars = req.env_vars();

        let keys: Vec<&str> = vars.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                ENV_PARAMS,
                ENV_OUTPUT_DIR,
                ENV_RUN_STAMP,
                ENV_DRAWING,
                ENV_RESULT_FILE
            ]
        );

        let drawing = vars.iter().find(|(k, _)| *k == ENV_DRAWING).unwrap();
        assert_eq!(drawing.1, "bracket-42");
        let result = vars.iter().find(|(k, _)| *k == ENV_RESULT_FILE).unwrap();
        assert_eq!(result.1, "bracket-42.json");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_launcher_reports_exit_codes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let req = request(&tmp.path().join("out"));

        let launcher = CommandLauncher::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        // The drawing path is appended as a trailing argument; sh ignores it.
        let mut handle = launcher.launch(Path::new("ignored.dwg"), &req).await.unwrap();

        assert_eq!(handle.wait().await.unwrap(), ExitSignal::Failed(3));
        // Output directory was created as part of the launch.
        assert!(tmp.path().join("out").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_launcher_clean_exit() {
        let tmp = tempfile::TempDir::new().unwrap();
        let req = request(&tmp.path().join("out"));

        let launcher = CommandLauncher::new("true", vec![]);
        let mut handle = launcher.launch(Path::new("ignored.dwg"), &req).await.unwrap();

        assert!(handle.wait().await.unwrap().is_clean());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_then_wait_is_not_clean() {
        let tmp = tempfile::TempDir::new().unwrap();
        let req = request(&tmp.path().join("out"));

        let launcher = CommandLauncher::new("sleep", vec!["30".to_string()]);
        let mut handle = launcher.launch(Path::new("ignored.dwg"), &req).await.unwrap();

        handle.terminate().await.unwrap();
        let signal = handle.wait().await.unwrap();
        assert!(matches!(signal, ExitSignal::Crashed(_)));
    }

    #[tokio::test]
    async fn test_spawn_failure_surfaces_program_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let req = request(&tmp.path().join("out"));

        let launcher = CommandLauncher::new("/nonexistent/cad-host", vec![]);
        let err = launcher
            .launch(Path::new("a.dwg"), &req)
            .await
            .err()
            .unwrap();

        assert!(matches!(err, TransportError::Spawn { .. }));
    }
}
