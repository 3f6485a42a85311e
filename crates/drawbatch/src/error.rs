use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawbatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No host program configured")]
    MissingHostProgram,

    #[error("No output directory configured")]
    MissingOutputDirectory,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to create output directory '{path}': {source}")]
    CreateOutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start host process '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for host process: {0}")]
    Wait(std::io::Error),

    #[error("Failed to terminate host process: {0}")]
    Terminate(std::io::Error),
}

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Output directory '{path}' is not accessible: {source}")]
    OutputDirectoryInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input directory '{0}' does not exist")]
    MissingInputDirectory(PathBuf),

    #[error("Directory scan failed for '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("A batch run is already active on this runner")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, DrawbatchError>;
