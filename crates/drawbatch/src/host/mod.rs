pub mod detect;
pub mod transport;

pub use detect::{classify, wait_for_artifact, HostReport, ValidationFailure};
pub use transport::{
    CommandLauncher, ExitSignal, HostHandle, HostLauncher, InvocationRequest,
};
