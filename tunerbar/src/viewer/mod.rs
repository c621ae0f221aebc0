//! External viewer (TVTest) processes.
//!
//! The core only holds a liveness/close handle per launched process; the
//! process itself is never waited on or killed.

pub mod launcher;
pub mod scheduler;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tunerbar_protocol::ServiceKey;

pub use launcher::CommandLauncher;
pub use scheduler::{SchedulerConfig, TickReport, ViewerScheduler};

/// Viewer launch errors.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Viewer executable is not configured")]
    NotConfigured,

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What the viewer should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// Tune to a live channel.
    Channel { tsid: u16, sid: u16 },
    /// Play a recorded file.
    File(String),
}

/// One viewer launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub target: LaunchTarget,
    /// Extra command-line options from the configuration.
    pub options: String,
}

impl LaunchRequest {
    pub fn channel(key: ServiceKey, options: impl Into<String>) -> Self {
        Self {
            target: LaunchTarget::Channel {
                tsid: key.tsid,
                sid: key.sid,
            },
            options: options.into(),
        }
    }

    pub fn file(path: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            target: LaunchTarget::File(path.into()),
            options: options.into(),
        }
    }

    /// Command-line arguments: the options followed by the target.
    pub fn args(&self) -> Vec<String> {
        let mut args = split_options(&self.options);
        match &self.target {
            LaunchTarget::Channel { tsid, sid } => {
                args.extend([
                    "/tsid".to_string(),
                    tsid.to_string(),
                    "/sid".to_string(),
                    sid.to_string(),
                ]);
            }
            LaunchTarget::File(path) => args.push(path.clone()),
        }
        args
    }
}

/// Split an option string on whitespace, keeping double-quoted runs together.
fn split_options(options: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in options.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}

/// Liveness and close access to a launched viewer.
pub trait ViewerHandle {
    /// OS process id, if known.
    fn id(&self) -> Option<u32>;

    /// Whether the process has exited. An error means liveness is unknown.
    fn has_exited(&mut self) -> io::Result<bool>;

    /// Ask the process to close. Does not wait for it.
    fn request_close(&mut self) -> io::Result<()>;
}

/// Starts viewer processes.
pub trait ViewerLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn ViewerHandle>, LaunchError>;
}

impl<L: ViewerLauncher + ?Sized> ViewerLauncher for &L {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn ViewerHandle>, LaunchError> {
        (**self).launch(request)
    }
}
