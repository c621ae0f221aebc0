//! Viewer launcher backed by `std::process::Command`.

use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use log::{debug, info};

use super::{LaunchError, LaunchRequest, ViewerHandle, ViewerLauncher};

/// Spawns the configured viewer executable.
#[derive(Debug, Clone, Default)]
pub struct CommandLauncher {
    program: Option<PathBuf>,
}

impl CommandLauncher {
    pub fn new(program: Option<PathBuf>) -> Self {
        Self { program }
    }
}

impl ViewerLauncher for CommandLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn ViewerHandle>, LaunchError> {
        let program = self.program.as_ref().ok_or(LaunchError::NotConfigured)?;
        let args = request.args();

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;

        info!("Launched {} (pid {}) {:?}", program.display(), child.id(), args);
        Ok(Box::new(ChildHandle { child }))
    }
}

/// Handle to a spawned viewer.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
}

impl ViewerHandle for ChildHandle {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(self.child.try_wait()?.is_some())
    }

    fn request_close(&mut self) -> io::Result<()> {
        debug!("Requesting close of pid {}", self.child.id());
        request_close(&mut self.child)
    }
}

#[cfg(unix)]
fn request_close(child: &mut Child) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(io::Error::from)
}

#[cfg(windows)]
fn request_close(child: &mut Child) -> io::Result<()> {
    // without /F this posts WM_CLOSE, letting the viewer shut down cleanly
    let status = Command::new("taskkill")
        .args(["/PID", &child.id().to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("taskkill exited with {}", status),
        ))
    }
}

#[cfg(not(any(unix, windows)))]
fn request_close(child: &mut Child) -> io::Result<()> {
    child.kill()
}
