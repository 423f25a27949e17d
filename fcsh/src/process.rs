//! Process handle: owns the compiler shell child and its stdio.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::error::FcshError;
use crate::types::CompileRequest;

/// Directive that asks the shell to exit.
pub const EXIT_COMMAND: &str = "exit";

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Program, arguments and working directory for the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchCommand {
    /// `java -jar <sdk>/lib/fcsh.jar` with the system properties the SDK's
    /// own launcher scripts pass.
    #[must_use]
    pub fn for_request(request: &CompileRequest) -> Self {
        let sdk = request.sdk_home.display().to_string();
        Self {
            program: request.java.clone(),
            args: vec![
                "-Dsun.io.useCanonCaches=false".to_string(),
                "-Duser.language=en".to_string(),
                "-Duser.region=en".to_string(),
                format!("-Dapplication.home={sdk}"),
                "-jar".to_string(),
                request.archive_path().display().to_string(),
            ],
            working_dir: request.workspace_root.clone(),
        }
    }
}

/// Streams and (for real processes) the child of a freshly started shell.
pub struct Launched {
    pub stdin: BoxedWriter,
    pub stdout: BoxedReader,
    pub stderr: BoxedReader,
    /// `None` for in-process shells that have no OS process to reap.
    pub child: Option<Child>,
}

/// Starts shell processes. The seam between the session and the OS.
pub trait Launcher: Send + Sync + 'static {
    fn start(&self, command: &LaunchCommand) -> io::Result<Launched>;
}

/// Launches the shell as a real child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLauncher;

impl Launcher for TokioLauncher {
    fn start(&self, command: &LaunchCommand) -> io::Result<Launched> {
        let program = which::which(&command.program).map_err(|e| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: {e}", command.program.display()),
            )
        })?;

        let mut child = Command::new(&program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let missing = |stream: &str| io::Error::other(format!("no {stream} from child"));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        Ok(Launched {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            child: Some(child),
        })
    }
}

/// Output side of a started shell, read by the session driver.
pub struct ShellOutput {
    pub stdout: BoxedReader,
    pub stderr: BoxedReader,
}

/// Input side and lifetime of a started shell.
///
/// Does not know about the protocol: callers must only [`send`](Self::send)
/// when the state machine says the shell is ready.
pub struct ProcessHandle {
    stdin: BoxedWriter,
    child: Option<Child>,
}

impl ProcessHandle {
    pub fn start<L: Launcher>(
        launcher: &L,
        command: &LaunchCommand,
    ) -> Result<(Self, ShellOutput), FcshError> {
        tracing::info!(
            program = %command.program.display(),
            cwd = %command.working_dir.display(),
            "Starting compiler shell"
        );
        let launched = launcher
            .start(command)
            .map_err(|source| FcshError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let handle = Self {
            stdin: launched.stdin,
            child: launched.child,
        };
        let output = ShellOutput {
            stdout: launched.stdout,
            stderr: launched.stderr,
        };
        Ok((handle, output))
    }

    /// Write one command line.
    pub async fn send(&mut self, text: &str) -> io::Result<()> {
        tracing::debug!(command = %text, "Sending to compiler shell");
        self.stdin.write_all(text.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    /// Ask the shell to exit. Does not wait and does not kill.
    pub async fn terminate(&mut self) -> io::Result<()> {
        self.send(EXIT_COMMAND).await
    }

    /// Wait for the child to exit, killing it after `timeout`.
    pub async fn reap(mut self, timeout: Duration) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "Compiler shell exited"),
            Ok(Err(e)) => tracing::warn!("Failed to wait for compiler shell: {e}"),
            Err(_) => {
                tracing::debug!("Compiler shell didn't exit in time, killing");
                let _ = child.kill().await;
            }
        }
    }
}
