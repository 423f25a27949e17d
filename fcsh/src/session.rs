//! FcshSession facade: the only entry point build front ends use.
//!
//! One driver task per shell incarnation owns the process streams and the
//! [`ShellMachine`]; every transition happens on that task. The facade talks
//! to it over a command channel and gates re-entrancy with a non-blocking
//! lock on the active-shell slot, so a second compile is rejected without
//! touching the process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::classifier::{OutputClassifier, OutputEvent};
use crate::codec::decode_latin1;
use crate::error::FcshError;
use crate::process::{LaunchCommand, Launcher, ProcessHandle, ShellOutput, TokioLauncher};
use crate::state::{Action, CompileOutcome, Rejection, ShellMachine};
use crate::types::{CompileReport, CompileRequest, FcshSettings, OutputSink, SessionState};

const COMMAND_CHANNEL_CAPACITY: usize = 4;

const READ_BUFFER_BYTES: usize = 8 * 1024;

type CompileReply = oneshot::Sender<Result<CompileReport, FcshError>>;

enum DriverCommand {
    Compile {
        startup_command: String,
        reply: CompileReply,
    },
    Shutdown,
}

/// A running shell incarnation as seen from the facade.
struct ActiveShell {
    archive: PathBuf,
    /// Working directory the shell resolves relative paths against.
    workspace: PathBuf,
    commands: mpsc::Sender<DriverCommand>,
    driver: JoinHandle<()>,
}

impl ActiveShell {
    /// Ask the shell to exit and wait until the driver has reaped it.
    async fn shutdown(self) {
        tracing::info!(archive = %self.archive.display(), "Stopping compiler shell");
        let _ = self.commands.send(DriverCommand::Shutdown).await;
        if let Err(e) = self.driver.await {
            tracing::warn!("Compiler shell driver failed: {e}");
        }
    }
}

/// Long-lived compiler shell session.
///
/// The shell is spawned lazily on the first compile and reused until the
/// SDK or workspace changes, it exits, or a compile times out.
pub struct FcshSession<L: Launcher = TokioLauncher> {
    launcher: L,
    sink: Arc<dyn OutputSink>,
    settings: FcshSettings,
    active: Mutex<Option<ActiveShell>>,
    state_tx: Arc<watch::Sender<SessionState>>,
}

impl FcshSession<TokioLauncher> {
    #[must_use]
    pub fn new(sink: Arc<dyn OutputSink>, settings: FcshSettings) -> Self {
        Self::with_launcher(TokioLauncher, sink, settings)
    }
}

impl<L: Launcher> FcshSession<L> {
    #[must_use]
    pub fn with_launcher(launcher: L, sink: Arc<dyn OutputSink>, settings: FcshSettings) -> Self {
        let (state_tx, _) = watch::channel(SessionState::NotStarted);
        Self {
            launcher,
            sink,
            settings,
            active: Mutex::new(None),
            state_tx: Arc::new(state_tx),
        }
    }

    /// Current shell state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Compile through the shell.
    ///
    /// Resolves when the shell prints its prompt after the command. Fails
    /// immediately with [`FcshError::Concurrency`] while another compile is
    /// outstanding and with [`FcshError::Configuration`] when the SDK has no
    /// shell archive.
    pub async fn compile(&self, request: CompileRequest) -> Result<CompileReport, FcshError> {
        let Ok(mut active) = self.active.try_lock() else {
            tracing::warn!("Compile requested while a previous compile is still running");
            return Err(FcshError::Concurrency);
        };

        let archive = request.archive_path();
        if !archive.is_file() {
            tracing::warn!(path = %archive.display(), "Compiler shell archive missing");
            return Err(FcshError::Configuration { path: archive });
        }

        if let Some(stale) = active.take_if(|shell| {
            shell.archive != archive
                || shell.workspace != request.workspace_root
                || shell.driver.is_finished()
        }) {
            stale.shutdown().await;
        }

        if active.is_none() {
            *active = Some(self.spawn(&request, archive)?);
        }
        let Some(shell) = active.as_mut() else {
            return Err(FcshError::ShellExited);
        };

        tracing::info!(
            workspace = %request.workspace_root.display(),
            debug = request.debug,
            "Compiling"
        );
        let (reply_tx, reply_rx) = oneshot::channel();
        shell
            .commands
            .send(DriverCommand::Compile {
                startup_command: request.startup_command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| FcshError::ShellExited)?;

        let timeout = self.settings.compile_timeout();
        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(FcshError::ShellExited),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Compiler shell did not respond, tearing it down"
                );
                if let Some(shell) = active.take() {
                    shell.shutdown().await;
                }
                Err(FcshError::Timeout { timeout })
            }
        }
    }

    /// Stop the shell if one is running and wait for it to exit.
    pub async fn shutdown(&self) {
        let shell = self.active.lock().await.take();
        if let Some(shell) = shell {
            shell.shutdown().await;
        }
    }

    fn spawn(&self, request: &CompileRequest, archive: PathBuf) -> Result<ActiveShell, FcshError> {
        let command = LaunchCommand::for_request(request);
        let (process, output) = match ProcessHandle::start(&self.launcher, &command) {
            Ok(started) => started,
            Err(e) => {
                self.state_tx.send_replace(SessionState::NotStarted);
                return Err(e);
            }
        };

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let driver = Driver {
            process,
            machine: ShellMachine::new(),
            classifier: OutputClassifier::new(),
            sink: Arc::clone(&self.sink),
            state_tx: Arc::clone(&self.state_tx),
            pending: None,
        };
        let handle = tokio::spawn(driver.run(
            output,
            commands_rx,
            self.settings.shutdown_timeout(),
        ));

        Ok(ActiveShell {
            archive,
            workspace: request.workspace_root.clone(),
            commands: commands_tx,
            driver: handle,
        })
    }
}

struct PendingCompile {
    reply: CompileReply,
    started: Instant,
}

/// Why the driver loop stopped.
enum Stop {
    /// stdout closed or failed: the shell is gone.
    Exited,
    /// The facade asked for shutdown.
    Requested,
}

struct Driver {
    process: ProcessHandle,
    machine: ShellMachine,
    classifier: OutputClassifier,
    sink: Arc<dyn OutputSink>,
    state_tx: Arc<watch::Sender<SessionState>>,
    pending: Option<PendingCompile>,
}

impl Driver {
    async fn run(
        mut self,
        output: ShellOutput,
        mut commands: mpsc::Receiver<DriverCommand>,
        shutdown_timeout: Duration,
    ) {
        let ShellOutput {
            mut stdout,
            mut stderr,
        } = output;
        let mut out_buf = vec![0u8; READ_BUFFER_BYTES];
        let mut err_buf = vec![0u8; READ_BUFFER_BYTES];
        let mut stderr_open = true;

        self.machine.spawned();
        self.publish_state();

        let stop = loop {
            // stderr first: error lines written before a prompt must be
            // classified before the prompt completes the command.
            tokio::select! {
                biased;
                read = stderr.read(&mut err_buf), if stderr_open => match read {
                    Ok(0) => stderr_open = false,
                    Ok(n) => {
                        let text = decode_latin1(&err_buf[..n]);
                        self.sink.append(&text);
                        let events = self.classifier.stderr(&text);
                        if !self.apply_events(events).await {
                            break Stop::Exited;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Compiler shell stderr read error: {e}");
                        stderr_open = false;
                    }
                },
                read = stdout.read(&mut out_buf) => match read {
                    Ok(0) => {
                        tracing::info!("Compiler shell closed stdout");
                        break Stop::Exited;
                    }
                    Ok(n) => {
                        let text = decode_latin1(&out_buf[..n]);
                        self.sink.append(&text);
                        let events = self.classifier.stdout(&text);
                        if !self.apply_events(events).await {
                            break Stop::Exited;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Compiler shell stdout read error: {e}");
                        break Stop::Exited;
                    }
                },
                command = commands.recv() => match command {
                    Some(DriverCommand::Compile { startup_command, reply }) => {
                        if !self.accept(&startup_command, reply).await {
                            break Stop::Exited;
                        }
                    }
                    Some(DriverCommand::Shutdown) | None => break Stop::Requested,
                },
            }
        };

        if matches!(stop, Stop::Requested) {
            if let Err(e) = self.process.terminate().await {
                tracing::debug!("Failed to send exit to compiler shell: {e}");
            }
            let sink = Arc::clone(&self.sink);
            let drained = tokio::time::timeout(shutdown_timeout, async {
                while let Ok(n) = stdout.read(&mut out_buf).await
                    && n > 0
                {
                    sink.append(&decode_latin1(&out_buf[..n]));
                }
            })
            .await;
            if drained.is_err() {
                tracing::debug!("Compiler shell kept writing after exit");
            }
        } else {
            let leftovers = self.classifier.finish();
            for event in leftovers {
                let _ = self.machine.on_event(event);
            }
        }

        if self.machine.exited()
            && let Some(pending) = self.pending.take()
        {
            let _ = pending.reply.send(Err(FcshError::ShellExited));
        }
        self.publish_state();
        self.process.reap(shutdown_timeout).await;
    }

    /// Hand a compile request to the state machine. Returns `false` if the
    /// shell could not be written to.
    async fn accept(&mut self, startup_command: &str, reply: CompileReply) -> bool {
        match self.machine.request_compile(startup_command) {
            Ok(actions) => {
                self.pending = Some(PendingCompile {
                    reply,
                    started: Instant::now(),
                });
                self.perform(actions).await
            }
            Err(Rejection::Busy) => {
                let _ = reply.send(Err(FcshError::Concurrency));
                true
            }
            Err(Rejection::NotStarted) => {
                let _ = reply.send(Err(FcshError::ShellExited));
                true
            }
        }
    }

    async fn apply_events(&mut self, events: Vec<OutputEvent>) -> bool {
        for event in events {
            let actions = self.machine.on_event(event);
            if !self.perform(actions).await {
                return false;
            }
        }
        true
    }

    async fn perform(&mut self, actions: Vec<Action>) -> bool {
        for action in actions {
            match action {
                Action::ClearLog => self.sink.clear(),
                Action::Send(line) => {
                    if let Err(e) = self.process.send(&line).await {
                        tracing::warn!("Failed to write to compiler shell: {e}");
                        if let Some(pending) = self.pending.take() {
                            let _ = pending.reply.send(Err(FcshError::Io(e)));
                        }
                        return false;
                    }
                }
                Action::Complete(outcome) => self.complete(outcome),
            }
        }
        self.publish_state();
        true
    }

    fn complete(&mut self, outcome: CompileOutcome) {
        let Some(pending) = self.pending.take() else {
            tracing::debug!("Command finished with no compile waiting");
            return;
        };
        let elapsed = pending.started.elapsed();
        let result = match outcome {
            CompileOutcome::Succeeded { target_id } => {
                tracing::info!(
                    target_id = target_id.as_deref().unwrap_or("-"),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Compile succeeded"
                );
                Ok(CompileReport::new(target_id, elapsed))
            }
            CompileOutcome::Failed { errors } => {
                tracing::info!(
                    errors = errors.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Compile failed"
                );
                Err(FcshError::CompileFailed { errors })
            }
        };
        let _ = pending.reply.send(result);
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.machine.state());
    }
}
