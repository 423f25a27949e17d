//! Public types consumed by build front ends.
//!
//! Callers construct a [`CompileRequest`] per build, provide an
//! [`OutputSink`] for progress text, and receive a [`CompileReport`].

use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the compiler shell archive inside an SDK's `lib` directory.
pub const ARCHIVE_NAME: &str = "fcsh.jar";

const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 300;

const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Location of the compiler shell archive for an SDK.
#[must_use]
pub fn fcsh_archive(sdk_home: &Path) -> PathBuf {
    sdk_home.join("lib").join(ARCHIVE_NAME)
}

/// One build invocation.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Working directory for the shell.
    pub workspace_root: PathBuf,
    /// Java executable used to run the shell archive.
    pub java: PathBuf,
    /// SDK installation the shell archive is loaded from.
    pub sdk_home: PathBuf,
    /// Whether this is a debug build.
    pub debug: bool,
    /// Compiler invocation (`mxmlc ...` / `compc ...`) that creates the
    /// compile target on first use.
    pub startup_command: String,
}

impl CompileRequest {
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        fcsh_archive(&self.sdk_home)
    }
}

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    target_id: Option<String>,
    elapsed: Duration,
}

impl CompileReport {
    pub(crate) fn new(target_id: Option<String>, elapsed: Duration) -> Self {
        Self { target_id, elapsed }
    }

    /// Compile-target id the shell will reuse for the next build.
    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Lifecycle state of the compiler shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    NotStarted,
    Starting,
    AwaitingCommand,
    Busy,
}

impl SessionState {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Starting => "starting",
            Self::AwaitingCommand => "awaiting command",
            Self::Busy => "busy",
        }
    }
}

/// Timeouts applied by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FcshSettings {
    compile_timeout: Duration,
    shutdown_timeout: Duration,
}

impl Default for FcshSettings {
    fn default() -> Self {
        Self {
            compile_timeout: Duration::from_secs(DEFAULT_COMPILE_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl FcshSettings {
    #[must_use]
    pub fn new(compile_timeout: Duration, shutdown_timeout: Duration) -> Self {
        Self {
            compile_timeout,
            shutdown_timeout,
        }
    }

    /// How long a compile may wait for the shell's prompt.
    #[must_use]
    pub fn compile_timeout(&self) -> Duration {
        self.compile_timeout
    }

    /// How long a terminating shell may take to exit before it is killed.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

/// Append-only destination for shell output shown to the user.
pub trait OutputSink: Send + Sync {
    /// Append raw shell text exactly as received.
    fn append(&self, text: &str);

    /// Discard previously appended text before a new command.
    fn clear(&self);
}

/// Sink that forwards shell output to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn append(&self, text: &str) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "fcsh", "{line}");
        }
    }

    fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_lives_under_lib() {
        let request = CompileRequest {
            workspace_root: PathBuf::from("/ws"),
            java: PathBuf::from("java"),
            sdk_home: PathBuf::from("/sdks/flex"),
            debug: true,
            startup_command: "mxmlc src/Main.mxml".to_string(),
        };
        assert_eq!(
            request.archive_path(),
            PathBuf::from("/sdks/flex").join("lib").join("fcsh.jar")
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = FcshSettings::default();
        assert_eq!(settings.compile_timeout(), Duration::from_secs(300));
        assert_eq!(settings.shutdown_timeout(), Duration::from_secs(5));
    }
}
