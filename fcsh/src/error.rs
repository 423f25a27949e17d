use std::path::PathBuf;
use std::time::Duration;

/// Failure of a compile request.
#[derive(Debug, thiserror::Error)]
pub enum FcshError {
    /// The SDK has no compiler shell archive. Nothing was spawned.
    #[error("compiler shell archive not found: {}", path.display())]
    Configuration { path: PathBuf },

    /// The operating system refused to start the shell.
    #[error("failed to start compiler shell with {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    /// The shell reported errors on stderr. It stays alive for reuse.
    #[error("compilation failed with {} error(s)", errors.len())]
    CompileFailed { errors: Vec<String> },

    /// Another compile is still outstanding against this session.
    #[error("previous operation not yet complete")]
    Concurrency,

    /// The shell did not print its prompt in time and was torn down.
    #[error("compiler shell did not respond within {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    /// The shell exited before the command finished.
    #[error("compiler shell exited unexpectedly")]
    ShellExited,

    #[error("compiler shell I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FcshError {
    /// Error lines reported by the compiler, if this is a compile failure.
    #[must_use]
    pub fn compiler_errors(&self) -> &[String] {
        match self {
            Self::CompileFailed { errors } => errors,
            _ => &[],
        }
    }
}
