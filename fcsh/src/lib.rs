//! Session manager for the Flex compiler shell (fcsh).
//!
//! fcsh is a long-lived Java process that keeps compiled state between
//! builds. It speaks a human console protocol: it prints `(fcsh) ` when ready,
//! announces compile targets on stdout and reports errors on stderr. This
//! crate spawns and supervises the shell and turns that console text into a
//! single asynchronous [`FcshSession::compile`] operation.

pub mod classifier;
pub mod codec;
pub mod process;
pub mod state;
pub mod types;

mod error;
mod session;

pub use error::FcshError;
pub use process::{LaunchCommand, Launched, Launcher, TokioLauncher};
pub use session::FcshSession;
pub use types::{
    ARCHIVE_NAME, CompileReport, CompileRequest, FcshSettings, OutputSink, SessionState,
    TracingSink, fcsh_archive,
};
