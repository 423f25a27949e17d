//! ActionScript SDK discovery.
//!
//! An SDK is a directory carrying one of the Flex, AIR or Royale description
//! files. [`probe`] validates a single directory; [`SdkSearch`] walks the
//! usual places (configuration, search roots, `*_HOME` variables, `PATH`).

mod discovery;
mod error;
mod probe;

pub use discovery::{HOME_VARS, SdkSearch, find_java};
pub use error::SdkError;
pub use probe::{SdkInfo, SdkKind, probe};
