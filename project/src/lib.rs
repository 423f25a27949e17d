//! ActionScript project model.
//!
//! Everything revolves around `asconfig.json`: loading it, turning it into
//! the command fcsh compiles, and producing one from the project files older
//! IDEs left behind.

mod asconfig;
mod command;
mod error;
mod legacy;
mod write;

pub use asconfig::{
    ASCONFIG_FILE, AsConfig, CompilerOptions, ConfigName, Define, ProjectType,
};
pub use command::compiler_command;
pub use error::ProjectError;
pub use legacy::{
    LegacyKind, LegacyProject, convert_flash_builder, convert_flash_develop,
    detect_legacy_projects,
};
pub use write::write_asconfig;
