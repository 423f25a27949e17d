use std::io;
use std::path::{Path, PathBuf};

use as3kit_utils::{AtomicWriteOptions, Existing, atomic_write_with_options};

use crate::asconfig::AsConfig;
use crate::error::ProjectError;

/// Write `config` as `<workspace>/asconfig.json`. An existing file is only
/// replaced when `overwrite` is set.
pub fn write_asconfig(
    workspace: &Path,
    config: &AsConfig,
    overwrite: bool,
) -> Result<PathBuf, ProjectError> {
    let path = AsConfig::path_in(workspace);
    let mut json = serde_json::to_string_pretty(config).map_err(|source| ProjectError::Json {
        path: path.clone(),
        source,
    })?;
    json.push('\n');

    let options = AtomicWriteOptions {
        existing: if overwrite {
            Existing::Replace
        } else {
            Existing::Keep
        },
        sync: true,
        ..AtomicWriteOptions::default()
    };
    atomic_write_with_options(&path, json.as_bytes(), options).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            ProjectError::AlreadyExists(path.clone())
        } else {
            ProjectError::io(&path, e)
        }
    })?;

    tracing::info!(path = %path.display(), "Wrote asconfig.json");
    Ok(path)
}
