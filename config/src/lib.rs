//! `~/.as3kit/config.toml`.
//!
//! ```toml
//! [sdk]
//! path = "${HOME}/sdks/flex-4.16.1"
//! search_paths = ["/opt/sdks"]
//!
//! [java]
//! path = "/usr/lib/jvm/java-17/bin/java"
//!
//! [fcsh]
//! compile_timeout_secs = 300
//! shutdown_timeout_secs = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use as3kit_fcsh::FcshSettings;
use as3kit_utils::{AtomicWriteOptions, atomic_write_with_options};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub sdk: Option<SdkConfig>,
    pub java: Option<JavaConfig>,
    pub fcsh: Option<FcshConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SdkConfig {
    /// Preferred SDK home.
    pub path: Option<String>,
    /// Directories whose children are scanned for SDKs.
    #[serde(default)]
    pub search_paths: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JavaConfig {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FcshConfig {
    pub compile_timeout_secs: Option<u64>,
    pub shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Replace `${VAR}` with the variable's value. Unset variables become empty;
/// an unclosed `${` is kept as written.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn expand_path(value: &str) -> Option<PathBuf> {
    let expanded = expand_env_vars(value);
    let trimmed = expanded.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

impl Config {
    /// Load the user configuration. `Ok(None)` when there is none.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn sdk_path(&self) -> Option<PathBuf> {
        self.sdk.as_ref()?.path.as_deref().and_then(expand_path)
    }

    #[must_use]
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.sdk
            .as_ref()
            .map(|s| s.search_paths.iter().map(String::as_str).filter_map(expand_path).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn java_path(&self) -> Option<PathBuf> {
        self.java.as_ref()?.path.as_deref().and_then(expand_path)
    }

    /// Session timeouts; unset or zero values fall back to the defaults.
    #[must_use]
    pub fn fcsh_settings(&self) -> FcshSettings {
        let defaults = FcshSettings::default();
        let Some(fcsh) = &self.fcsh else {
            return defaults;
        };
        let pick = |secs: Option<u64>, default: Duration| {
            secs.filter(|s| *s > 0).map_or(default, Duration::from_secs)
        };
        FcshSettings::new(
            pick(fcsh.compile_timeout_secs, defaults.compile_timeout()),
            pick(fcsh.shutdown_timeout_secs, defaults.shutdown_timeout()),
        )
    }

    /// Record `sdk` as the preferred SDK in the user configuration.
    pub fn persist_sdk(sdk: &Path) -> io::Result<()> {
        let path = config_path().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine config path")
        })?;
        persist_sdk_to(&path, sdk)
    }
}

/// Set `[sdk] path` in the file at `config`, keeping its comments and layout.
pub fn persist_sdk_to(config: &Path, sdk: &Path) -> io::Result<()> {
    if let Some(parent) = config.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = if config.exists() {
        fs::read_to_string(config)?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if !doc.contains_key("sdk") {
        doc["sdk"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let Some(table) = doc["sdk"].as_table_like_mut() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("`sdk` in {} is not a table", config.display()),
        ));
    };
    table.insert(
        "path",
        toml_edit::value(sdk.to_string_lossy().into_owned()),
    );

    atomic_write_with_options(
        config,
        doc.to_string().as_bytes(),
        AtomicWriteOptions {
            sync: true,
            ..AtomicWriteOptions::default()
        },
    )?;
    tracing::info!(sdk = %sdk.display(), "Saved preferred SDK");
    Ok(())
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".as3kit").join("config.toml"))
}
