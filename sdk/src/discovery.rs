//! Locate SDK installations and the Java runtime on this machine.

use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SdkError;
use crate::probe::{SdkInfo, probe};

/// Environment variables that conventionally point at an SDK home.
pub const HOME_VARS: [&str; 3] = ["ROYALE_HOME", "FLEX_HOME", "AIR_HOME"];

/// Executables whose presence in a `bin` directory on `PATH` marks an SDK.
const COMPILER_BINARIES: [&str; 2] = ["mxmlc", "asjsc"];

/// Places to look for SDKs, in priority order.
#[derive(Debug, Clone, Default)]
pub struct SdkSearch {
    configured: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    env_homes: Vec<PathBuf>,
    path_dirs: Vec<PathBuf>,
}

impl SdkSearch {
    #[must_use]
    pub fn new(configured: Option<PathBuf>, search_paths: Vec<PathBuf>) -> Self {
        Self {
            configured,
            search_paths,
            ..Self::default()
        }
    }

    /// Fill in the `*_HOME` variables and `PATH` from the process environment.
    #[must_use]
    pub fn from_environment(configured: Option<PathBuf>, search_paths: Vec<PathBuf>) -> Self {
        let env_homes = HOME_VARS
            .iter()
            .filter_map(env::var_os)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .collect();
        Self {
            configured,
            search_paths,
            env_homes,
            path_dirs: path_entries(env::var_os("PATH")),
        }
    }

    #[must_use]
    pub fn with_env_homes(mut self, homes: Vec<PathBuf>) -> Self {
        self.env_homes = homes;
        self
    }

    #[must_use]
    pub fn with_path_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.path_dirs = dirs;
        self
    }

    /// Candidate directories in the order they are probed. Search paths
    /// contribute themselves and their immediate subdirectories.
    #[must_use]
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        out.extend(self.configured.iter().cloned());
        for root in &self.search_paths {
            out.push(root.clone());
            out.extend(subdirectories(root));
        }
        out.extend(self.env_homes.iter().cloned());
        for dir in &self.path_dirs {
            let has_compiler = COMPILER_BINARIES.iter().any(|bin| {
                dir.join(bin).is_file() || dir.join(format!("{bin}.bat")).is_file()
            });
            if has_compiler && let Some(parent) = dir.parent() {
                out.push(parent.to_path_buf());
            }
        }
        out
    }

    /// Every valid SDK among the candidates, first occurrence wins.
    #[must_use]
    pub fn discover(&self) -> Vec<SdkInfo> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for candidate in self.candidates() {
            let key = fs::canonicalize(&candidate).unwrap_or_else(|_| candidate.clone());
            if !seen.insert(key) {
                continue;
            }
            match probe(&candidate) {
                Ok(sdk) => {
                    tracing::debug!(home = %candidate.display(), name = sdk.name(), "Found SDK");
                    found.push(sdk);
                }
                Err(e) => tracing::trace!(home = %candidate.display(), "Not an SDK: {e}"),
            }
        }
        found
    }

    /// The configured SDK if it is valid, otherwise the first discovered one.
    #[must_use]
    pub fn preferred(&self) -> Option<SdkInfo> {
        if let Some(configured) = &self.configured {
            match probe(configured) {
                Ok(sdk) => return Some(sdk),
                Err(e) => tracing::warn!("Configured SDK is unusable: {e}"),
            }
        }
        self.discover().into_iter().next()
    }
}

fn subdirectories(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn path_entries(path: Option<OsString>) -> Vec<PathBuf> {
    path.map(|p| env::split_paths(&p).collect())
        .unwrap_or_default()
}

/// Resolve the `java` executable: an explicit path, then `$JAVA_HOME/bin/java`,
/// then whatever `PATH` provides.
pub fn find_java(configured: Option<&Path>) -> Result<PathBuf, SdkError> {
    find_java_in(configured, env::var_os("JAVA_HOME").map(PathBuf::from))
}

fn find_java_in(configured: Option<&Path>, java_home: Option<PathBuf>) -> Result<PathBuf, SdkError> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "Configured Java executable does not exist");
    }
    if let Some(home) = java_home {
        let exe = if cfg!(windows) { "java.exe" } else { "java" };
        let candidate = home.join("bin").join(exe);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    which::which("java").map_err(|_| SdkError::JavaNotFound)
}
