//! Log file setup. Console output belongs to the compiler, so diagnostics go
//! to `~/.as3kit/logs/as3kit.log` and only reach stderr when no log file can
//! be opened.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use as3kit_config::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE: &str = "as3kit.log";

pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file() -> (Option<(PathBuf, File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(config_path) = Config::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join(LOG_FILE));
    }

    candidates.push(PathBuf::from(".as3kit").join("logs").join(LOG_FILE));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_fallback_is_last() {
        let candidates = log_file_candidates();
        assert_eq!(
            candidates.last(),
            Some(&PathBuf::from(".as3kit").join("logs").join("as3kit.log"))
        );
    }
}
