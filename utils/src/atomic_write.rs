//! Atomic file write helpers.
//!
//! Writes go to a temp file in the destination directory which is then
//! renamed over the target, so readers (the language server watches
//! `asconfig.json`) never observe a half-written file. On Windows, rename over
//! an existing file fails, so a backup-and-restore fallback is used.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// What to do when the destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Existing {
    /// Replace it.
    #[default]
    Replace,
    /// Fail with `AlreadyExists`.
    Keep,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicWriteOptions {
    pub existing: Existing,
    /// `fsync` the temp file before it is renamed into place.
    pub sync: bool,
    /// Unix permission bits for the written file. Ignored elsewhere.
    pub unix_mode: Option<u32>,
}

pub fn atomic_write_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: AtomicWriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if options.sync {
        tmp.as_file().sync_all()?;
    }

    match options.existing {
        Existing::Keep => {
            tmp.persist_noclobber(path).map_err(|e| e.error)?;
        }
        Existing::Replace => {
            if let Err(err) = tmp.persist(path) {
                if !path.exists() {
                    return Err(err.error);
                }
                let backup = path.with_extension("bak");
                let _ = fs::remove_file(&backup);
                fs::rename(path, &backup)?;
                if let Err(retry) = err.file.persist(path) {
                    let _ = fs::rename(&backup, path);
                    return Err(retry.error);
                }
                if let Err(e) = fs::remove_file(&backup) {
                    tracing::warn!(
                        path = %backup.display(),
                        "Failed to remove .bak after atomic write: {e}"
                    );
                }
            }
        }
    }

    #[cfg(unix)]
    if let Some(mode) = options.unix_mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote file atomically");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;

    use super::{AtomicWriteOptions, Existing, atomic_write_with_options};

    #[test]
    fn atomic_write_overwrites_existing_and_cleans_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("asconfig.json");

        let replace = AtomicWriteOptions::default();
        atomic_write_with_options(&path, b"one", replace).expect("write one");
        atomic_write_with_options(&path, b"two", replace).expect("write two");

        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        assert!(!path.with_extension("bak").exists());
    }

    #[test]
    fn keep_refuses_to_replace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("asconfig.json");
        let keep = AtomicWriteOptions {
            existing: Existing::Keep,
            ..AtomicWriteOptions::default()
        };

        atomic_write_with_options(&path, b"first", keep).expect("create");
        let err = atomic_write_with_options(&path, b"second", keep).expect_err("must not clobber");

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).expect("read"), "first");
    }

    #[cfg(unix)]
    #[test]
    fn applies_unix_permissions_when_configured() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let opts = AtomicWriteOptions {
            unix_mode: Some(0o600),
            ..AtomicWriteOptions::default()
        };

        atomic_write_with_options(&path, b"[sdk]", opts).expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
