//! Converters for Flash Builder and FlashDevelop project files.

mod flash_builder;
mod flash_develop;

use std::fs;
use std::path::{Path, PathBuf};

use crate::asconfig::AsConfig;
use crate::error::ProjectError;

pub use flash_builder::convert_flash_builder;
pub use flash_develop::convert_flash_develop;

use flash_builder::PROPERTIES_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKind {
    FlashBuilder,
    FlashDevelop,
}

impl LegacyKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FlashBuilder => "Flash Builder",
            Self::FlashDevelop => "FlashDevelop",
        }
    }
}

/// A project file that can be turned into `asconfig.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyProject {
    kind: LegacyKind,
    path: PathBuf,
}

impl LegacyProject {
    #[must_use]
    pub fn kind(&self) -> LegacyKind {
        self.kind
    }

    /// The `.actionScriptProperties` or `.as3proj` file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn convert(&self) -> Result<AsConfig, ProjectError> {
        tracing::info!(
            kind = self.kind.label(),
            path = %self.path.display(),
            "Converting legacy project"
        );
        match self.kind {
            LegacyKind::FlashBuilder => {
                let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
                convert_flash_builder(dir)
            }
            LegacyKind::FlashDevelop => convert_flash_develop(&self.path),
        }
    }
}

/// Convertible project files directly inside `workspace`. Flash Builder
/// comes first, FlashDevelop projects follow in name order.
pub fn detect_legacy_projects(workspace: &Path) -> Result<Vec<LegacyProject>, ProjectError> {
    let mut found = Vec::new();

    let properties = workspace.join(PROPERTIES_FILE);
    if properties.is_file() {
        found.push(LegacyProject {
            kind: LegacyKind::FlashBuilder,
            path: properties,
        });
    }

    let entries = fs::read_dir(workspace).map_err(|e| ProjectError::io(workspace, e))?;
    let mut as3proj: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "as3proj"))
        .collect();
    as3proj.sort();
    found.extend(as3proj.into_iter().map(|path| LegacyProject {
        kind: LegacyKind::FlashDevelop,
        path,
    }));

    Ok(found)
}

fn read_text(path: &Path) -> Result<String, ProjectError> {
    fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))
}

fn parse_xml<'a>(path: &Path, text: &'a str) -> Result<roxmltree::Document<'a>, ProjectError> {
    roxmltree::Document::parse(text).map_err(|source| ProjectError::Xml {
        path: path.to_path_buf(),
        source,
    })
}

/// Both tools write `true`/`True`; anything else is treated as unset.
fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_both_project_kinds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROPERTIES_FILE), "<actionScriptProperties/>").unwrap();
        fs::write(dir.path().join("b.as3proj"), "<project/>").unwrap();
        fs::write(dir.path().join("a.as3proj"), "<project/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let found = detect_legacy_projects(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec![".actionScriptProperties", "a.as3proj", "b.as3proj"]);
        assert_eq!(found[0].kind(), LegacyKind::FlashBuilder);
        assert_eq!(found[1].kind(), LegacyKind::FlashDevelop);
    }

    #[test]
    fn empty_workspace_has_nothing_to_convert() {
        let dir = tempfile::tempdir().unwrap();
        assert!(detect_legacy_projects(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn bool_parsing_is_case_insensitive() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
