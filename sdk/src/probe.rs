//! Recognise an SDK installation from its description file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SdkError;

/// Description files, in the order they are checked.
const DESCRIPTIONS: [(&str, SdkKind); 3] = [
    ("royale-sdk-description.xml", SdkKind::Royale),
    ("flex-sdk-description.xml", SdkKind::Flex),
    ("air-sdk-description.xml", SdkKind::Air),
];

/// Family of an SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkKind {
    Flex,
    Air,
    Royale,
    Feathers,
}

impl SdkKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Flex => "Apache Flex",
            Self::Air => "Adobe AIR",
            Self::Royale => "Apache Royale",
            Self::Feathers => "Feathers SDK",
        }
    }
}

/// A validated SDK installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdkInfo {
    home: PathBuf,
    kind: SdkKind,
    name: String,
    version: String,
    build: Option<String>,
}

impl SdkInfo {
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    #[must_use]
    pub fn kind(&self) -> SdkKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// `version` plus the build number when the SDK records one.
    #[must_use]
    pub fn full_version(&self) -> String {
        match &self.build {
            Some(build) => format!("{} build {build}", self.version),
            None => self.version.clone(),
        }
    }

    /// Location of the compiler shell archive inside this SDK.
    #[must_use]
    pub fn fcsh_archive(&self) -> PathBuf {
        as3kit_fcsh::fcsh_archive(&self.home)
    }

    /// Whether this SDK ships the compiler shell.
    #[must_use]
    pub fn has_fcsh(&self) -> bool {
        self.fcsh_archive().is_file()
    }
}

/// Check whether `path` is an SDK and read its description.
pub fn probe(path: &Path) -> Result<SdkInfo, SdkError> {
    if !path.is_dir() {
        return Err(SdkError::NotADirectory(path.to_path_buf()));
    }

    let (file, kind) = DESCRIPTIONS
        .iter()
        .map(|(file, kind)| (path.join(file), *kind))
        .find(|(file, _)| file.is_file())
        .ok_or_else(|| SdkError::MissingDescription(path.to_path_buf()))?;

    let text = fs::read_to_string(&file).map_err(|source| SdkError::Io {
        path: file.clone(),
        source,
    })?;
    let doc = roxmltree::Document::parse(&text).map_err(|source| SdkError::Xml {
        path: file.clone(),
        source,
    })?;
    let root = doc.root_element();
    let child_text = |tag: &str| {
        root.children()
            .find(|n| n.has_tag_name(tag))
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
    };

    let version = child_text("version").ok_or_else(|| SdkError::MissingElement {
        path: file.clone(),
        element: "version",
    })?;
    let build = child_text("build").filter(|b| b != "0");
    let name = match (kind, child_text("name")) {
        (_, Some(name)) => name,
        (SdkKind::Air, None) => format!("Adobe AIR SDK {version}"),
        (_, None) => {
            return Err(SdkError::MissingElement {
                path: file,
                element: "name",
            });
        }
    };
    let kind = if kind == SdkKind::Flex && name.contains("Feathers") {
        SdkKind::Feathers
    } else {
        kind
    };

    Ok(SdkInfo {
        home: path.to_path_buf(),
        kind,
        name,
        version,
        build,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_flex_sdk(home: &Path, name: &str, with_fcsh: bool) {
        fs::create_dir_all(home.join("lib")).unwrap();
        fs::write(
            home.join("flex-sdk-description.xml"),
            format!(
                "<?xml version=\"1.0\"?>\n<flex-sdk-description>\n<name>{name}</name>\n\
                 <version>4.16.1</version>\n<build>20171226</build>\n</flex-sdk-description>\n"
            ),
        )
        .unwrap();
        if with_fcsh {
            fs::write(home.join("lib").join("fcsh.jar"), b"PK").unwrap();
        }
    }

    #[test]
    fn test_probe_flex_sdk() {
        let dir = tempfile::tempdir().unwrap();
        write_flex_sdk(dir.path(), "Apache Flex 4.16.1 FP 32.0 AIR 32.0 en_US", true);

        let sdk = probe(dir.path()).unwrap();
        assert_eq!(sdk.kind(), SdkKind::Flex);
        assert_eq!(sdk.name(), "Apache Flex 4.16.1 FP 32.0 AIR 32.0 en_US");
        assert_eq!(sdk.full_version(), "4.16.1 build 20171226");
        assert!(sdk.has_fcsh());
    }

    #[test]
    fn test_probe_feathers_sdk_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_flex_sdk(dir.path(), "Feathers SDK 4.1.0", false);

        let sdk = probe(dir.path()).unwrap();
        assert_eq!(sdk.kind(), SdkKind::Feathers);
        assert!(!sdk.has_fcsh());
    }

    #[test]
    fn test_probe_air_sdk_without_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("air-sdk-description.xml"),
            "<air-sdk-description><version>33.1.1</version><build>575</build></air-sdk-description>",
        )
        .unwrap();

        let sdk = probe(dir.path()).unwrap();
        assert_eq!(sdk.kind(), SdkKind::Air);
        assert_eq!(sdk.name(), "Adobe AIR SDK 33.1.1");
        assert_eq!(sdk.build(), Some("575"));
    }

    #[test]
    fn test_probe_royale_wins_over_flex() {
        let dir = tempfile::tempdir().unwrap();
        write_flex_sdk(dir.path(), "Apache Flex", false);
        fs::write(
            dir.path().join("royale-sdk-description.xml"),
            "<royale-sdk-description><name>Apache Royale 0.9.10</name>\
             <version>0.9.10</version><build>0</build></royale-sdk-description>",
        )
        .unwrap();

        let sdk = probe(dir.path()).unwrap();
        assert_eq!(sdk.kind(), SdkKind::Royale);
        assert_eq!(sdk.full_version(), "0.9.10");
    }

    #[test]
    fn test_sdk_info_serializes_for_listing() {
        let dir = tempfile::tempdir().unwrap();
        write_flex_sdk(dir.path(), "Apache Flex", false);

        let value = serde_json::to_value(probe(dir.path()).unwrap()).unwrap();
        assert_eq!(value["kind"], "flex");
        assert_eq!(value["version"], "4.16.1");
    }

    #[test]
    fn test_probe_rejects_plain_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            probe(dir.path()),
            Err(SdkError::MissingDescription(_))
        ));
        assert!(matches!(
            probe(&dir.path().join("missing")),
            Err(SdkError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_probe_reports_malformed_description() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("flex-sdk-description.xml"), "<flex-sdk-description>").unwrap();
        assert!(matches!(probe(dir.path()), Err(SdkError::Xml { .. })));
    }

    #[test]
    fn test_probe_requires_version() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("flex-sdk-description.xml"),
            "<flex-sdk-description><name>Apache Flex</name></flex-sdk-description>",
        )
        .unwrap();
        assert!(matches!(
            probe(dir.path()),
            Err(SdkError::MissingElement {
                element: "version",
                ..
            })
        ));
    }
}
