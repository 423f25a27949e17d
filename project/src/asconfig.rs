//! The `asconfig.json` project model.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProjectError;

pub const ASCONFIG_FILE: &str = "asconfig.json";

/// Which compiler configuration (`+configname`) a project builds against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigName {
    Flex,
    Air,
    Airmobile,
    Royale,
}

impl ConfigName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flex => "flex",
            Self::Air => "air",
            Self::Airmobile => "airmobile",
            Self::Royale => "royale",
        }
    }

    #[must_use]
    pub fn is_air(self) -> bool {
        matches!(self, Self::Air | Self::Airmobile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    App,
    Lib,
}

/// A `-define` conditional compilation constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Define {
    pub name: String,
    pub value: serde_json::Value,
}

impl Define {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// `value` as the compiler expects it after the comma.
    #[must_use]
    pub fn rendered_value(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompilerOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_library_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_libraries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_player: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locale: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub define: Vec<Define>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_classes: Vec<String>,
}

impl CompilerOptions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Contents of `asconfig.json`. Unknown keys such as `extends` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigName>,
    #[serde(rename = "type", default)]
    pub kind: ProjectType,
    #[serde(default, skip_serializing_if = "CompilerOptions::is_empty")]
    pub compiler_options: CompilerOptions,
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub additional_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
}

fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.trim().is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

impl AsConfig {
    /// Read `<workspace>/asconfig.json`. Comments are allowed.
    pub fn load(workspace: &Path) -> Result<Self, ProjectError> {
        let path = workspace.join(ASCONFIG_FILE);
        let text = fs::read_to_string(&path).map_err(|e| ProjectError::io(&path, e))?;
        Self::parse(&text).map_err(|source| ProjectError::Json { path, source })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&strip_comments(text))
    }

    #[must_use]
    pub fn is_air(&self) -> bool {
        self.config.is_some_and(ConfigName::is_air)
    }

    #[must_use]
    pub fn is_library(&self) -> bool {
        self.kind == ProjectType::Lib
    }

    /// Directory the main class is resolved against.
    #[must_use]
    pub fn source_root(&self) -> &str {
        self.compiler_options
            .source_path
            .first()
            .map_or(".", |s| s.trim_end_matches('/'))
    }

    /// The file handed to the compiler: the last of `files`, or `mainClass`
    /// resolved under the first source path (`.mxml` if present, else `.as`).
    #[must_use]
    pub fn main_file(&self, workspace: &Path) -> Option<String> {
        if let Some(file) = self.files.last() {
            return Some(file.clone());
        }
        let class = self.main_class.as_deref()?;
        let relative = class.replace('.', "/");
        let stem = match self.source_root() {
            "." | "" => relative,
            root => format!("{root}/{relative}"),
        };
        let mxml = format!("{stem}.mxml");
        if workspace.join(&mxml).is_file() {
            Some(mxml)
        } else {
            Some(format!("{stem}.as"))
        }
    }

    /// Base name of the main class, used to name outputs.
    #[must_use]
    pub fn main_name(&self) -> Option<String> {
        if let Some(class) = &self.main_class {
            return class.rsplit('.').next().map(ToString::to_string);
        }
        let file = self.files.last()?;
        Path::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    }

    /// AIR application descriptor: `application`, or `<root>/<Main>-app.xml`.
    #[must_use]
    pub fn application_descriptor(&self) -> Option<String> {
        if let Some(app) = &self.application {
            return Some(app.clone());
        }
        if !self.is_air() {
            return None;
        }
        let name = self.main_name()?;
        Some(match self.source_root() {
            "." | "" => format!("{name}-app.xml"),
            root => format!("{root}/{name}-app.xml"),
        })
    }

    /// Compiled SWF (or SWC) path relative to the workspace.
    #[must_use]
    pub fn output_path(&self) -> Option<String> {
        if let Some(output) = &self.compiler_options.output {
            return Some(output.clone());
        }
        let name = self.main_name()?;
        let ext = if self.is_library() { "swc" } else { "swf" };
        Some(format!("bin/{name}.{ext}"))
    }

    #[must_use]
    pub fn path_in(workspace: &Path) -> PathBuf {
        workspace.join(ASCONFIG_FILE)
    }
}

/// Remove `//` and `/* */` comments outside string literals. Newlines inside
/// comments are kept so parse errors still point at the right line.
pub(crate) fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    if c == '\n' {
                        out.push('\n');
                    }
                    prev = c;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        // main application
        "config": "airmobile",
        "compilerOptions": {
            "source-path": ["src/"],
            "library-path": ["libs"],
            "output": "bin/Game.swf", /* trailing */
            "define": [{"name": "CONFIG::debug", "value": true}]
        },
        "additionalOptions": "-swf-version=40",
        "mainClass": "com.example.Game",
        "extends": "base.json",
        "application": "src/Game-app.xml"
    }"#;

    #[test]
    fn parse_commented_asconfig() {
        let config = AsConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.config, Some(ConfigName::Airmobile));
        assert_eq!(config.kind, ProjectType::App);
        assert_eq!(config.compiler_options.source_path, vec!["src/"]);
        assert_eq!(config.additional_options, vec!["-swf-version=40"]);
        assert_eq!(config.compiler_options.define[0].rendered_value(), "true");
        assert!(config.is_air());
    }

    #[test]
    fn additional_options_accepts_list() {
        let config = AsConfig::parse(r#"{"additionalOptions": ["-a", "-b"]}"#).unwrap();
        assert_eq!(config.additional_options, vec!["-a", "-b"]);
        let empty = AsConfig::parse(r#"{"additionalOptions": "  "}"#).unwrap();
        assert!(empty.additional_options.is_empty());
    }

    #[test]
    fn strip_comments_keeps_strings_intact() {
        let text = "{\"url\": \"http://example.com/*x*/\", // gone\n\"a\": 1 /* x\ny */}";
        assert_eq!(
            strip_comments(text),
            "{\"url\": \"http://example.com/*x*/\", \n\"a\": 1 \n}"
        );
        assert_eq!(strip_comments(r#""a\"//b""#), r#""a\"//b""#);
    }

    #[test]
    fn main_file_prefers_mxml_when_present() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/com/example")).unwrap();
        let config = AsConfig::parse(SAMPLE).unwrap();

        assert_eq!(
            config.main_file(dir.path()).as_deref(),
            Some("src/com/example/Game.as")
        );

        fs::write(dir.path().join("src/com/example/Game.mxml"), "").unwrap();
        assert_eq!(
            config.main_file(dir.path()).as_deref(),
            Some("src/com/example/Game.mxml")
        );
    }

    #[test]
    fn files_win_over_main_class() {
        let config = AsConfig {
            files: vec!["src/A.as".into(), "src/Main.as".into()],
            main_class: Some("Other".into()),
            ..AsConfig::default()
        };
        assert_eq!(
            config.main_file(Path::new(".")).as_deref(),
            Some("src/Main.as")
        );
        assert_eq!(config.main_name().as_deref(), Some("Other"));
    }

    #[test]
    fn derived_paths() {
        let config = AsConfig {
            config: Some(ConfigName::Air),
            compiler_options: CompilerOptions {
                source_path: vec!["src".into()],
                ..CompilerOptions::default()
            },
            main_class: Some("Main".into()),
            ..AsConfig::default()
        };
        assert_eq!(
            config.application_descriptor().as_deref(),
            Some("src/Main-app.xml")
        );
        assert_eq!(config.output_path().as_deref(), Some("bin/Main.swf"));

        let flash = AsConfig {
            config: Some(ConfigName::Flex),
            ..config
        };
        assert_eq!(flash.application_descriptor(), None);
    }

    #[test]
    fn serialization_omits_empty_sections() {
        let config = AsConfig {
            main_class: Some("Main".into()),
            ..AsConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({"type": "app", "mainClass": "Main"}));
    }

    #[test]
    fn load_reports_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AsConfig::load(dir.path()),
            Err(ProjectError::MissingFile(_))
        ));

        fs::write(dir.path().join(ASCONFIG_FILE), "{ \"config\": ").unwrap();
        assert!(matches!(
            AsConfig::load(dir.path()),
            Err(ProjectError::Json { .. })
        ));
    }
}
