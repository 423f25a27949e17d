//! Build tasks and debug launch configurations derived from `asconfig.json`.
//!
//! Both are plain serialisable records; an editor or the CLI decides how to
//! present or run them.

use std::path::Path;

use as3kit_project::{ASCONFIG_FILE, AsConfig, ConfigName, ProjectError, compiler_command};
use as3kit_sdk::SdkInfo;
use serde::Serialize;

pub const TASK_TYPE: &str = "actionscript";
pub const DEBUG_TYPE: &str = "swf";

pub const COMPILE_DEBUG: &str = "compile debug";
pub const COMPILE_RELEASE: &str = "compile release";
pub const PACKAGE_RELEASE: &str = "package release";

/// Environment variable naming the signing keystore for AIR packages.
pub const KEYSTORE_VAR: &str = "AIR_KEYSTORE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDefinition {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub debug: bool,
    pub asconfig: String,
    pub command: String,
}

impl TaskDefinition {
    fn new(label: &str, debug: bool, command: String) -> Self {
        Self {
            label: label.to_string(),
            kind: TASK_TYPE,
            debug,
            asconfig: ASCONFIG_FILE.to_string(),
            command,
        }
    }
}

/// Tasks for a workspace. Without an SDK nothing can be built, so the list is
/// empty.
pub fn provide_tasks(
    workspace: &Path,
    config: &AsConfig,
    sdk: Option<&SdkInfo>,
) -> Result<Vec<TaskDefinition>, ProjectError> {
    let Some(sdk) = sdk else {
        tracing::debug!("No SDK available; no tasks provided");
        return Ok(Vec::new());
    };

    let mut tasks = vec![
        TaskDefinition::new(COMPILE_DEBUG, true, compiler_command(config, workspace, true)?),
        TaskDefinition::new(
            COMPILE_RELEASE,
            false,
            compiler_command(config, workspace, false)?,
        ),
    ];

    if config.is_air() && !config.is_library() {
        if let Some(command) = package_command(config, sdk) {
            tasks.push(TaskDefinition::new(PACKAGE_RELEASE, false, command));
        } else {
            tracing::warn!("AIR project without a main class or output; skipping package task");
        }
    }
    Ok(tasks)
}

/// `adt` invocation that packages the release SWF with its descriptor.
fn package_command(config: &AsConfig, sdk: &SdkInfo) -> Option<String> {
    let descriptor = config.application_descriptor()?;
    let swf = config.output_path()?;
    let swf_path = Path::new(&swf);
    let out_dir = swf_path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());
    let swf_name = swf_path.file_name()?.to_string_lossy().into_owned();
    let stem = swf_path.file_stem()?.to_string_lossy().into_owned();

    let (target, ext) = match config.config {
        Some(ConfigName::Airmobile) => ("apk-captive-runtime", "apk"),
        _ => ("air", "air"),
    };
    let adt = sdk.home().join("bin").join("adt");

    Some(format!(
        "\"{}\" -package -storetype pkcs12 -keystore ${KEYSTORE_VAR} -target {target} \
         {out_dir}/{stem}.{ext} {descriptor} -C {out_dir} {swf_name}",
        adt.display()
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfiguration {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub request: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_launch_task: Option<String>,
}

impl LaunchConfiguration {
    #[must_use]
    pub fn attach() -> Self {
        Self {
            kind: DEBUG_TYPE,
            request: "attach",
            name: "Attach SWF".to_string(),
            program: None,
            profile: None,
            pre_launch_task: None,
        }
    }
}

/// Launch configurations for the project plus a generic attach entry.
/// Libraries cannot be launched and only get the attach entry.
#[must_use]
pub fn provide_debug_configurations(config: &AsConfig) -> Vec<LaunchConfiguration> {
    let mut out = Vec::new();

    let program = if config.is_library() {
        None
    } else if config.is_air() {
        config.application_descriptor()
    } else {
        config.output_path()
    };

    if let Some(program) = program {
        let (name, profile) = match config.config {
            Some(ConfigName::Airmobile) => ("Launch AIR mobile", Some("mobileDevice")),
            Some(ConfigName::Air) => ("Launch AIR desktop", None),
            _ => ("Launch SWF", None),
        };
        out.push(LaunchConfiguration {
            kind: DEBUG_TYPE,
            request: "launch",
            name: name.to_string(),
            program: Some(program),
            profile,
            pre_launch_task: Some(COMPILE_DEBUG.to_string()),
        });
    }

    out.push(LaunchConfiguration::attach());
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use as3kit_project::{CompilerOptions, ProjectType};

    use super::*;

    fn sdk(dir: &Path) -> SdkInfo {
        fs::write(
            dir.join("air-sdk-description.xml"),
            "<air-sdk-description><name>AIR</name><version>50.2</version></air-sdk-description>",
        )
        .unwrap();
        as3kit_sdk::probe(dir).unwrap()
    }

    fn air_app(config: ConfigName) -> AsConfig {
        AsConfig {
            config: Some(config),
            compiler_options: CompilerOptions {
                source_path: vec!["src".into()],
                output: Some("bin/Main.swf".into()),
                ..CompilerOptions::default()
            },
            main_class: Some("Main".into()),
            ..AsConfig::default()
        }
    }

    #[test]
    fn no_sdk_means_no_tasks() {
        let config = air_app(ConfigName::Air);
        assert!(provide_tasks(Path::new("."), &config, None).unwrap().is_empty());
    }

    #[test]
    fn flash_project_gets_compile_tasks_only() {
        let dir = tempfile::tempdir().unwrap();
        let sdk = sdk(dir.path());
        let config = air_app(ConfigName::Flex);

        let tasks = provide_tasks(dir.path(), &config, Some(&sdk)).unwrap();
        let labels: Vec<_> = tasks.iter().map(|t| t.label.as_str()).collect();

        assert_eq!(labels, vec![COMPILE_DEBUG, COMPILE_RELEASE]);
        assert!(tasks[0].debug);
        assert!(tasks[0].command.contains("-debug=true"));
        assert!(tasks[1].command.contains("-debug=false"));
        assert_eq!(tasks[0].asconfig, "asconfig.json");
    }

    #[test]
    fn air_project_can_be_packaged() {
        let dir = tempfile::tempdir().unwrap();
        let sdk = sdk(dir.path());

        let tasks = provide_tasks(dir.path(), &air_app(ConfigName::Air), Some(&sdk)).unwrap();
        assert_eq!(tasks.len(), 3);
        let package = &tasks[2];
        assert_eq!(package.label, PACKAGE_RELEASE);
        assert!(package.command.contains("-target air bin/Main.air src/Main-app.xml -C bin Main.swf"));

        let mobile =
            provide_tasks(dir.path(), &air_app(ConfigName::Airmobile), Some(&sdk)).unwrap();
        assert!(mobile[2].command.contains("-target apk-captive-runtime bin/Main.apk"));
    }

    #[test]
    fn task_serializes_with_type_key() {
        let task = TaskDefinition::new(COMPILE_DEBUG, true, "mxmlc".into());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "actionscript");
        assert_eq!(json["label"], "compile debug");
    }

    #[test]
    fn flash_launch_uses_output_or_default() {
        let mut config = air_app(ConfigName::Flex);
        let configs = provide_debug_configurations(&config);
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].program.as_deref(), Some("bin/Main.swf"));
        assert_eq!(configs[0].pre_launch_task.as_deref(), Some(COMPILE_DEBUG));
        assert_eq!(configs[1], LaunchConfiguration::attach());

        config.compiler_options.output = None;
        config.main_class = Some("com.example.Game".into());
        let configs = provide_debug_configurations(&config);
        assert_eq!(configs[0].program.as_deref(), Some("bin/Game.swf"));
    }

    #[test]
    fn air_mobile_launch_uses_descriptor_and_profile() {
        let configs = provide_debug_configurations(&air_app(ConfigName::Airmobile));
        assert_eq!(configs[0].program.as_deref(), Some("src/Main-app.xml"));
        assert_eq!(configs[0].profile, Some("mobileDevice"));

        let json = serde_json::to_value(&configs[0]).unwrap();
        assert_eq!(json["preLaunchTask"], "compile debug");
        assert_eq!(json["request"], "launch");
    }

    #[test]
    fn library_only_gets_attach() {
        let config = AsConfig {
            kind: ProjectType::Lib,
            ..air_app(ConfigName::Flex)
        };
        assert_eq!(
            provide_debug_configurations(&config),
            vec![LaunchConfiguration::attach()]
        );
    }
}
