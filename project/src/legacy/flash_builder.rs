use std::fs;
use std::path::Path;

use roxmltree::Node;

use super::{normalize, parse_bool, parse_xml, read_text};
use crate::asconfig::{AsConfig, CompilerOptions, ConfigName, ProjectType};
use crate::error::ProjectError;

pub(crate) const PROPERTIES_FILE: &str = ".actionScriptProperties";
const LIB_PROPERTIES_FILE: &str = ".flexLibProperties";

/// `kind` of a library path entry that stands for the SDK itself.
const SDK_ENTRY_KIND: &str = "4";
/// `linkType` of a library linked externally.
const EXTERNAL_LINK_TYPE: &str = "2";

/// Convert a Flash Builder project rooted at `project_dir`.
pub fn convert_flash_builder(project_dir: &Path) -> Result<AsConfig, ProjectError> {
    let path = project_dir.join(PROPERTIES_FILE);
    let text = read_text(&path)?;
    let doc = parse_xml(&path, &text)?;
    let root = doc.root_element();

    let compiler = child(root, "compiler").ok_or_else(|| {
        ProjectError::Invalid(format!("{} has no <compiler> element", path.display()))
    })?;

    let source_folder = compiler
        .attribute("sourceFolderPath")
        .filter(|s| !s.is_empty())
        .map_or_else(|| "src".to_string(), normalize);
    let output_folder = compiler
        .attribute("outputFolderPath")
        .filter(|s| !s.is_empty())
        .map_or_else(|| "bin-debug".to_string(), normalize);

    let mut options = CompilerOptions {
        source_path: vec![source_folder.clone()],
        strict: compiler.attribute("strict").and_then(parse_bool),
        warnings: compiler.attribute("warn").and_then(parse_bool),
        accessible: compiler.attribute("generateAccessible").and_then(parse_bool),
        target_player: compiler
            .attribute("targetPlayerVersion")
            .filter(|v| !v.is_empty() && *v != "0.0.0")
            .map(ToString::to_string),
        ..CompilerOptions::default()
    };

    if let Some(entries) = child(compiler, "compilerSourcePath") {
        options.source_path.extend(
            children(entries, "compilerSourcePathEntry")
                .filter_map(|e| e.attribute("path"))
                .map(normalize),
        );
    }

    // Only direct entries: the SDK entry nests its own excluded entries.
    if let Some(entries) = child(compiler, "libraryPath") {
        for entry in children(entries, "libraryPathEntry") {
            if entry.attribute("kind") == Some(SDK_ENTRY_KIND) {
                continue;
            }
            let Some(lib) = entry.attribute("path").filter(|p| !p.is_empty()) else {
                continue;
            };
            if entry.attribute("linkType") == Some(EXTERNAL_LINK_TYPE) {
                options.external_library_path.push(normalize(lib));
            } else {
                options.library_path.push(normalize(lib));
            }
        }
    }

    let air = compiler.attribute("useApolloConfig").and_then(parse_bool) == Some(true);
    let mobile = child(root, "buildTargets").is_some_and(|targets| {
        children(targets, "buildTarget")
            .filter_map(|t| t.attribute("platformId"))
            .any(|id| id.contains(".ios.") || id.contains(".android."))
    });

    let mut config = AsConfig {
        config: Some(match (air, mobile) {
            (true, true) => ConfigName::Airmobile,
            (true, false) => ConfigName::Air,
            (false, _) => ConfigName::Flex,
        }),
        additional_options: compiler
            .attribute("additionalCompilerArguments")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| vec![a.to_string()])
            .unwrap_or_default(),
        ..AsConfig::default()
    };

    let lib_path = project_dir.join(LIB_PROPERTIES_FILE);
    if lib_path.is_file() {
        config.kind = ProjectType::Lib;
        let lib_text = read_text(&lib_path)?;
        let lib_doc = parse_xml(&lib_path, &lib_text)?;
        if let Some(classes) = child(lib_doc.root_element(), "includeClasses") {
            options.include_classes.extend(
                children(classes, "classEntry")
                    .filter_map(|e| e.attribute("path"))
                    .map(ToString::to_string),
            );
        }
        options.output = Some(format!("{output_folder}/{}.swc", project_name(project_dir)));
    } else {
        let main = root
            .attribute("mainApplicationPath")
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                ProjectError::Invalid(format!("{} has no mainApplicationPath", path.display()))
            })?;
        let main = normalize(main);
        let stem = Path::new(&main)
            .file_stem()
            .map_or_else(|| main.clone(), |s| s.to_string_lossy().into_owned());
        options.output = Some(format!("{output_folder}/{stem}.swf"));
        config.files = vec![format!("{source_folder}/{main}")];

        if air {
            let descriptor = format!("{source_folder}/{stem}-app.xml");
            if project_dir.join(&descriptor).is_file() {
                config.application = Some(descriptor);
            }
        }
    }

    config.compiler_options = options;
    Ok(config)
}

fn project_name(project_dir: &Path) -> String {
    fs::canonicalize(project_dir)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "library".to_string())
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(tag))
}
