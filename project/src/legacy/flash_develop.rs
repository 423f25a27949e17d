use std::path::Path;

use roxmltree::{Document, Node};

use super::{normalize, parse_bool, parse_xml, read_text};
use crate::asconfig::{AsConfig, CompilerOptions, ConfigName, Define, ProjectType};
use crate::error::ProjectError;

/// Descriptor FlashDevelop's AIR templates keep next to the project file.
const AIR_DESCRIPTOR: &str = "application.xml";

/// Convert a FlashDevelop `.as3proj` file.
pub fn convert_flash_develop(as3proj: &Path) -> Result<AsConfig, ProjectError> {
    let text = read_text(as3proj)?;
    let doc = parse_xml(as3proj, &text)?;
    let project_dir = as3proj.parent().unwrap_or_else(|| Path::new("."));

    // Every <movie>/<option> element carries a single attribute.
    let movie = |name: &str| section_attribute(&doc, "output", "movie", name);
    let option = |name: &str| section_attribute(&doc, "build", "option", name);

    let kind = match movie("outputType").unwrap_or("Application") {
        "Application" => ProjectType::App,
        "Library" => ProjectType::Lib,
        other => {
            return Err(ProjectError::Invalid(format!(
                "{}: output type `{other}` cannot be expressed in asconfig.json",
                as3proj.display()
            )));
        }
    };
    let config_name = match movie("platform").unwrap_or("Flash Player") {
        "AIR" => ConfigName::Air,
        "AIR Mobile" => ConfigName::Airmobile,
        _ => ConfigName::Flex,
    };

    let target_player = match (config_name, movie("version").filter(|v| !v.is_empty())) {
        (ConfigName::Flex, Some(major)) => Some(match movie("minorVersion") {
            Some(minor) if !minor.is_empty() => format!("{major}.{minor}"),
            _ => format!("{major}.0"),
        }),
        _ => None,
    };

    let define = option("compilerConstants")
        .into_iter()
        .flat_map(str::lines)
        .filter_map(|line| {
            let (name, value) = line.trim().split_once(',')?;
            Some(Define::new(name.trim(), value.trim()))
        })
        .collect();

    let options = CompilerOptions {
        source_path: paths(&doc, "classpaths", "class"),
        library_path: paths(&doc, "libraryPaths", "element"),
        external_library_path: paths(&doc, "externalLibraryPaths", "element"),
        include_libraries: paths(&doc, "includeLibraries", "element"),
        output: movie("path").filter(|p| !p.is_empty()).map(normalize),
        strict: option("strict").and_then(parse_bool),
        warnings: option("warnings").and_then(parse_bool),
        accessible: option("accessible").and_then(parse_bool),
        target_player,
        locale: option("locale")
            .filter(|l| !l.is_empty())
            .map(|l| vec![l.to_string()])
            .unwrap_or_default(),
        define,
        ..CompilerOptions::default()
    };

    let files = paths(&doc, "compileTargets", "compile");
    if kind == ProjectType::App && files.is_empty() {
        return Err(ProjectError::Invalid(format!(
            "{} has no compile target",
            as3proj.display()
        )));
    }

    let application = (config_name.is_air() && project_dir.join(AIR_DESCRIPTOR).is_file())
        .then(|| AIR_DESCRIPTOR.to_string());

    Ok(AsConfig {
        config: Some(config_name),
        kind,
        compiler_options: options,
        additional_options: option("additional")
            .into_iter()
            .flat_map(str::lines)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect(),
        files,
        main_class: None,
        application,
    })
}

fn section<'a, 'input>(doc: &'a Document<'input>, tag: &str) -> Option<Node<'a, 'input>> {
    doc.root_element().children().find(|n| n.has_tag_name(tag))
}

fn section_attribute<'a>(
    doc: &'a Document<'_>,
    section_tag: &str,
    item_tag: &str,
    name: &str,
) -> Option<&'a str> {
    section(doc, section_tag)?
        .children()
        .filter(|n| n.has_tag_name(item_tag))
        .find_map(|n| n.attribute(name))
}

fn paths(doc: &Document<'_>, section_tag: &str, item_tag: &str) -> Vec<String> {
    section(doc, section_tag)
        .map(|s| {
            s.children()
                .filter(|n| n.has_tag_name(item_tag))
                .filter_map(|n| n.attribute("path"))
                .map(normalize)
                .collect()
        })
        .unwrap_or_default()
}
