//! Render an [`AsConfig`] as the command line fcsh is started with.

use std::path::Path;

use crate::asconfig::AsConfig;
use crate::error::ProjectError;

/// Build the `mxmlc`/`compc` command for `config`. `debug` overrides the
/// `debug` compiler option so one project can produce both builds.
pub fn compiler_command(
    config: &AsConfig,
    workspace: &Path,
    debug: bool,
) -> Result<String, ProjectError> {
    let mut args: Vec<String> = Vec::new();
    args.push(if config.is_library() { "compc" } else { "mxmlc" }.to_string());

    if let Some(name) = config.config.filter(|c| c.is_air()) {
        args.push(format!("+configname={}", name.as_str()));
    }
    args.push(format!("-debug={debug}"));

    let opts = &config.compiler_options;
    push_list(&mut args, "source-path", &opts.source_path);
    push_list(&mut args, "library-path", &opts.library_path);
    push_list(&mut args, "external-library-path", &opts.external_library_path);
    push_list(&mut args, "include-libraries", &opts.include_libraries);
    if let Some(output) = &opts.output {
        args.push(format!("-output={}", quote(output)));
    }
    push_flag(&mut args, "strict", opts.strict);
    push_flag(&mut args, "warnings", opts.warnings);
    push_flag(&mut args, "accessible", opts.accessible);
    if let Some(player) = &opts.target_player {
        args.push(format!("-target-player={player}"));
    }
    for locale in &opts.locale {
        args.push(format!("-locale+={locale}"));
    }
    for define in &opts.define {
        args.push(format!("-define+={},{}", define.name, define.rendered_value()));
    }
    push_list(&mut args, "include-sources", &opts.include_sources);
    for class in &opts.include_classes {
        args.push(format!("-include-classes+={class}"));
    }

    args.extend(
        config
            .additional_options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(ToString::to_string),
    );

    if !config.is_library() {
        let main = config.main_file(workspace).ok_or_else(|| {
            ProjectError::Invalid("application project needs `files` or `mainClass`".into())
        })?;
        args.push(quote(&main));
    }

    Ok(args.join(" "))
}

fn push_list(args: &mut Vec<String>, key: &str, values: &[String]) {
    for value in values {
        args.push(format!("-{key}+={}", quote(value)));
    }
}

fn push_flag(args: &mut Vec<String>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        args.push(format!("-{key}={value}"));
    }
}

fn quote(value: &str) -> String {
    if value.contains(' ') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
