//! as3kit CLI: SDK discovery, project conversion and fcsh builds.
//!
//! ```text
//! main() -> Args::parse() -> Context::load() -> subcommand
//!                                  |
//!                                  v
//!                  config.toml + SDK search + asconfig.json
//! ```

mod build;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use as3kit_config::Config;
use as3kit_project::{AsConfig, compiler_command, detect_legacy_projects, write_asconfig};
use as3kit_sdk::{SdkInfo, SdkSearch, find_java, probe};
use as3kit_tasks::{provide_debug_configurations, provide_tasks};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version, about)]
struct Args {
    /// Project directory containing asconfig.json.
    #[clap(long, short = 'w', default_value = ".", global = true)]
    workspace: PathBuf,

    /// SDK to use instead of the configured or discovered one.
    #[clap(long, env = "AS3KIT_SDK", global = true)]
    sdk: Option<PathBuf>,

    /// Java executable used to run the compiler shell.
    #[clap(long, global = true)]
    java: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List SDKs found on this machine.
    Sdks {
        #[clap(long)]
        json: bool,
    },
    /// Remember an SDK as the default in ~/.as3kit/config.toml.
    UseSdk { path: PathBuf },
    /// Create asconfig.json from a Flash Builder or FlashDevelop project.
    Convert {
        #[clap(long)]
        overwrite: bool,
    },
    /// Print build tasks as JSON.
    Tasks,
    /// Print debug launch configurations as JSON.
    LaunchConfigs,
    /// Print the compiler command fcsh is started with.
    Command {
        #[clap(long)]
        release: bool,
    },
    /// Compile the project through the compiler shell.
    Build {
        #[clap(long)]
        release: bool,
        /// Keep the shell running and rebuild on every line read from stdin.
        #[clap(long)]
        watch: bool,
    },
}

/// Settings resolved once per invocation.
pub(crate) struct Context {
    pub(crate) workspace: PathBuf,
    pub(crate) config: Config,
    sdk_override: Option<PathBuf>,
    java_override: Option<PathBuf>,
}

impl Context {
    fn load(args: &Args) -> Result<Self> {
        let config = Config::load()?.unwrap_or_default();
        Ok(Self {
            workspace: args.workspace.clone(),
            config,
            sdk_override: args.sdk.clone(),
            java_override: args.java.clone(),
        })
    }

    fn search(&self) -> SdkSearch {
        SdkSearch::from_environment(self.config.sdk_path(), self.config.search_paths())
    }

    /// The SDK to build with: `--sdk`, then configuration, then discovery.
    pub(crate) fn sdk(&self) -> Result<SdkInfo> {
        if let Some(path) = &self.sdk_override {
            return probe(path).with_context(|| format!("invalid SDK {}", path.display()));
        }
        self.search().preferred().context(
            "no SDK found; pass --sdk, set FLEX_HOME or ROYALE_HOME, or run `as3kit use-sdk`",
        )
    }

    fn optional_sdk(&self) -> Option<SdkInfo> {
        match self.sdk() {
            Ok(sdk) => Some(sdk),
            Err(err) => {
                tracing::warn!("{err:#}");
                None
            }
        }
    }

    pub(crate) fn java(&self) -> Result<PathBuf> {
        let configured = self.java_override.clone().or_else(|| self.config.java_path());
        Ok(find_java(configured.as_deref())?)
    }

    fn asconfig(&self) -> Result<AsConfig> {
        Ok(AsConfig::load(&self.workspace)?)
    }
}

fn list_sdks(ctx: &Context, json: bool) -> Result<()> {
    let sdks = ctx.search().discover();
    if json {
        println!("{}", serde_json::to_string_pretty(&sdks)?);
        return Ok(());
    }
    if sdks.is_empty() {
        bail!("no SDKs found");
    }
    for sdk in &sdks {
        let fcsh = if sdk.has_fcsh() { "fcsh" } else { "no fcsh" };
        println!(
            "{}\t{}\t{}\t{fcsh}\t{}",
            sdk.kind().label(),
            sdk.name(),
            sdk.full_version(),
            sdk.home().display()
        );
    }
    Ok(())
}

fn use_sdk(path: &Path) -> Result<()> {
    let sdk = probe(path).with_context(|| format!("invalid SDK {}", path.display()))?;
    let home = std::fs::canonicalize(sdk.home()).unwrap_or_else(|_| sdk.home().to_path_buf());
    Config::persist_sdk(&home).context("failed to update config.toml")?;
    println!("Default SDK: {} ({})", sdk.name(), home.display());
    Ok(())
}

fn convert(ctx: &Context, overwrite: bool) -> Result<()> {
    let projects = detect_legacy_projects(&ctx.workspace)?;
    let Some(project) = projects.first() else {
        bail!(
            "no Flash Builder or FlashDevelop project in {}",
            ctx.workspace.display()
        );
    };
    if projects.len() > 1 {
        tracing::info!(
            count = projects.len(),
            "Several legacy projects found; converting the first"
        );
    }
    let config = project.convert()?;
    let path = write_asconfig(&ctx.workspace, &config, overwrite)
        .context("pass --overwrite to replace an existing asconfig.json")?;
    println!(
        "Converted {} project {} to {}",
        project.kind().label(),
        project.path().display(),
        path.display()
    );
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let ctx = Context::load(&args)?;
    match args.command {
        Command::Sdks { json } => list_sdks(&ctx, json),
        Command::UseSdk { path } => use_sdk(&path),
        Command::Convert { overwrite } => convert(&ctx, overwrite),
        Command::Tasks => {
            let config = ctx.asconfig()?;
            let sdk = ctx.optional_sdk();
            let tasks = provide_tasks(&ctx.workspace, &config, sdk.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
            Ok(())
        }
        Command::LaunchConfigs => {
            let configs = provide_debug_configurations(&ctx.asconfig()?);
            println!("{}", serde_json::to_string_pretty(&configs)?);
            Ok(())
        }
        Command::Command { release } => {
            let config = ctx.asconfig()?;
            println!("{}", compiler_command(&config, &ctx.workspace, !release)?);
            Ok(())
        }
        Command::Build { release, watch } => build::run(&ctx, release, watch).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_tracing();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_flags() {
        let args = Args::try_parse_from(["as3kit", "build", "--release", "--watch", "-w", "game"])
            .unwrap();
        assert_eq!(args.workspace, PathBuf::from("game"));
        assert!(matches!(
            args.command,
            Command::Build {
                release: true,
                watch: true
            }
        ));
    }

    #[test]
    fn workspace_defaults_to_current_dir() {
        let args = Args::try_parse_from(["as3kit", "launch-configs"]).unwrap();
        assert_eq!(args.workspace, PathBuf::from("."));
        assert!(matches!(args.command, Command::LaunchConfigs));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Args::try_parse_from(["as3kit", "deploy"]).is_err());
    }

    #[test]
    fn explicit_sdk_must_be_valid() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            workspace: dir.path().to_path_buf(),
            config: Config::default(),
            sdk_override: Some(dir.path().to_path_buf()),
            java_override: None,
        };
        let err = ctx.sdk().unwrap_err();
        assert!(format!("{err:#}").contains("invalid SDK"));
    }

    #[test]
    fn convert_requires_a_legacy_project() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            workspace: dir.path().to_path_buf(),
            config: Config::default(),
            sdk_override: None,
            java_override: None,
        };
        assert!(convert(&ctx, false).is_err());
    }
}
