//! `as3kit build`: compile through a long-lived fcsh session.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use as3kit_fcsh::{CompileRequest, FcshError, FcshSession, OutputSink};
use as3kit_project::{AsConfig, compiler_command};
use as3kit_sdk::SdkInfo;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::Context;

/// Writes shell output to stdout as it arrives.
#[derive(Debug, Default)]
struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn append(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn clear(&self) {
        tracing::debug!("Starting new compiler command");
    }
}

pub async fn run(ctx: &Context, release: bool, watch: bool) -> Result<()> {
    let sdk = ctx.sdk()?;
    let java = ctx.java()?;
    let session = FcshSession::new(Arc::new(ConsoleSink), ctx.config.fcsh_settings());

    let mut result = build_once(&session, ctx, &sdk, &java, release).await;
    report(&result);

    if watch {
        eprintln!("Press Enter to rebuild, Ctrl-D to stop.");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while lines.next_line().await?.is_some() {
            result = build_once(&session, ctx, &sdk, &java, release).await;
            report(&result);
        }
    }

    session.shutdown().await;
    if result.is_err() {
        bail!("build failed");
    }
    Ok(())
}

/// Print the outcome of a build as soon as it is known.
fn report(result: &Result<()>) {
    if let Err(err) = result {
        eprint!("{}", failure_report(err));
    }
}

/// The error followed by each compiler error line.
fn failure_report(err: &anyhow::Error) -> String {
    let mut out = format!("error: {err:#}\n");
    if let Some(fcsh) = err.downcast_ref::<FcshError>() {
        for line in fcsh.compiler_errors() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Re-reads `asconfig.json` so edits between watch iterations take effect.
async fn build_once(
    session: &FcshSession,
    ctx: &Context,
    sdk: &SdkInfo,
    java: &Path,
    release: bool,
) -> Result<()> {
    let config = AsConfig::load(&ctx.workspace)?;
    let request = CompileRequest {
        workspace_root: ctx.workspace.clone(),
        java: java.to_path_buf(),
        sdk_home: sdk.home().to_path_buf(),
        debug: !release,
        startup_command: compiler_command(&config, &ctx.workspace, !release)?,
    };
    tracing::info!(command = %request.startup_command, sdk = sdk.name(), "Building");

    match session.compile(request).await {
        Ok(report) => {
            eprintln!(
                "Build succeeded in {:.1}s",
                report.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(FcshError::Configuration { path }) => bail!(
            "{} ({}) has no compiler shell at {}",
            sdk.name(),
            sdk.home().display(),
            path.display()
        ),
        Err(err) => Err(err.into()),
    }
}
