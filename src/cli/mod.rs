//! Command line interface for the post-build hooks.
//!
//! This module turns arguments and the project configuration into a
//! [`BuildContext`], dispatches the requested lifecycle event, and maps the
//! resulting report to an exit code.

mod args;

pub use args::{Args, Command};

use crate::{
    config::ProjectConfig,
    context::{BuildContext, BuildContextBuilder, Platform, resolve_path},
    error::{CliError, Context, PipelineError, Result},
    firmware::{self, ProvisionResult, Verification},
    invoker::SystemInvoker,
    lifecycle::{self, EXIT_COMMAND_FAILED, EXIT_FATAL, EXIT_OK, LifecycleEvent, Orchestrator},
};
use std::path::PathBuf;
use std::time::Duration;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args).await
}

/// Run already-parsed arguments.
pub async fn execute(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    match &args.command {
        Command::Verify { image } => verify(image, args.json).await,
        Command::Targets => targets(&args),
        Command::Provision => provision(&args).await,
        Command::PreUpload => dispatch(&args, LifecycleEvent::PreUpload, None).await,
        Command::PostUpload { image } => {
            dispatch(&args, LifecycleEvent::PostUpload, image.clone()).await
        }
        Command::PostClean => dispatch(&args, LifecycleEvent::PostClean, None).await,
        Command::Package => dispatch(&args, LifecycleEvent::Package, None).await,
    }
}

/// Build the context: file values first, then flag/env overrides.
pub fn build_context(args: &Args) -> Result<BuildContext> {
    let (project_dir, config) = load_config(args)?;
    let mut builder = config.apply(&project_dir, BuildContextBuilder::new());

    if let Some(platform) = &args.platform {
        builder = builder.platform(Platform::from_name(platform));
    }
    if let Some(board) = &args.board {
        builder = builder.board(board);
    }
    if let Some(variant) = &args.variant {
        builder = builder.variant(variant);
    }
    if let Some(port) = &args.upload_port {
        builder = builder.upload_port(port);
    }
    if let Some(dir) = &args.build_dir {
        builder = builder.build_dir(resolve_path(&project_dir, dir));
    }
    if let Some(dir) = &args.core_dir {
        builder = builder.core_dir(resolve_path(&project_dir, dir));
    }
    if let Some(dir) = &args.packages_dir {
        builder = builder.packages_dir(resolve_path(&project_dir, dir));
    }
    if let Some(dir) = &args.release_dir {
        builder = builder.release_dir(resolve_path(&project_dir, dir));
    }
    if let Some(secs) = args.settle_delay {
        builder = builder.settle_delay(Duration::from_secs(secs));
    }
    if let Some(tool) = &args.provisioning_tool {
        builder = builder.provisioning_tool(tool);
    }

    let mut features = config.features;
    features.enable_provisioning |= args.enable_provisioning;
    features.enable_post_upload_packaging |= args.enable_post_upload_packaging;
    if let Some(policy) = args.hash_policy {
        features.hash_policy = policy;
    }
    if let Some(dest) = args.archive_destination {
        features.archive_destination = dest;
    }

    builder.features(features).build()
}

fn load_config(args: &Args) -> Result<(PathBuf, ProjectConfig)> {
    let project_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine working directory")?,
    };
    let config = match &args.config {
        Some(path) => ProjectConfig::load(&resolve_path(&project_dir, path))?,
        None => ProjectConfig::discover(&project_dir)?,
    };
    Ok((project_dir, config))
}

async fn dispatch(args: &Args, event: LifecycleEvent, image: Option<PathBuf>) -> Result<i32> {
    let ctx = build_context(args)?;
    let mut orchestrator = Orchestrator::new(ctx, SystemInvoker);
    if let Some(image) = image {
        orchestrator = orchestrator.with_image(image);
    }

    let report = orchestrator.dispatch(event).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if let Some(pkg) = &report.package {
        log::info!("✓ Package: {}", pkg.archive.display());
    }

    Ok(report.exit_code())
}

async fn verify(image: &std::path::Path, json: bool) -> Result<i32> {
    let verification = match firmware::verify_file(image).await {
        Ok(v) => v,
        Err(e @ PipelineError::MalformedImage { .. }) => {
            log::error!("{}", e);
            return Ok(EXIT_FATAL);
        }
        Err(e) => return Err(e),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&verification)?);
    }

    match verification {
        Verification::Verified { hash_hex } => {
            log::info!("✓ Firmware hash verified: {}", hash_hex);
            Ok(EXIT_OK)
        }
        Verification::Unverified {
            computed_hex,
            embedded_hex,
        } => {
            log::warn!(
                "Firmware hash not verified: computed {}, footer {}",
                computed_hex,
                embedded_hex
            );
            Ok(EXIT_FATAL)
        }
    }
}

async fn provision(args: &Args) -> Result<i32> {
    let ctx = build_context(args)?;
    let result = firmware::provision(&ctx, &SystemInvoker).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(match result {
        ProvisionResult::Issued { outcome } if !outcome.success => EXIT_COMMAND_FAILED,
        ProvisionResult::NoUploadPort => EXIT_FATAL,
        _ => EXIT_OK,
    })
}

fn targets(args: &Args) -> Result<i32> {
    let platform = match &args.platform {
        Some(p) => Platform::from_name(p),
        None => {
            let (_, config) = load_config(args)?;
            config
                .project
                .platform
                .map(|p| Platform::from_name(&p))
                .ok_or_else(|| CliError::MissingArgument {
                    argument: "platform".to_string(),
                })?
        }
    };

    let targets = lifecycle::custom_targets(&platform);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
    } else {
        for target in &targets {
            println!(
                "{}\t{}\t{}\t{}",
                target.name, target.dependency, target.title, target.description
            );
        }
    }
    Ok(EXIT_OK)
}
