//! platform-installer - renders Kubernetes manifests for platform components.
//!
//! This is the main entry point that:
//! - Initializes structured logging (JSON, on stderr)
//! - Loads the installer config and builds the render context
//! - Renders every registered component and prints the manifests to stdout

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use platform_installer::components::default_registry;
use platform_installer::{InstallerConfig, RenderMode, manifest};

const DEFAULT_LOG_FILTER: &str = "platform_installer=info";

#[derive(Parser, Debug)]
#[command(
    name = "platform-installer",
    version,
    about = "Render Kubernetes manifests for platform components"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render all component manifests as a multi-document YAML stream.
    Render(RenderArgs),

    /// Render all components and report every error without printing manifests.
    Validate(ContextArgs),
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Path to the installer config file.
    #[arg(short, long)]
    config: PathBuf,

    /// Namespace to render into (overrides the config file).
    #[arg(short, long)]
    namespace: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    context: ContextArgs,

    /// Keep rendering after a component fails and report all failures.
    #[arg(long)]
    collect_errors: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the manifests
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => {
            let mode = if args.collect_errors {
                RenderMode::CollectAll
            } else {
                RenderMode::FailFast
            };
            let yaml = render(&args.context, mode)?;
            std::io::stdout().write_all(yaml.as_bytes())?;
        }
        Command::Validate(args) => {
            render(&args, RenderMode::CollectAll)?;
            info!("All components rendered successfully");
        }
    }

    Ok(())
}

/// Log filter taken from `RUST_LOG`, falling back to info for this crate.
///
/// A user-supplied directive replaces the default entirely, so
/// `RUST_LOG=platform_installer=debug` enables debug output.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn render(args: &ContextArgs, mode: RenderMode) -> platform_installer::Result<String> {
    let config = InstallerConfig::load(&args.config)?;
    let ctx = config.into_context(args.namespace.clone());
    info!(
        namespace = ctx.namespace(),
        config = %args.config.display(),
        "Rendering manifests"
    );

    let registry = default_registry()?;
    let objects = registry.render(&ctx, mode).inspect_err(|e| {
        error!(error = %e, "Rendering failed");
    })?;

    manifest::to_yaml(&objects)
}
