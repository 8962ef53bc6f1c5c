use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iocraft::prelude::*;

use deploy_board::app::{App, ViewKind};
use deploy_board::config::loader;
use deploy_board::engine::{ApiEngine, Engine, StubEngine};
use deploy_board::theme::ResolvedTheme;
use deploy_board::toast::ToastQueue;

#[derive(Parser)]
#[command(name = "deploy-board", version, about = "Deployment dashboard for the terminal")]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging to debug.log.
    #[arg(long)]
    debug: bool,

    /// Serve built-in demo data instead of calling the API.
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start in the services view.
    Services,
    /// Start in the deployments view.
    Deployments {
        /// Only show deployments of this service id.
        #[arg(long)]
        service: Option<String>,
    },
}

fn main() -> Result<()> {
    // Install a panic hook that writes to a file, since the fullscreen TUI
    // swallows stderr.
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("{info}\n\n{backtrace}");
        let _ = std::fs::write("panic.log", &msg);
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::File::create("debug.log").context("creating debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    let config = loader::load_config(cli.config.as_deref())?;
    let theme = ResolvedTheme::resolve(&config.theme.colors);
    let toasts = ToastQueue::new(Duration::from_secs(config.defaults.toast_ttl_secs));

    let (initial_view, initial_service) = match cli.command {
        Some(Commands::Services) => (Some(ViewKind::Services), None),
        Some(Commands::Deployments { service }) => (Some(ViewKind::Deployments), service),
        None => (None, None),
    };

    // The engine owns a single-threaded runtime on its own OS thread.
    // Dropping `engine_handle` at the end of `main` stops it.
    let (engine_handle, project_id) = if cli.demo {
        (StubEngine::demo().start()?, StubEngine::DEMO_PROJECT.to_owned())
    } else {
        let project_id = config
            .api
            .project_id
            .clone()
            .context("no project configured: set api.project_id or run with --demo")?;
        (ApiEngine::new(config.api.clone()).start()?, project_id)
    };

    tracing::info!("deploy-board starting for project {project_id}");

    // Enter fullscreen TUI (iocraft uses smol internally).
    smol::block_on(
        element! {
            App(
                config: &config,
                engine: &engine_handle,
                theme: &theme,
                toasts: &toasts,
                project_id: project_id.as_str(),
                initial_view,
                initial_service,
            )
        }
        .fullscreen(),
    )?;

    Ok(())
}
