//! Keystone CLI - Main entry point

mod demo;

use anyhow::Context;
use clap::{Parser, Subcommand};
use keystone_core::{CompositeApplication, CompositeApplicationBuilder};
use keystone_foundation::{Settings, SettingsLoader};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Keystone - composite application host
#[derive(Parser, Debug)]
#[command(name = "keystone")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Settings file (JSON or TOML); defaults to the layered .keystone search paths
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the composition and drive it through start, run and stop
    Run {
        /// Stop right after run instead of waiting for Ctrl-C
        #[arg(long)]
        once: bool,
    },
    /// Build the composition and print its topology as JSON
    Topology,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings = load_settings(args.settings.as_deref())?;
    let plugins = demo::compose(&settings)?;

    let mut builder = CompositeApplicationBuilder::new(settings);
    builder.register_plugins(plugins)?;
    let mut app = builder.build().await.context("composition failed")?;

    match args.command.unwrap_or(Command::Run { once: false }) {
        Command::Topology => {
            println!("{}", app.composite_log().to_json()?);
            Ok(())
        }
        Command::Run { once } => {
            app.composite_log().emit()?;

            if let Err(err) = start_and_run(&mut app, once).await {
                error!(error = %err, "Startup failed, stopping started modules");
                if let Err(stop_err) = app.stop().await {
                    error!(error = %stop_err, "Stop after failed startup also failed");
                }
                return Err(err);
            }

            app.stop().await?;
            Ok(())
        }
    }
}

/// 설정 로드 - 명시된 파일 또는 기본 검색 경로
fn load_settings(path: Option<&std::path::Path>) -> anyhow::Result<Settings> {
    let working_dir = std::env::current_dir()?;
    let loader = SettingsLoader::new(&working_dir);

    let settings = match path {
        Some(path) => loader
            .load_from(path)
            .with_context(|| format!("cannot load settings from {}", path.display()))?,
        None => {
            let present = loader.present_layers();
            if present.is_empty() {
                debug!("No settings files found, using defaults");
            }
            loader.load_all()?
        }
    };
    Ok(settings)
}

async fn start_and_run(app: &mut CompositeApplication, once: bool) -> anyhow::Result<()> {
    app.start().await?;
    app.run().await?;

    if !once {
        info!("Application running, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
