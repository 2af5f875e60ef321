use anyhow::{Context, Result};
use clap::Parser;
use limitwatch::account_usage::fetcher::FetchEnv;
use limitwatch::account_usage::status::AggregationMode;
use limitwatch::config::ConfigState;
use limitwatch::display::{render_json, render_text};
use limitwatch::paths::resolve_config_path;
use limitwatch::scheduler::{RefreshScheduler, RefreshView};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "limitwatch")]
#[command(about = "Shows how close your AI provider accounts are to their limits")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("LIMITWATCH_GIT_SHA"), ")"))]
struct Cli {
    /// Config file (defaults to $LIMITWATCH_CONFIG, then ~/.limitwatch/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep refreshing until interrupted
    #[arg(short, long)]
    watch: bool,

    /// Seconds between refreshes in watch mode (defaults to the config value)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Override the configured aggregation: worst or average
    #[arg(long)]
    aggregation: Option<AggregationMode>,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "limitwatch=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_view(mut view: RefreshView, cli: &Cli) -> Result<()> {
    if let Some(mode) = cli.aggregation {
        view.display.aggregation = mode;
    }
    if cli.json {
        println!("{}", render_json(&view).context("Failed to serialize report")?);
    } else {
        print!("{}", render_text(&view, chrono::Utc::now()));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.clone())?;
    tracing::debug!(path = %config_path.display(), "using config");
    let scheduler = Arc::new(RefreshScheduler::new(
        config_path.clone(),
        FetchEnv::production(),
    ));

    if !cli.watch {
        let view = scheduler
            .try_refresh()
            .await
            .context("Refresh did not run")?;
        return print_view(view, &cli);
    }

    let interval_secs = cli
        .interval
        .unwrap_or_else(|| ConfigState::load(&config_path).refresh_interval_secs);
    let interval = Duration::from_secs(interval_secs.max(1));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut stop = shutdown_rx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut views = scheduler.subscribe();
    let runner = Arc::clone(&scheduler);
    let loop_handle = tokio::spawn(async move { runner.run(interval, shutdown_rx).await });

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                print_view(view, &cli)?;
            }
            _ = stop.changed() => break,
        }
    }
    loop_handle.await.context("Refresh loop panicked")?;
    Ok(())
}
