mod aggregator;
mod config;
mod dashboard;
mod fetch;
mod filter;
mod format;
mod models;
mod parser;
mod render;
mod sort;
mod timeline;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Logs go to stderr so the rendered dashboard owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!("Launch dashboard starting...");

    let cfg = config::load()?;
    info!("  API URL: {}", cfg.api_url);
    info!("  Proxies: {:?}", cfg.proxies);
    info!("  Chart: {} ({})", cfg.chart_metric, cfg.chart_mode);
    info!("  Sort key: {}", cfg.sort_key);

    let dashboard_handle = tokio::spawn(dashboard::run(cfg));

    tokio::select! {
        res = dashboard_handle => match res {
            Ok(Ok(_)) => info!("Dashboard exited cleanly"),
            Ok(Err(e)) => error!("Dashboard error: {:?}", e),
            Err(e) => error!("Dashboard task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Launch dashboard stopped.");
    Ok(())
}
