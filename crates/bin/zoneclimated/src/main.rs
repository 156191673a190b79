use anyhow::Context;
use tracing_subscriber::EnvFilter;

use zoneclimated::Daemon;
use zoneclimated::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(config.log_filter())
        .with_context(|| format!("invalid log filter {:?}", config.log_filter()))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let daemon = Daemon::assemble(&config).await;
    tracing::info!(
        zones = daemon.registry.active_zones(),
        "zoneclimated started"
    );

    let host = std::sync::Arc::clone(&daemon.host);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        zoneclimated::console::run(&*host, stdin).await;
    });

    daemon
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(%err, "cannot listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("zoneclimated stopped");
    Ok(())
}
