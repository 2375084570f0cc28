use bin_ledger::config::Config;
use bin_ledger::engine::simulation::{RandomAccretion, run_simulation};
use bin_ledger::error::AppError;
use bin_ledger::notify::Notification;
use bin_ledger::state::AppState;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let (app_state, notification_rx) = AppState::open(&config).await?;

    if config.seed_defaults {
        app_state.ledger.seed_defaults().await?;
    }

    tokio::spawn(log_notifications(notification_rx));

    let source = match config.simulation_seed {
        Some(seed) => RandomAccretion::seeded(seed),
        None => RandomAccretion::from_entropy(),
    };
    let simulation = tokio::spawn(run_simulation(
        app_state.ledger.clone(),
        source,
        config.simulation_interval,
    ));

    tracing::info!(
        interval_secs = config.simulation_interval.as_secs(),
        "bin ledger running"
    );

    shutdown_signal().await;
    simulation.abort();

    match app_state.ledger.metrics.encode() {
        Ok(snapshot) => tracing::info!(metrics = %snapshot, "final metrics"),
        Err(err) => tracing::warn!(error = %err, "failed to encode metrics"),
    }

    Ok(())
}

async fn log_notifications(rx: broadcast::Receiver<Notification>) {
    let mut stream = BroadcastStream::new(rx);

    while let Some(item) = stream.next().await {
        match item {
            Ok(notification) => tracing::info!(
                kind = ?notification.kind,
                bin_id = notification.bin_id.as_deref().unwrap_or("-"),
                title = %notification.title,
                "{}",
                notification.body
            ),
            Err(err) => tracing::warn!(error = %err, "notification stream lagged"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
