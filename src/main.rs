use anyhow::Result;
use evse_connector::config::Config;
use evse_connector::logging::{get_logger, init_logging};
use evse_connector::notify::{ChannelNotifier, ConnectorObserver};
use evse_connector::persistence::PersistenceManager;
use evse_connector::scheduler::TokioScheduler;
use evse_connector::station::{ResumeOutcome, Station};
use evse_connector::types::Reason;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    config.validate()?;

    init_logging(&config.logging)?;
    info!(
        "EVSE connector {} starting up",
        env!("APP_VERSION")
    );

    let store = Arc::new(PersistenceManager::new(&config.persistence.state_file));
    if let Err(e) = store.load() {
        error!("Ignoring unreadable state file: {}", e);
    }

    let scheduler = Arc::new(TokioScheduler::from_current()?);
    let station = Station::from_config(&config, scheduler, store)?;

    let (notifier, mut updates) = ChannelNotifier::channel(config.notification_capacity);
    let notifier: Arc<dyn ConnectorObserver> = Arc::new(notifier);
    station.attach_observer(&notifier);

    // Stand-in for the protocol layer: report what would be sent upstream
    let status_log = get_logger("status");
    let forward = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            status_log.info(&format!(
                "StatusNotification connector {}/{}: {} ({:?})",
                update.evse_id, update.connector_id, update.status, update.error_code
            ));
        }
    });

    for outcome in station.resume_sessions() {
        match outcome {
            ResumeOutcome::Resumed {
                transaction_id,
                elapsed_minutes,
                ..
            } => info!(
                "Resumed transaction {} after {} minutes",
                transaction_id, elapsed_minutes
            ),
            ResumeOutcome::Stopped {
                transaction_id,
                reason,
                ..
            } => info!("Stopped transaction {}: {}", transaction_id, reason),
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    station.stop_all(Reason::Reboot);
    forward.abort();
    info!("Shutdown complete");
    Ok(())
}
