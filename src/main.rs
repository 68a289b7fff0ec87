use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::time::{interval, Duration};
use tracing::{info, warn, Level};

use phantom_players::behaviour::BehaviourCatalog;
use phantom_players::config::ServiceConfig;
use phantom_players::host::InMemoryHost;
use phantom_players::listener::LogListener;
use phantom_players::metrics::ServiceMetrics;
use phantom_players::registry::FakePlayerRegistry;
use phantom_players::roster;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Phantom Players v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServiceConfig::load_or_default();
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    info!(
        "Configuration loaded: view_distance={}, tick_interval={}ms, roster={}",
        config.view_distance,
        config.tick_interval_ms,
        config.roster_path.display()
    );

    let metrics = Arc::new(ServiceMetrics::new());

    // Reference host; a real embedding injects its own HostServer
    let mut host = InMemoryHost::new();

    let mut registry = FakePlayerRegistry::new(
        BehaviourCatalog::with_defaults(),
        config.view_distance,
        metrics.clone(),
    );
    registry.register_listener(Box::new(LogListener));

    // The core owns no timers; this loop is the external periodic driver
    let mut ticker = interval(Duration::from_millis(config.tick_interval_ms));
    let mut roster_loaded = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                registry.tick_all(&mut host);

                // Delayed roster load, giving the host a few ticks to settle
                if !roster_loaded && registry.current_tick() >= config.roster_delay_ticks {
                    roster_loaded = true;
                    match roster::load(&config.roster_path) {
                        Ok(entries) => {
                            let added = roster::apply(&mut registry, &mut host, &entries);
                            info!(
                                "Roster loaded: {} of {} players added",
                                added,
                                entries.len()
                            );
                        }
                        Err(e) => {
                            warn!("Roster not loaded from {}: {}", config.roster_path.display(), e);
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // Cleanup
    registry.shutdown(&mut host);
    info!(
        "Service stopped after {} ticks ({}s up), {} players added, {} behaviour errors",
        metrics.ticks.load(Ordering::Relaxed),
        metrics.uptime_seconds(),
        metrics.players_added.load(Ordering::Relaxed),
        metrics.behaviour_errors.load(Ordering::Relaxed)
    );

    Ok(())
}
