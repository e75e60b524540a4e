use std::sync::Arc;

use meitra_backend::config::GameConfig;
use meitra_backend::domain::ShuffledDeck;
use meitra_backend::repos::game_states::InMemoryGameStateStore;
use meitra_backend::services::runtime::GameRuntime;
use meitra_backend::ws::ConnectionHub;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod telemetry;

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    // Timing comes from MEITRA_* variables; see config::game for the list.
    let config = match GameConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    info!(
        disconnect_grace_ms = config.disconnect_grace.as_millis() as u64,
        broadcast_delay_ms = config.broadcast_delay.as_millis() as u64,
        points_to_win = config.default_points_to_win,
        "Starting Mei-Tra runtime"
    );

    let hub = Arc::new(ConnectionHub::new());
    let runtime = GameRuntime::new(
        config,
        Arc::new(ShuffledDeck),
        Arc::new(InMemoryGameStateStore::new()),
        hub,
    );

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(Arc::clone(&runtime).run_sweeper(shutdown.clone()));

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("❌ Failed to listen for shutdown signal: {e}");
    }
    info!(rooms = runtime.rooms().len(), "Shutting down");
    shutdown.cancel();
    let _ = sweeper.await;
}
