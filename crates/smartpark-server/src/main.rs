use anyhow::Context;
use smartpark_engine::{ParkingStation, StationConfig};
use smartpark_hardware::ConfiguredDevices;
use smartpark_server::{AppState, ServerConfig, router};
use smartpark_store::{AnyStore, MemoryStore, RestStore, StoreConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on draining detached jobs at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,smartpark=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = ServerConfig::from_env()?;
    let mut station_config = StationConfig::from_env();

    let store: AnyStore = match StoreConfig::from_env() {
        Some(store_config) => {
            info!(base_url = %store_config.base_url, root = %store_config.root, "using remote store");
            station_config = station_config.with_store_root(store_config.root.clone());
            RestStore::new(&store_config)
                .context("building remote store client")?
                .into()
        }
        None => {
            warn!("SMARTPARK_STORE_URL not set, using an in-memory store");
            MemoryStore::new().into()
        }
    };

    let station = Arc::new(ParkingStation::new(
        station_config,
        store,
        ConfiguredDevices::from_env(),
    ));
    if server.autostart {
        station.start().await;
    }

    let shutdown = CancellationToken::new();
    let state = AppState::new(Arc::clone(&station))
        .with_stream_interval(server.stream_interval)
        .with_shutdown(shutdown.clone());
    let listener = TcpListener::bind(server.bind)
        .await
        .with_context(|| format!("binding {}", server.bind))?;
    info!(addr = %server.bind, "SmartPark server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown, Arc::clone(&station)))
        .await
        .context("serving HTTP")?;

    if tokio::time::timeout(DRAIN_TIMEOUT, station.wait_idle())
        .await
        .is_err()
    {
        warn!("background jobs still running at exit");
    }
    Ok(())
}

/// Wait for ctrl-c, then end the video streams and release the devices
/// while open connections drain.
async fn shutdown_signal(token: CancellationToken, station: Arc<ParkingStation>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
    token.cancel();
    station.stop().await;
}
