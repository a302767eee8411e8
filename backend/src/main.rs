//! FAPECAFES report gateway - server binary

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fapecafe_reports::{
    create_app,
    external::UpstreamClient,
    services::{RefreshScheduler, SnapshotService},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fapecafe_reports=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting FAPECAFES Report Gateway");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Upstream: {}", config.upstream.base_url);

    let client = UpstreamClient::from_config(&config.upstream)?;
    let snapshots = SnapshotService::new(Arc::new(client));

    if config.refresh.enabled {
        RefreshScheduler::new(snapshots.clone(), config.refresh.interval()).spawn();
    } else if let Err(err) = snapshots.refresh().await {
        // Without the scheduler the first snapshot comes from this load or
        // from a manual refresh
        tracing::warn!("Initial snapshot load failed: {}", err);
    }

    let state = AppState {
        config: Arc::new(config.clone()),
        snapshots,
    };

    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
