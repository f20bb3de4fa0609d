use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podcache_core::{
    load_config, validate_config, BackgroundRefresher, CacheStore, CatalogSource, Clock,
    FreshnessTracker, ItunesArtworkSource, ListenNotesClient, PodcastRefresher, PodcastStore,
    PopularPodcasts, RefreshMode, SqliteStore, SystemClock,
};
use podcache_server::api::create_router;
use podcache_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("PODCACHE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Environment: {:?}", config.environment);
    info!("Database path: {:?}", config.database.path);

    // Create SQLite store (podcasts and cache entries)
    let store = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to create podcast store")?,
    );
    info!("Podcast store initialized");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let freshness = Arc::new(FreshnessTracker::new(
        Arc::clone(&store) as Arc<dyn CacheStore>,
        clock,
    ));

    // Create catalog client
    let listen_notes =
        ListenNotesClient::new(&config.catalog).context("Failed to create catalog client")?;
    if listen_notes.is_configured() {
        info!("Listen Notes catalog at {}", config.catalog.base_url);
    } else {
        warn!("Listen Notes API key not configured, refreshes will fail until one is set");
    }
    let catalog: Arc<dyn CatalogSource> = Arc::new(listen_notes);

    info!("iTunes artwork lookups at {}", config.artwork.base_url);
    let artwork = Arc::new(ItunesArtworkSource::new(config.artwork.clone()));

    let refresher = Arc::new(PodcastRefresher::new(
        catalog,
        artwork,
        Arc::clone(&store) as Arc<dyn PodcastStore>,
        freshness,
        config.refresh.clone(),
        config.artwork.request_delay(),
    ));

    // Start background refresher if configured
    let background = match config.cache.refresh_mode {
        RefreshMode::Background => {
            let background = BackgroundRefresher::new(
                Arc::clone(&refresher),
                config.cache.key.clone(),
                config.cache.ttl(),
                Duration::from_secs(config.cache.background_interval_secs),
            );
            background.start();
            Some(background)
        }
        RefreshMode::Inline => {
            info!("Inline refresh mode, stale reads refresh before serving");
            None
        }
    };

    let podcasts = Arc::new(PopularPodcasts::new(
        refresher,
        store,
        config.cache.clone(),
    ));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), podcasts));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    if let Some(background) = background {
        info!("Stopping background refresher...");
        background.stop();
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
