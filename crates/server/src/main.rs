use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subrecall_core::{
    create_command_queue, load_config, validate_config, Collaborators, CommandSink,
    Config, CouchPotatoClient, EventNormalizer, FileHasher, OpenSubtitlesSource, ProviderPool,
    Rechecker, SceneNameIdentifier, SonarrClient, SqliteCatalog, SubtitleSource,
};
use subrecall_server::api::create_router;
use subrecall_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long to wait for in-flight commands once the server has stopped.
/// Movie polls still running hold queue handles, so the worker may outlive this.
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

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
    let config_path = std::env::var("SUBRECALL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);
    info!("Languages: {}", config.subtitles.languages.join(", "));

    // Create SQLite catalog
    let catalog = SqliteCatalog::new(&config.database.path)
        .context("Failed to open video catalog")?;
    info!("Video catalog initialized");

    // Subtitle providers
    let source = build_provider_pool(&config)?;
    info!("Subtitle providers: {}", config.subtitles.providers.join(", "));

    let collaborators = Collaborators {
        source: Arc::new(source),
        identifier: Arc::new(SceneNameIdentifier::new()),
        hasher: Arc::new(FileHasher::new()),
    };

    // Create command queue and spawn its worker
    let (queue, worker) = create_command_queue(
        Box::new(catalog),
        collaborators,
        config.subtitles.worker_settings(),
    );
    let worker_handle = tokio::spawn(worker.run());

    let sink: Arc<dyn CommandSink> = Arc::new(queue.clone());
    let mut normalizer = EventNormalizer::new(Arc::clone(&sink));

    // Episode manager if configured
    match &config.sonarr {
        Some(sonarr_config) => {
            info!("Initializing Sonarr client at {}", sonarr_config.url);
            let client = SonarrClient::new(sonarr_config.clone())
                .context("Failed to create Sonarr client")?;
            normalizer = normalizer.with_episode_manager(Arc::new(client));
        }
        None => info!("No episode manager configured"),
    }

    // Movie manager if configured
    match &config.couchpotato {
        Some(couchpotato_config) => {
            info!("Initializing CouchPotato client at {}", couchpotato_config.url);
            let client = CouchPotatoClient::new(couchpotato_config.clone())
                .context("Failed to create CouchPotato client")?;
            normalizer =
                normalizer.with_movie_manager(Arc::new(client), couchpotato_config.poll_settings());
        }
        None => info!("No movie manager configured"),
    }

    // Start periodic rechecks
    let rechecker = Rechecker::new(config.subtitles.search_interval(), sink);
    rechecker.start();

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, normalizer, queue));
    let app = create_router(state);

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
    rechecker.stop().await;

    // The worker exits once every queue handle is gone. AppState went with
    // the router; the rechecker holds the last long-lived one.
    drop(rechecker);

    match tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, worker_handle).await {
        Ok(_) => info!("Command worker stopped"),
        Err(_) => warn!("Command worker still busy, exiting anyway"),
    }

    Ok(())
}

/// Build one source per configured provider, in configured order.
fn build_provider_pool(config: &Config) -> Result<ProviderPool> {
    let mut sources: Vec<Arc<dyn SubtitleSource>> = Vec::new();
    for provider in &config.subtitles.providers {
        match provider.as_str() {
            "opensubtitles" => {
                let opensubtitles_config = config
                    .opensubtitles
                    .clone()
                    .context("Provider 'opensubtitles' needs an [opensubtitles] section")?;
                let source = OpenSubtitlesSource::new(opensubtitles_config)
                    .context("Failed to create OpenSubtitles source")?;
                sources.push(Arc::new(source));
            }
            other => anyhow::bail!("Unknown subtitle provider '{}'", other),
        }
    }
    Ok(ProviderPool::new(sources))
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
