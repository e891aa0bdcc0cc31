//! HikeHub Social Daemon
//!
//! Serves reviews, upvotes, follows and activity feeds over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults
//! hikehub-social
//!
//! # Start with custom config
//! hikehub-social --config /path/to/config.toml
//!
//! # Start with custom HTTP port and storage directory
//! hikehub-social --http-port 8091 --storage-dir /data/social
//! ```

use clap::Parser;
use hikehub_social::services::spawn_logging_listener;
use hikehub_social::{Config, HttpServer, Services, SocialDb, TrustedHeaderResolver};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hikehub-social")]
#[command(about = "Reviews, upvotes and follow graph for HikeHub")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "HIKEHUB_SOCIAL_CONFIG")]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "HIKEHUB_SOCIAL_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, env = "HIKEHUB_SOCIAL_HTTP_PORT")]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("hikehub_social=info".parse()?),
        )
        .init();

    let args = Args::parse();

    // Load config: explicit path first, then the storage directory's config.toml
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        let mut defaults = Config::default();
        if let Some(dir) = &args.storage_dir {
            defaults.storage_dir = dir.clone();
        }
        let existing = defaults.config_path();
        if existing.exists() {
            Config::load(&existing)?
        } else {
            defaults
        }
    };

    // Apply CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    config.validate()?;

    info!(
        storage_dir = %config.storage_dir.display(),
        http_port = config.http_port,
        "Starting hikehub-social"
    );

    // Ensure storage directory exists
    tokio::fs::create_dir_all(&config.storage_dir).await?;

    // Save default config if it doesn't exist
    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    let db = Arc::new(SocialDb::open_at(
        &config.database_path(),
        config.pool_size,
        config.busy_timeout_ms,
    )?);

    let services = Arc::new(Services::new(db.clone(), &config));
    let _event_logger = spawn_logging_listener(services.events.clone());

    let identity = Arc::new(TrustedHeaderResolver::new(
        db.clone(),
        config.identity_header.clone(),
    ));

    let http_addr: SocketAddr = ([0, 0, 0, 0], config.http_port).into();
    let http_server = Arc::new(HttpServer::new(
        services.clone(),
        db.clone(),
        identity,
        http_addr,
    ));

    info!("HTTP API available at http://{}", http_addr);
    info!("Identity header: {}", config.identity_header);
    info!("Press Ctrl+C to stop.");

    // Handle shutdown signal
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
            }
        }
        _ = shutdown => {}
    }

    // Print stats before exit
    if let Ok(stats) = db.stats() {
        info!(
            reviews = stats.review_count,
            upvotes = stats.upvote_count,
            follows = stats.follow_count,
            "Final social stats"
        );
    }

    Ok(())
}
