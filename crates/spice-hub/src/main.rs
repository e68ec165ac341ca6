use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spice_hub::config::Config;

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(
    name = "spice-hub",
    version,
    about = "Spice restaurant search and review service"
)]
struct Args {
    /// Path to config file
    #[arg(long, default_value = "spice-hub.toml")]
    config: PathBuf,

    /// Server bind address (overrides the config file)
    #[arg(long)]
    bind: Option<String>,

    /// Catalog seed file (overrides the config file)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Review journal file (overrides the config file)
    #[arg(long)]
    reviews: Option<PathBuf>,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "spice_hub=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(catalog) = args.catalog {
        config.storage.catalog_path = catalog;
    }
    if let Some(reviews) = args.reviews {
        config.storage.reviews_path = reviews;
    }

    let service = match spice_hub::build_service(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    match service.health_check().await.message {
        Some(message) => tracing::info!("{message}"),
        None => tracing::info!("Stores ready"),
    }

    let addr: SocketAddr = match config.server.bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid bind address {:?}: {e}", config.server.bind);
            std::process::exit(1);
        }
    };

    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("  Spice v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  API:        http://{}/api/restaurants", addr);
    tracing::info!("  Health:     http://{}/api/health", addr);
    tracing::info!("  Metrics:    http://{}/metrics", addr);
    tracing::info!("  Catalog:    {:?}", config.storage.catalog_path);
    tracing::info!("  Reviews:    {:?}", config.storage.reviews_path);
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    let app = spice_hub::api::router(service);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
