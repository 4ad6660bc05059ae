//! Hadoop Exporter Binary Entry Point
//!
//! Composition root: loads configuration and catalogs, builds one collector
//! per target and serves the scrape endpoint until Ctrl+C or SIGTERM.

use clap::Parser;
use hadoop_exporter::{
    collector::{CollectorRegistry, ServiceCollector},
    config::{AppConfig, parse_duration},
    discovery::{self, Registration},
    server::{AppState, create_router},
    catalog::FieldCatalog,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Hadoop JMX to Prometheus exporter
#[derive(Parser, Debug)]
#[command(name = "hadoop-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "HADOOP_EXPORTER_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "HADOOP_EXPORTER_BIND")]
    bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(short, long, env = "HADOOP_EXPORTER_PORT")]
    port: Option<u16>,

    /// Cluster label (overrides config file)
    #[arg(long, env = "HADOOP_EXPORTER_CLUSTER")]
    cluster: Option<String>,

    /// Catalog directory (overrides config file)
    #[arg(long, env = "HADOOP_EXPORTER_CATALOG")]
    catalog: Option<String>,

    /// JMX fetch timeout, e.g. `5s` (overrides config file)
    #[arg(long, env = "HADOOP_EXPORTER_FETCH_TIMEOUT", value_parser = parse_duration)]
    fetch_timeout: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hadoop_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Hadoop Exporter - JMX to Prometheus");

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(cluster) = cli.cluster {
        config.cluster = cluster;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }
    if let Some(timeout) = cli.fetch_timeout {
        config.fetch_timeout = timeout;
    }
    config.validate()?;

    tracing::info!(
        "Server: {}:{}{}, cluster: {}, targets: {}",
        config.server.bind,
        config.server.port,
        config.server.metrics_path,
        config.cluster,
        config.enabled_targets().count(),
    );

    // Load field catalogs; a missing or malformed catalog is fatal
    let catalog = FieldCatalog::load(
        &config.catalog_path,
        config.enabled_targets().map(|t| t.service),
    )?;

    // Build one collector per enabled target
    let mut registry = CollectorRegistry::new();
    for target in config.enabled_targets() {
        let collector = ServiceCollector::http(
            target.cluster_or(&config.cluster),
            target.service,
            &catalog,
            target.endpoint()?,
            config.fetch_timeout,
        )?;
        registry.register(collector);
    }

    // Create web server state
    let app_state = AppState {
        registry: Arc::new(registry),
        metrics_path: config.server.metrics_path.clone(),
    };

    // Build Axum router
    let app = create_router(app_state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Register with Consul once the listener is bound
    let registration = match &config.discovery.consul {
        Some(consul) => match discovery::register(consul, config.server.port).await {
            Ok(registration) => Some(registration),
            Err(e) => {
                tracing::error!("Consul registration failed: {}", e);
                None
            }
        },
        None => None,
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registration))
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal(registration: Option<Registration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }

    if let Some(registration) = registration {
        tracing::info!("Deregistering from Consul...");
        if let Err(e) = registration.deregister().await {
            tracing::error!("Failed to deregister from Consul: {}", e);
        }
    }
}
