//! Patient Records Binary Entry Point
//!
//! Selects a storage backend from the environment, prepares the schema and
//! serves the web UI. Core functionality lives in the `patient_records`
//! library crate.

use clap::Parser;
use patient_records::{
    config::AppConfig,
    server::{AppState, create_router},
    storage::{BackendSelection, EnvironmentSignals, PatientStore, StorageBuilder},
};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Patient Records - patient list, add, delete and search
#[derive(Parser, Debug)]
#[command(name = "patient-records", version, about, long_about = None)]
struct Cli {
    /// Path to an optional configuration file
    #[arg(short, long, env = "PATIENTS_CONFIG")]
    config: Option<String>,

    /// Server bind address (overrides config file)
    #[arg(long, env = "BIND")]
    bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Cloud PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Set when running on the hosting platform
    #[arg(long, env = "RENDER")]
    render: Option<String>,

    /// Runtime environment (e.g. "production")
    #[arg(long, env = "NODE_ENV")]
    node_env: Option<String>,
}

impl Cli {
    fn signals(&self) -> EnvironmentSignals {
        EnvironmentSignals {
            database_url: self.database_url.clone(),
            hosting_platform: self.render.is_some(),
            runtime_env: self.node_env.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,patient_records=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration (CLI > ENV > config file > defaults)
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind.clone() {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    // Bind exactly one backend for the process lifetime
    let selection = BackendSelection::select(
        &cli.signals(),
        &config.database.local,
        config.database.memory_fallback,
    );
    let pool = config.database.pool_settings()?;
    let store = StorageBuilder::new(selection)
        .max_connections(pool.max_connections)
        .acquire_timeout(pool.acquire_timeout)
        .build()?;

    // A failed schema setup is logged; queries will report the cause.
    match store.init_schema().await {
        Ok(()) => tracing::info!(backend = %store.kind(), "Database initialized successfully"),
        Err(e) => tracing::error!(backend = %store.kind(), error = %e, "Error initializing database"),
    }

    let app_state = AppState::new(store.clone()).with_static_dir(config.server.static_dir.clone());
    let app = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server running on http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(store))
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal(store: PatientStore) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

    tracing::info!("Closing storage...");
    store.close().await;
}
