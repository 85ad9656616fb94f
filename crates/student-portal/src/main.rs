//! Student Portal - Entry point.

use std::net::SocketAddr;
use student_portal::{
    api::{create_router, AppState},
    config::Config,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Student Portal");

    let state = AppState::from_config(&config);

    // The table must exist before the first request
    let store = state.store.clone();
    let schema = tokio::task::spawn_blocking(move || {
        store.ensure_schema()?;
        store.count()
    })
    .await;

    match schema {
        Ok(Ok(count)) => info!(
            path = %config.store.path.display(),
            "Database ready with {} registrations", count
        ),
        Ok(Err(e)) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Database initialization task failed: {}", e);
            std::process::exit(1);
        }
    }

    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Student Portal stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
