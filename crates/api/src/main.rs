use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ideaflow_db::attachments::LocalAttachmentStorage;
use ideaflow_db::kv::FileKeyValueStore;
use ideaflow_db::{DbPool, EntityStore, MemoryStore, PgStore, TrailStore};
use ideaflow_events::{ActivityLogger, EventBus};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideaflow_api::config::{ServerConfig, StoreBackend};
use ideaflow_api::router::{build_app_router, ATTACHMENT_URL_PREFIX};
use ideaflow_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ideaflow_api=debug,ideaflow_workflow=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = ?config.store_backend,
        "Loaded server configuration"
    );

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let activity_handle = tokio::spawn(ActivityLogger::run(event_bus.subscribe()));

    // --- Stores ---
    let (entities, trail_store, pool): (Arc<dyn EntityStore>, Arc<dyn TrailStore>, Option<DbPool>) =
        match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;

                let pool = ideaflow_db::create_pool(database_url, config.database_max_connections)
                    .await
                    .context("Failed to connect to database")?;
                tracing::info!("Database connection pool created");

                ideaflow_db::health_check(&pool)
                    .await
                    .context("Database health check failed")?;
                tracing::info!("Database health check passed");

                ideaflow_db::run_migrations(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                tracing::info!("Database migrations applied");

                let attachments =
                    LocalAttachmentStorage::new(&config.attachment_dir, ATTACHMENT_URL_PREFIX);
                let store = Arc::new(PgStore::new(pool.clone(), attachments));
                let entities: Arc<dyn EntityStore> = store.clone();
                let trail_store: Arc<dyn TrailStore> = store;
                (entities, trail_store, Some(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on shutdown");
                let store = Arc::new(MemoryStore::new());
                let entities: Arc<dyn EntityStore> = store.clone();
                let trail_store: Arc<dyn TrailStore> = store;
                (entities, trail_store, None)
            }
        };

    // --- App state ---
    let kv = Arc::new(FileKeyValueStore::new(&config.state_dir));
    let state = AppState::build(
        entities,
        trail_store,
        kv,
        Arc::clone(&event_bus),
        config.clone(),
        pool,
    )
    .await;

    match state.coordinator.refresh_pending().await {
        Ok(pending) => tracing::info!(count = pending.len(), "Review queue loaded"),
        Err(e) => tracing::warn!(error = %e, "Failed to load review queue"),
    }

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Dropping the last sender closes the bus and ends the activity logger.
    drop(event_bus);
    match tokio::time::timeout(Duration::from_secs(5), activity_handle).await {
        Ok(Ok(seen)) => tracing::info!(events = seen, "Activity logger stopped"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Activity logger task failed"),
        Err(_) => tracing::warn!("Activity logger did not stop in time"),
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
