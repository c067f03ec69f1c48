use std::sync::Arc;

use anyhow::Context;
use api::{db, settings::Settings, AppState};
use store::Store;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    info!("Connecting to database...");
    let pool = db::connect(&settings.database)
        .await
        .context("Failed to connect to database")?;
    db::migrate(&pool)
        .await
        .context("Failed to run migrations")?;

    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("Failed to create session table")?;

    let cleanup = api::spawn_session_cleanup(session_store.clone(), api::SESSION_CLEANUP_PERIOD);

    let store: Arc<dyn Store> = Arc::new(db::PgStore::new(pool));
    let mut app = api::router(AppState::new(store))
        .layer(api::session_layer(session_store, &settings.session));
    if let Some(cors) = api::cors_layer(&settings.server) {
        app = app.layer(cors);
    }

    let address = settings.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cleanup.abort();
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
