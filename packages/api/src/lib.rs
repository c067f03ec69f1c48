//! # API crate — the Roomus HTTP service
//!
//! Everything the `server` binary mounts: the axum router, the handlers behind it,
//! session-backed identity, error mapping, settings, and the PostgreSQL store.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2id password hashing, session sign-in, `CurrentUser` / `PremiumUser` extractors |
//! | [`db`] | PostgreSQL pool, embedded migrations and the [`db::PgStore`] backend |
//! | [`error`] | [`error::ApiError`] and its JSON `{"error": ...}` rendering |
//! | [`routes`] | The `/api/...` route table and its handlers |
//! | [`settings`] | Layered configuration (defaults, `config.toml`, `ROOMUS__*` environment) |
//!
//! ## Layers
//!
//! [`router`] returns the routes with a [`TraceLayer`] and the shared [`AppState`].
//! The session layer is generic over its backing store, so the binary adds
//! [`session_layer`] with a PostgreSQL session store while the tests use
//! `tower_sessions::MemoryStore`. [`cors_layer`] is only present when origins are
//! configured. [`spawn_session_cleanup`] purges expired sessions in the background.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use store::Store;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{time::Duration, SameSite};
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tracing::{error, warn};

pub mod auth;
pub mod db;
pub mod error;
pub mod routes;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use error::{ApiError, ApiResult};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// The full route table with request tracing.
pub fn router(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cookie session layer over `store`, expiring after the configured days of
/// inactivity.
pub fn session_layer<S>(store: S, settings: &settings::Session) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_secure(settings.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(settings.expiry_days)))
}

/// How often expired sessions are purged from the session store.
pub const SESSION_CLEANUP_PERIOD: StdDuration = StdDuration::from_secs(60 * 60);

/// Delete expired sessions every `period` until the task is aborted. Stores
/// skip expired rows on load but never remove them on their own.
pub fn spawn_session_cleanup<S>(store: S, period: StdDuration) -> JoinHandle<()>
where
    S: ExpiredDeletion + Clone,
{
    tokio::task::spawn(async move {
        if let Err(e) = store.continuously_delete_expired(period).await {
            error!(error = %e, "expired session cleanup stopped");
        }
    })
}

/// CORS for the configured origins. `None` when no origin is configured, since
/// the client is then served from the same origin.
pub fn cors_layer(settings: &settings::Server) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    )
}
