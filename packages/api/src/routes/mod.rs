//! # Route table
//!
//! | Method | Path | Handler | Identity |
//! |--------|------|---------|----------|
//! | GET | `/api/hello` | [`health::hello`] | — |
//! | GET | `/api/health` | [`health::health`] | — |
//! | POST | `/api/register` | [`account::register`] | — |
//! | POST | `/api/login` | [`account::login`] | — |
//! | POST | `/api/logout` | [`account::logout`] | — |
//! | GET | `/api/me` | [`account::me`] | session |
//! | PUT | `/api/preferences` | [`account::update_preferences`] | session |
//! | POST | `/api/compatibility/save` | [`compatibility::save_answers`] | session |
//! | GET | `/api/matches` | [`matches::list_matches`] | session |
//! | GET | `/api/discover` | [`matches::discover`] | session |
//! | POST | `/api/swipes` | [`swipes::swipe`] | session |
//! | GET | `/api/connections` | [`conversations::list_connections`] | session |
//! | DELETE | `/api/connections/{user_id}` | [`conversations::unmatch`] | session |
//! | GET | `/api/conversations` | [`conversations::list_conversations`] | session |
//! | GET | `/api/conversations/{user_id}` | [`conversations::open_conversation`] | session |
//! | POST | `/api/conversations/{user_id}/messages` | [`conversations::send_message`] | session |
//! | GET | `/api/notifications` | [`notifications::list`] | session |
//! | POST | `/api/notifications/read-all` | [`notifications::mark_all_read`] | session |
//! | POST | `/api/notifications/{id}/read` | [`notifications::mark_read`] | session |
//! | GET | `/api/premium/check` | [`premium::check`] | session |
//! | GET | `/api/premium/feature` | [`premium::feature`] | premium |
//! | POST | `/api/premium/subscribe` | [`premium::subscribe`] | session |
//! | POST | `/api/premium/cancel` | [`premium::cancel`] | session |

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::AppState;

pub mod account;
pub mod compatibility;
pub mod conversations;
pub mod health;
pub mod matches;
pub mod notifications;
pub mod premium;
pub mod swipes;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/hello", get(health::hello))
        .route("/api/health", get(health::health))
        .route("/api/register", post(account::register))
        .route("/api/login", post(account::login))
        .route("/api/logout", post(account::logout))
        .route("/api/me", get(account::me))
        .route("/api/preferences", put(account::update_preferences))
        .route("/api/compatibility/save", post(compatibility::save_answers))
        .route("/api/matches", get(matches::list_matches))
        .route("/api/discover", get(matches::discover))
        .route("/api/swipes", post(swipes::swipe))
        .route("/api/connections", get(conversations::list_connections))
        .route("/api/connections/{user_id}", delete(conversations::unmatch))
        .route(
            "/api/conversations",
            get(conversations::list_conversations),
        )
        .route(
            "/api/conversations/{user_id}",
            get(conversations::open_conversation),
        )
        .route(
            "/api/conversations/{user_id}/messages",
            post(conversations::send_message),
        )
        .route("/api/notifications", get(notifications::list))
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/notifications/{id}/read",
            post(notifications::mark_read),
        )
        .route("/api/premium/check", get(premium::check))
        .route("/api/premium/feature", get(premium::feature))
        .route("/api/premium/subscribe", post(premium::subscribe))
        .route("/api/premium/cancel", post(premium::cancel))
}
