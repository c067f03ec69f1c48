//! Session-backed identity.
//!
//! After registration or login the user's id is stored in the server-side
//! session under [`SESSION_USER_ID_KEY`]; the browser only holds the opaque
//! session cookie. [`CurrentUser`] and [`PremiumUser`] are extractors that load
//! the account behind that id.

use axum::{extract::FromRequestParts, http::request::Parts};
use store::UserRecord;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Bind `user_id` to the session, rotating the session id first.
pub async fn sign_in(session: &Session, user_id: Uuid) -> Result<(), ApiError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, user_id).await?;
    Ok(())
}

/// The signed-in account. Rejects with 401 when there is no session.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserRecord);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| ApiError::Internal(message.to_string()))?;

        let user_id: Option<Uuid> = session.get(SESSION_USER_ID_KEY).await?;
        let Some(user_id) = user_id else {
            return Err(ApiError::Unauthorized);
        };

        match state.store.user(user_id).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                // account is gone; drop the stale session
                session.flush().await?;
                Err(ApiError::NotFound("User not found".to_string()))
            }
        }
    }
}

/// A signed-in account with an active premium subscription. Rejects with 403
/// otherwise.
#[derive(Clone, Debug)]
pub struct PremiumUser(pub UserRecord);

impl FromRequestParts<AppState> for PremiumUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_premium {
            return Err(ApiError::Forbidden(
                "Premium feature requires subscription".to_string(),
            ));
        }
        Ok(PremiumUser(user))
    }
}
