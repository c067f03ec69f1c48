//! Premium subscription flag and the features behind it. There is no payment
//! flow; subscribing only flips `is_premium`.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use store::NewNotification;
use tracing::info;

use crate::auth::{CurrentUser, PremiumUser};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumStatus {
    pub is_premium: bool,
}

pub async fn check(CurrentUser(user): CurrentUser) -> Json<PremiumStatus> {
    Json(PremiumStatus {
        is_premium: user.is_premium,
    })
}

pub async fn feature(PremiumUser(_user): PremiumUser) -> Json<Value> {
    Json(json!({
        "message": "This is a premium feature!",
        "data": "Premium content here"
    }))
}

/// Turn premium on; notifies the user the first time it activates.
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<PremiumStatus>> {
    if !user.is_premium {
        state.store.set_premium(user.id, true).await?;
        state
            .store
            .push_notification(NewNotification::premium(user.id))
            .await?;
        info!(user_id = %user.id, "premium activated");
    }
    Ok(Json(PremiumStatus { is_premium: true }))
}

pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<PremiumStatus>> {
    let user = state.store.set_premium(user.id, false).await?;
    info!(user_id = %user.id, "premium cancelled");
    Ok(Json(PremiumStatus {
        is_premium: user.is_premium,
    }))
}
