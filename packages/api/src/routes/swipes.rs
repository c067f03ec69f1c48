use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use store::matching::{self, SwipeOutcome};
use store::SwipeKind;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub to: Uuid,
    pub kind: SwipeKind,
}

/// Record a swipe; connects the pair when the like is mutual.
pub async fn swipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<SwipeRequest>, JsonRejection>,
) -> ApiResult<Json<SwipeOutcome>> {
    let Json(request) = payload?;
    let target = state
        .store
        .user(request.to)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let outcome =
        matching::apply_swipe(state.store.as_ref(), &user, &target, request.kind).await?;
    Ok(Json(outcome))
}
