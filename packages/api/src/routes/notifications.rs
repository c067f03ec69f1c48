use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use store::Notification;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

#[derive(Debug, Serialize)]
pub struct MarkAllResponse {
    pub updated: u64,
}

/// The caller's notifications, newest first, with the unread count.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<NotificationsResponse>> {
    let notifications = state.store.notifications(user.id).await?;
    let unread = notifications.iter().filter(|n| !n.read).count();
    Ok(Json(NotificationsResponse {
        notifications,
        unread,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    if !state.store.mark_notification_read(user.id, id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MarkAllResponse>> {
    let updated = state.store.mark_all_notifications_read(user.id).await?;
    Ok(Json(MarkAllResponse { updated }))
}
