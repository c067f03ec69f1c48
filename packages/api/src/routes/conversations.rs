//! Connections (mutual matches) and the conversations between them.
//!
//! A conversation exists exactly as long as its connection: unmatching deletes
//! the messages, and sending requires the pair to be connected.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store::conversations::{self, ConversationSummary, Thread};
use store::{compatibility, Message, StoreError, UserRecord};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEntry {
    pub id: Uuid,
    pub name: String,
    pub score: u8,
    pub super_like: bool,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<ConnectionEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

async fn counterpart(state: &AppState, id: Uuid) -> ApiResult<UserRecord> {
    state
        .store
        .user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Connected users with their compatibility score, newest connection first.
pub async fn list_connections(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ConnectionsResponse>> {
    let mut connections = Vec::new();
    for connection in state.store.connections_of(user.id).await? {
        let Some(other) = state.store.user(connection.other(user.id)).await? else {
            continue;
        };
        connections.push(ConnectionEntry {
            id: other.id,
            score: compatibility(&user.answers, &other.answers),
            name: other.name,
            super_like: connection.super_like,
            connected_at: connection.created_at,
        });
    }
    Ok(Json(ConnectionsResponse { connections }))
}

/// Unmatch: drop the connection together with its conversation.
pub async fn unmatch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(other) = path?;
    if !state.store.disconnect(user.id, other).await? {
        return Err(ApiError::NotFound("Connection not found".to_string()));
    }
    info!(user_id = %user.id, other = %other, "unmatched");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ConversationsResponse>> {
    let conversations = conversations::summaries(state.store.as_ref(), user.id).await?;
    Ok(Json(ConversationsResponse { conversations }))
}

/// The thread with one connection, oldest message first. Marks the caller's
/// incoming messages as read.
pub async fn open_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Thread>> {
    let Path(other) = path?;
    let other = counterpart(&state, other).await?;
    match conversations::open(state.store.as_ref(), user.id, &other).await {
        Ok(thread) => Ok(Json(thread)),
        Err(StoreError::NotFound) => Err(ApiError::NotFound(
            "Conversation not found".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let Path(other) = path?;
    let Json(request) = payload?;
    let other = counterpart(&state, other).await?;

    let message =
        conversations::send(state.store.as_ref(), &user, &other, &request.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
