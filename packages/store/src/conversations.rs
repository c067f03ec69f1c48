//! # Conversations between connected users
//!
//! A conversation is the message thread of one [`Connection`]. Only connected
//! users can message each other; unmatching deletes the thread (see
//! [`Store::disconnect`]).
//!
//! - [`summaries`] — the conversation list: counterpart, last message, unread count,
//!   most recent activity first.
//! - [`open`] — the full thread, marking incoming messages as read.
//! - [`send`] — validate and append a message, notifying the recipient.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::models::{Connection, Message, NewMessage, NewNotification, UserRecord};
use crate::repo::{Store, StoreError, StoreResult};

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Counterpart {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub with: Counterpart,
    pub last_message: Option<Message>,
    pub unread: usize,
    pub last_activity: DateTime<Utc>,
    pub super_like: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Thread {
    pub with: Counterpart,
    pub messages: Vec<Message>,
}

/// Trim a message body and check it is non-empty and within bounds.
pub fn validate_body(body: &str) -> StoreResult<&str> {
    let body = body.trim();
    if body.is_empty() {
        return Err(StoreError::InvalidInput(
            "Message cannot be empty".to_string(),
        ));
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(StoreError::InvalidInput(format!(
            "Message cannot exceed {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(body)
}

async fn summary(
    store: &dyn Store,
    me: Uuid,
    connection: &Connection,
) -> StoreResult<Option<ConversationSummary>> {
    let other_id = connection.other(me);
    // the counterpart may have been deleted between the two reads
    let Some(other) = store.user(other_id).await? else {
        return Ok(None);
    };
    let messages = store.messages_between(me, other_id).await?;
    let unread = messages.iter().filter(|m| m.to == me && !m.read).count();
    let last_message = messages.last().cloned();
    let last_activity = last_message
        .as_ref()
        .map(|m| m.sent_at)
        .unwrap_or(connection.created_at);

    Ok(Some(ConversationSummary {
        with: Counterpart {
            id: other.id,
            name: other.name,
        },
        last_message,
        unread,
        last_activity,
        super_like: connection.super_like,
    }))
}

/// One summary per connection of `me`, most recent activity first.
pub async fn summaries(store: &dyn Store, me: Uuid) -> StoreResult<Vec<ConversationSummary>> {
    let mut list = Vec::new();
    for connection in store.connections_of(me).await? {
        if let Some(summary) = summary(store, me, &connection).await? {
            list.push(summary);
        }
    }
    list.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    Ok(list)
}

/// Load the thread between `me` and `other`, marking messages to `me` as read.
pub async fn open(store: &dyn Store, me: Uuid, other: &UserRecord) -> StoreResult<Thread> {
    if store.connection(me, other.id).await?.is_none() {
        return Err(StoreError::NotFound);
    }
    store.mark_messages_read(me, other.id).await?;
    let messages = store.messages_between(me, other.id).await?;
    Ok(Thread {
        with: Counterpart {
            id: other.id,
            name: other.name.clone(),
        },
        messages,
    })
}

/// Send `body` from `from` to `to`. Fails with [`StoreError::NotConnected`] unless
/// the two are matched. The recipient's notification is best effort: once the
/// message is stored, a failed notification is only logged.
pub async fn send(
    store: &dyn Store,
    from: &UserRecord,
    to: &UserRecord,
    body: &str,
) -> StoreResult<Message> {
    let body = validate_body(body)?;
    if store.connection(from.id, to.id).await?.is_none() {
        return Err(StoreError::NotConnected);
    }
    let message = store
        .append_message(NewMessage {
            from: from.id,
            to: to.id,
            body: body.to_string(),
        })
        .await?;
    if let Err(e) = store
        .push_notification(NewNotification::message(to.id, &from.name, body))
        .await
    {
        warn!(user_id = %to.id, error = %e, "failed to store message notification");
    }
    Ok(message)
}
