//! # Store — the persistence seam of Roomus
//!
//! Every handler in the `api` crate talks to storage through the [`Store`] trait, so
//! the same logic runs against PostgreSQL in production (`api::db::PgStore`) and
//! against [`crate::MemoryStore`] in tests.
//!
//! ## Invariants every implementation upholds
//!
//! - Emails are unique; [`Store::create_user`] returns [`StoreError::Conflict`] on a
//!   duplicate.
//! - At most one [`Swipe`] exists per ordered pair; recording again replaces it.
//! - At most one [`Connection`] exists per unordered pair; [`Store::connect`] returns
//!   [`StoreError::Conflict`] if the pair is already connected.
//! - [`Store::disconnect`] removes the connection, every message between the pair and
//!   both swipes, so a conversation never outlives its match.
//! - Listings are ordered: messages oldest first, notifications newest first.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Answer, Connection, Message, NewMessage, NewNotification, NewUser, Notification,
    Preferences, Swipe, SwipeKind, UserRecord,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,

    #[error("record not found")]
    NotFound,

    #[error("users are not connected")]
    NotConnected,

    #[error("{0}")]
    InvalidInput(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Async storage interface for accounts and matching state.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord>;

    async fn user(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    /// Look up by already-normalised (trimmed, lower-case) email.
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Every user except `id`.
    async fn users_except(&self, id: Uuid) -> StoreResult<Vec<UserRecord>>;

    /// Replace the user's whole answer set.
    async fn save_answers(&self, id: Uuid, answers: Vec<Answer>) -> StoreResult<UserRecord>;

    async fn update_preferences(
        &self,
        id: Uuid,
        preferences: Preferences,
    ) -> StoreResult<UserRecord>;

    async fn set_premium(&self, id: Uuid, is_premium: bool) -> StoreResult<UserRecord>;

    async fn record_swipe(&self, from: Uuid, to: Uuid, kind: SwipeKind) -> StoreResult<Swipe>;

    async fn swipe(&self, from: Uuid, to: Uuid) -> StoreResult<Option<Swipe>>;

    /// Ids of every user `from` has swiped on.
    async fn swiped_by(&self, from: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn connect(&self, a: Uuid, b: Uuid, super_like: bool) -> StoreResult<Connection>;

    async fn connection(&self, a: Uuid, b: Uuid) -> StoreResult<Option<Connection>>;

    async fn connections_of(&self, user: Uuid) -> StoreResult<Vec<Connection>>;

    /// Remove the connection of `{a, b}` with its messages and swipes.
    /// Returns `false` if the pair was not connected.
    async fn disconnect(&self, a: Uuid, b: Uuid) -> StoreResult<bool>;

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message>;

    async fn messages_between(&self, a: Uuid, b: Uuid) -> StoreResult<Vec<Message>>;

    /// Mark every message sent by `other` to `reader` as read.
    async fn mark_messages_read(&self, reader: Uuid, other: Uuid) -> StoreResult<u64>;

    async fn push_notification(&self, notification: NewNotification)
        -> StoreResult<Notification>;

    async fn notifications(&self, user: Uuid) -> StoreResult<Vec<Notification>>;

    /// Returns `false` if no notification `id` belongs to `user`.
    async fn mark_notification_read(&self, user: Uuid, id: Uuid) -> StoreResult<bool>;

    async fn mark_all_notifications_read(&self, user: Uuid) -> StoreResult<u64>;
}
