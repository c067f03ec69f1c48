//! # Domain models for users, swipes, connections, messages and notifications
//!
//! These are the records the [`crate::Store`] trait reads and writes. Types that
//! cross the HTTP boundary derive `Serialize` with camelCase field names so the
//! JSON matches what the browser client expects (`isPremium`, `questionId`,
//! `moveInDate`).
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`UserRecord`] | A full account row, including the Argon2 `password_hash`. Never serialised. |
//! | [`UserInfo`] | The client-safe projection of a [`UserRecord`] returned by `/api/me`. |
//! | [`UserSummary`] | `{email, name}` pair returned by registration and login. |
//! | [`Answer`] | One compatibility questionnaire answer on the `0..=3` scale. |
//! | [`Preferences`] | Location, budget range and move-in date used by the discover filters. |
//! | [`Swipe`] | A like / dislike / super-like from one user to another. |
//! | [`Connection`] | A mutual match between two users; the pair is stored ordered. |
//! | [`Message`] | One chat message inside the conversation of a connected pair. |
//! | [`Notification`] | An entry in a user's notification list. |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest value on the compatibility answer scale.
pub const MAX_ANSWER: u8 = 3;

/// Full user record as persisted by a [`crate::Store`].
#[derive(Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_premium: bool,
    pub answers: Vec<Answer>,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            is_premium: self.is_premium,
            answers: self.answers.clone(),
            preferences: self.preferences.clone(),
            created_at: self.created_at,
        }
    }

    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Fields required to create an account.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// User information safe to send to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_premium: bool,
    pub answers: Vec<Answer>,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub email: String,
    pub name: String,
}

/// A single questionnaire answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: u32,
    pub answer: u8,
}

impl Answer {
    pub fn new(question_id: u32, answer: u8) -> Self {
        Self {
            question_id,
            answer,
        }
    }
}

/// Monthly budget range, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: u32,
    pub max: u32,
}

impl BudgetRange {
    /// Whether this range shares at least one value with `[min, max]`.
    /// Missing bounds are open.
    pub fn overlaps(&self, min: Option<u32>, max: Option<u32>) -> bool {
        let min = min.unwrap_or(0);
        let max = max.unwrap_or(u32::MAX);
        self.min <= max && self.max >= min
    }
}

/// Housing preferences shown on a profile card.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub budget: Option<BudgetRange>,
    #[serde(default)]
    pub move_in_date: Option<NaiveDate>,
}

/// Outcome of a swipe on a profile card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeKind {
    Like,
    Dislike,
    SuperLike,
}

impl SwipeKind {
    /// Likes and super-likes count towards a mutual match.
    pub fn is_positive(self) -> bool {
        matches!(self, SwipeKind::Like | SwipeKind::SuperLike)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwipeKind::Like => "like",
            SwipeKind::Dislike => "dislike",
            SwipeKind::SuperLike => "super_like",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(SwipeKind::Like),
            "dislike" => Some(SwipeKind::Dislike),
            "super_like" => Some(SwipeKind::SuperLike),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    pub from: Uuid,
    pub to: Uuid,
    pub kind: SwipeKind,
    pub created_at: DateTime<Utc>,
}

/// A mutual match. `user_a < user_b` always holds.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub super_like: bool,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// Order a pair the way connections are keyed.
    pub fn pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// The member of the pair that is not `me`.
    pub fn other(&self, me: Uuid) -> Uuid {
        if self.user_a == me {
            self.user_b
        } else {
            self.user_a
        }
    }

    pub fn involves(&self, user: Uuid) -> bool {
        self.user_a == user || self.user_b == user
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    /// Whether the message belongs to the conversation of `{a, b}`.
    pub fn between(&self, a: Uuid, b: Uuid) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

#[derive(Clone, Debug)]
pub struct NewMessage {
    pub from: Uuid,
    pub to: Uuid,
    pub body: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Match,
    Message,
    Premium,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Match => "match",
            NotificationKind::Message => "message",
            NotificationKind::Premium => "premium",
            NotificationKind::Info => "info",
        }
    }

    /// Unknown kinds fall back to `Info`.
    pub fn parse(s: &str) -> Self {
        match s {
            "match" => NotificationKind::Match,
            "message" => NotificationKind::Message,
            "premium" => NotificationKind::Premium,
            _ => NotificationKind::Info,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Longest message preview carried by a message notification.
const PREVIEW_CHARS: usize = 80;

impl NewNotification {
    /// "It's a match!" notification for `user_id` about `other_name`.
    pub fn matched(user_id: Uuid, other_name: &str) -> Self {
        Self {
            user_id,
            kind: NotificationKind::Match,
            title: "It's a match!".to_string(),
            message: format!(
                "You and {other_name} have liked each other. Start a conversation now!"
            ),
        }
    }

    pub fn message(user_id: Uuid, sender_name: &str, body: &str) -> Self {
        let mut preview: String = body.chars().take(PREVIEW_CHARS).collect();
        if body.chars().count() > PREVIEW_CHARS {
            preview.push('…');
        }
        Self {
            user_id,
            kind: NotificationKind::Message,
            title: format!("New message from {sender_name}"),
            message: preview,
        }
    }

    pub fn premium(user_id: Uuid) -> Self {
        Self {
            user_id,
            kind: NotificationKind::Premium,
            title: "Welcome to Premium".to_string(),
            message: "Your premium subscription is now active.".to_string(),
        }
    }
}
