use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use store::{
    Answer, BudgetRange, Connection, Message, NewMessage, NewNotification, NewUser,
    Notification, NotificationKind, Preferences, Store, StoreError, StoreResult, Swipe,
    SwipeKind, UserRecord,
};
use uuid::Uuid;

/// PostgreSQL backed [`Store`].
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Map constraint violations on insert to domain errors.
fn insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound;
        }
    }
    backend(e)
}

/// Database row of the `users` table.
#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    is_premium: bool,
    answers: Json<Vec<Answer>>,
    location: Option<String>,
    budget_min: Option<i64>,
    budget_max: Option<i64>,
    move_in_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        let budget = match (self.budget_min, self.budget_max) {
            (Some(min), Some(max)) => match (u32::try_from(min), u32::try_from(max)) {
                (Ok(min), Ok(max)) => Some(BudgetRange { min, max }),
                _ => None,
            },
            _ => None,
        };
        UserRecord {
            id: self.id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            is_premium: self.is_premium,
            answers: self.answers.0,
            preferences: Preferences {
                location: self.location,
                budget,
                move_in_date: self.move_in_date,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SwipeRow {
    swiper_id: Uuid,
    target_id: Uuid,
    kind: String,
    created_at: DateTime<Utc>,
}

impl SwipeRow {
    fn into_swipe(self) -> StoreResult<Swipe> {
        let kind = SwipeKind::parse(&self.kind)
            .ok_or_else(|| StoreError::Backend(format!("unknown swipe kind {}", self.kind)))?;
        Ok(Swipe {
            from: self.swiper_id,
            to: self.target_id,
            kind,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ConnectionRow {
    user_a: Uuid,
    user_b: Uuid,
    super_like: bool,
    created_at: DateTime<Utc>,
}

impl From<ConnectionRow> for Connection {
    fn from(row: ConnectionRow) -> Self {
        Connection {
            user_a: row.user_a,
            user_b: row.user_b,
            super_like: row.super_like,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    body: String,
    sent_at: DateTime<Utc>,
    read: bool,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            from: row.sender_id,
            to: row.recipient_id,
            body: row.body,
            sent_at: row.sent_at,
            read: row.read,
        }
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            kind: NotificationKind::parse(&row.kind),
            title: row.title,
            message: row.message,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(row.into_record())
    }

    async fn user(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(UserRow::into_record))
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(UserRow::into_record))
    }

    async fn users_except(&self, id: Uuid) -> StoreResult<Vec<UserRecord>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE id <> $1 ORDER BY created_at")
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;
        Ok(rows.into_iter().map(UserRow::into_record).collect())
    }

    async fn save_answers(&self, id: Uuid, answers: Vec<Answer>) -> StoreResult<UserRecord> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET answers = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(&answers))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(UserRow::into_record).ok_or(StoreError::NotFound)
    }

    async fn update_preferences(
        &self,
        id: Uuid,
        preferences: Preferences,
    ) -> StoreResult<UserRecord> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users
            SET location = $2, budget_min = $3, budget_max = $4, move_in_date = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&preferences.location)
        .bind(preferences.budget.map(|b| i64::from(b.min)))
        .bind(preferences.budget.map(|b| i64::from(b.max)))
        .bind(preferences.move_in_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(UserRow::into_record).ok_or(StoreError::NotFound)
    }

    async fn set_premium(&self, id: Uuid, is_premium: bool) -> StoreResult<UserRecord> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET is_premium = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_premium)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(UserRow::into_record).ok_or(StoreError::NotFound)
    }

    async fn record_swipe(&self, from: Uuid, to: Uuid, kind: SwipeKind) -> StoreResult<Swipe> {
        let row: SwipeRow = sqlx::query_as(
            r#"
            INSERT INTO swipes (swiper_id, target_id, kind)
            VALUES ($1, $2, $3)
            ON CONFLICT (swiper_id, target_id)
            DO UPDATE SET kind = EXCLUDED.kind, created_at = NOW()
            RETURNING swiper_id, target_id, kind, created_at
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)?;
        row.into_swipe()
    }

    async fn swipe(&self, from: Uuid, to: Uuid) -> StoreResult<Option<Swipe>> {
        let row: Option<SwipeRow> = sqlx::query_as(
            r#"
            SELECT swiper_id, target_id, kind, created_at
            FROM swipes
            WHERE swiper_id = $1 AND target_id = $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(SwipeRow::into_swipe).transpose()
    }

    async fn swiped_by(&self, from: Uuid) -> StoreResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT target_id FROM swipes WHERE swiper_id = $1")
                .bind(from)
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn connect(&self, a: Uuid, b: Uuid, super_like: bool) -> StoreResult<Connection> {
        let (user_a, user_b) = Connection::pair(a, b);
        let row: ConnectionRow = sqlx::query_as(
            r#"
            INSERT INTO connections (user_a, user_b, super_like)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(super_like)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)?;
        Ok(row.into())
    }

    async fn connection(&self, a: Uuid, b: Uuid) -> StoreResult<Option<Connection>> {
        let (user_a, user_b) = Connection::pair(a, b);
        let row: Option<ConnectionRow> =
            sqlx::query_as("SELECT * FROM connections WHERE user_a = $1 AND user_b = $2")
                .bind(user_a)
                .bind(user_b)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(row.map(Into::into))
    }

    async fn connections_of(&self, user: Uuid) -> StoreResult<Vec<Connection>> {
        let rows: Vec<ConnectionRow> = sqlx::query_as(
            "SELECT * FROM connections WHERE user_a = $1 OR user_b = $1 ORDER BY created_at DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn disconnect(&self, a: Uuid, b: Uuid) -> StoreResult<bool> {
        let (user_a, user_b) = Connection::pair(a, b);
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let removed = sqlx::query("DELETE FROM connections WHERE user_a = $1 AND user_b = $2")
            .bind(user_a)
            .bind(user_b)
            .execute(&mut *tx)
            .await
            .map_err(backend)?
            .rows_affected();
        if removed == 0 {
            tx.rollback().await.map_err(backend)?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            DELETE FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query(
            r#"
            DELETE FROM swipes
            WHERE (swiper_id = $1 AND target_id = $2)
               OR (swiper_id = $2 AND target_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(true)
    }

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message> {
        let row: MessageRow = sqlx::query_as(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.from)
        .bind(message.to)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)?;
        Ok(row.into())
    }

    async fn messages_between(&self, a: Uuid, b: Uuid) -> StoreResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY sent_at, id
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_messages_read(&self, reader: Uuid, other: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET read = TRUE
            WHERE recipient_id = $1 AND sender_id = $2 AND NOT read
            "#,
        )
        .bind(reader)
        .bind(other)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected())
    }

    async fn push_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        let row: NotificationRow = sqlx::query_as(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)?;
        Ok(row.into())
    }

    async fn notifications(&self, user: Uuid) -> StoreResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_notification_read(&self, user: Uuid, id: Uuid) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self, user: Uuid) -> StoreResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND NOT read")
                .bind(user)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        Ok(result.rows_affected())
    }
}
