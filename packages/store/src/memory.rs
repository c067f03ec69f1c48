use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Answer, Connection, Message, NewMessage, NewNotification, NewUser, Notification,
    Preferences, Swipe, SwipeKind, UserRecord,
};
use crate::repo::{Store, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    swipes: HashMap<(Uuid, Uuid), Swipe>,
    connections: HashMap<(Uuid, Uuid), Connection>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    #[cfg(test)]
    notifications_down: bool,
}

/// In-memory Store for tests and local development.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn update_user(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut UserRecord),
    ) -> StoreResult<UserRecord> {
        let mut tables = self.tables()?;
        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    /// Make every later `push_notification` fail with a backend error.
    #[cfg(test)]
    pub(crate) fn fail_notifications(&self) {
        if let Ok(mut tables) = self.tables() {
            tables.notifications_down = true;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_premium: false,
            answers: Vec::new(),
            preferences: Preferences::default(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn user(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn users_except(&self, id: Uuid) -> StoreResult<Vec<UserRecord>> {
        let tables = self.tables()?;
        let mut users: Vec<UserRecord> = tables
            .users
            .values()
            .filter(|u| u.id != id)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn save_answers(&self, id: Uuid, answers: Vec<Answer>) -> StoreResult<UserRecord> {
        self.update_user(id, |u| u.answers = answers)
    }

    async fn update_preferences(
        &self,
        id: Uuid,
        preferences: Preferences,
    ) -> StoreResult<UserRecord> {
        self.update_user(id, |u| u.preferences = preferences)
    }

    async fn set_premium(&self, id: Uuid, is_premium: bool) -> StoreResult<UserRecord> {
        self.update_user(id, |u| u.is_premium = is_premium)
    }

    async fn record_swipe(&self, from: Uuid, to: Uuid, kind: SwipeKind) -> StoreResult<Swipe> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&from) || !tables.users.contains_key(&to) {
            return Err(StoreError::NotFound);
        }
        let swipe = Swipe {
            from,
            to,
            kind,
            created_at: Utc::now(),
        };
        tables.swipes.insert((from, to), swipe.clone());
        Ok(swipe)
    }

    async fn swipe(&self, from: Uuid, to: Uuid) -> StoreResult<Option<Swipe>> {
        Ok(self.tables()?.swipes.get(&(from, to)).cloned())
    }

    async fn swiped_by(&self, from: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .tables()?
            .swipes
            .keys()
            .filter(|(f, _)| *f == from)
            .map(|(_, to)| *to)
            .collect())
    }

    async fn connect(&self, a: Uuid, b: Uuid, super_like: bool) -> StoreResult<Connection> {
        let mut tables = self.tables()?;
        let key = Connection::pair(a, b);
        if tables.connections.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        let connection = Connection {
            user_a: key.0,
            user_b: key.1,
            super_like,
            created_at: Utc::now(),
        };
        tables.connections.insert(key, connection.clone());
        Ok(connection)
    }

    async fn connection(&self, a: Uuid, b: Uuid) -> StoreResult<Option<Connection>> {
        Ok(self
            .tables()?
            .connections
            .get(&Connection::pair(a, b))
            .cloned())
    }

    async fn connections_of(&self, user: Uuid) -> StoreResult<Vec<Connection>> {
        let tables = self.tables()?;
        let mut connections: Vec<Connection> = tables
            .connections
            .values()
            .filter(|c| c.involves(user))
            .cloned()
            .collect();
        connections.sort_by(|x, y| y.created_at.cmp(&x.created_at));
        Ok(connections)
    }

    async fn disconnect(&self, a: Uuid, b: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        if tables.connections.remove(&Connection::pair(a, b)).is_none() {
            return Ok(false);
        }
        tables.messages.retain(|m| !m.between(a, b));
        tables.swipes.remove(&(a, b));
        tables.swipes.remove(&(b, a));
        Ok(true)
    }

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut tables = self.tables()?;
        let message = Message {
            id: Uuid::new_v4(),
            from: message.from,
            to: message.to,
            body: message.body,
            sent_at: Utc::now(),
            read: false,
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn messages_between(&self, a: Uuid, b: Uuid) -> StoreResult<Vec<Message>> {
        Ok(self
            .tables()?
            .messages
            .iter()
            .filter(|m| m.between(a, b))
            .cloned()
            .collect())
    }

    async fn mark_messages_read(&self, reader: Uuid, other: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables()?;
        let mut updated = 0;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.from == other && m.to == reader && !m.read)
        {
            message.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn push_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        let mut tables = self.tables()?;
        #[cfg(test)]
        if tables.notifications_down {
            return Err(StoreError::Backend("notifications unavailable".to_string()));
        }
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            read: false,
            created_at: Utc::now(),
        };
        tables.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn notifications(&self, user: Uuid) -> StoreResult<Vec<Notification>> {
        // pushed in time order, so reversing gives newest first
        Ok(self
            .tables()?
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, user: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables()?;
        let mut updated = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user && !n.read)
        {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    async fn add_user(store: &MemoryStore, email: &str, name: &str) -> UserRecord {
        store
            .create_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read_user() {
        let store = MemoryStore::new();

        // Initially empty
        assert!(store.user_by_email("alex@example.com").await.unwrap().is_none());

        let alex = add_user(&store, "alex@example.com", "Alex").await;
        assert!(!alex.is_premium);
        assert!(alex.answers.is_empty());

        let loaded = store.user(alex.id).await.unwrap().unwrap();
        assert_eq!(loaded, alex);
        let by_email = store.user_by_email("alex@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(alex.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        add_user(&store, "alex@example.com", "Alex").await;

        let err = store
            .create_user(NewUser {
                email: "alex@example.com".to_string(),
                name: "Other".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_users_except_skips_self() {
        let store = MemoryStore::new();
        let alex = add_user(&store, "alex@example.com", "Alex").await;
        add_user(&store, "sam@example.com", "Sam").await;
        add_user(&store, "kim@example.com", "Kim").await;

        let others = store.users_except(alex.id).await.unwrap();
        assert_eq!(others.len(), 2);
        assert!(others.iter().all(|u| u.id != alex.id));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let err = store.set_premium(Uuid::new_v4(), true).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_swipe_is_replaced() {
        let store = MemoryStore::new();
        let alex = add_user(&store, "alex@example.com", "Alex").await;
        let sam = add_user(&store, "sam@example.com", "Sam").await;

        store.record_swipe(alex.id, sam.id, SwipeKind::Dislike).await.unwrap();
        store.record_swipe(alex.id, sam.id, SwipeKind::Like).await.unwrap();

        let swipe = store.swipe(alex.id, sam.id).await.unwrap().unwrap();
        assert_eq!(swipe.kind, SwipeKind::Like);
        assert_eq!(store.swiped_by(alex.id).await.unwrap(), vec![sam.id]);
        assert!(store.swipe(sam.id, alex.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connection_is_unordered_and_unique() {
        let store = MemoryStore::new();
        let alex = add_user(&store, "alex@example.com", "Alex").await;
        let sam = add_user(&store, "sam@example.com", "Sam").await;

        store.connect(alex.id, sam.id, false).await.unwrap();
        assert!(store.connection(sam.id, alex.id).await.unwrap().is_some());
        assert!(matches!(
            store.connect(sam.id, alex.id, true).await,
            Err(StoreError::Conflict)
        ));
        assert_eq!(store.connections_of(sam.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_removes_conversation_and_swipes() {
        let store = MemoryStore::new();
        let alex = add_user(&store, "alex@example.com", "Alex").await;
        let sam = add_user(&store, "sam@example.com", "Sam").await;
        let kim = add_user(&store, "kim@example.com", "Kim").await;

        store.record_swipe(alex.id, sam.id, SwipeKind::Like).await.unwrap();
        store.record_swipe(sam.id, alex.id, SwipeKind::Like).await.unwrap();
        store.connect(alex.id, sam.id, false).await.unwrap();
        store.connect(alex.id, kim.id, false).await.unwrap();
        for (from, to) in [(alex.id, sam.id), (sam.id, alex.id), (alex.id, kim.id)] {
            store
                .append_message(NewMessage {
                    from,
                    to,
                    body: "hi".to_string(),
                })
                .await
                .unwrap();
        }

        assert!(store.disconnect(sam.id, alex.id).await.unwrap());
        assert!(store.messages_between(alex.id, sam.id).await.unwrap().is_empty());
        assert!(store.swipe(alex.id, sam.id).await.unwrap().is_none());
        assert!(store.swipe(sam.id, alex.id).await.unwrap().is_none());
        // other conversations are untouched
        assert_eq!(store.messages_between(alex.id, kim.id).await.unwrap().len(), 1);

        // second disconnect is a no-op
        assert!(!store.disconnect(alex.id, sam.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_messages_read_only_touches_incoming() {
        let store = MemoryStore::new();
        let alex = add_user(&store, "alex@example.com", "Alex").await;
        let sam = add_user(&store, "sam@example.com", "Sam").await;

        for (from, to) in [(sam.id, alex.id), (sam.id, alex.id), (alex.id, sam.id)] {
            store
                .append_message(NewMessage {
                    from,
                    to,
                    body: "hey".to_string(),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.mark_messages_read(alex.id, sam.id).await.unwrap(), 2);
        assert_eq!(store.mark_messages_read(alex.id, sam.id).await.unwrap(), 0);

        let messages = store.messages_between(alex.id, sam.id).await.unwrap();
        assert_eq!(messages.iter().filter(|m| m.read).count(), 2);
        assert!(!messages[2].read);
    }

    #[tokio::test]
    async fn test_notifications_newest_first_and_scoped() {
        let store = MemoryStore::new();
        let alex = add_user(&store, "alex@example.com", "Alex").await;
        let sam = add_user(&store, "sam@example.com", "Sam").await;

        store
            .push_notification(NewNotification::matched(alex.id, "Sam"))
            .await
            .unwrap();
        let premium = store
            .push_notification(NewNotification::premium(alex.id))
            .await
            .unwrap();
        let sams = store
            .push_notification(NewNotification::matched(sam.id, "Alex"))
            .await
            .unwrap();

        let list = store.notifications(alex.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].kind, NotificationKind::Premium);

        // cannot mark someone else's notification
        assert!(!store.mark_notification_read(alex.id, sams.id).await.unwrap());
        assert!(store.mark_notification_read(alex.id, premium.id).await.unwrap());
        assert_eq!(store.mark_all_notifications_read(alex.id).await.unwrap(), 1);
        assert_eq!(store.mark_all_notifications_read(alex.id).await.unwrap(), 0);
    }
}
