//! Swipe recording and mutual-match detection.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Connection, NewNotification, SwipeKind, UserRecord};
use crate::repo::{Store, StoreError, StoreResult};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SwipeOutcome {
    /// True only when this swipe created a new connection.
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
}

impl SwipeOutcome {
    fn no_match() -> Self {
        Self {
            matched: false,
            connection: None,
        }
    }
}

/// Record `from`'s swipe on `to`. When both sides have swiped positively and the
/// pair is not connected yet, connect them and notify both. The connection stands
/// even if a notification cannot be stored.
pub async fn apply_swipe(
    store: &dyn Store,
    from: &UserRecord,
    to: &UserRecord,
    kind: SwipeKind,
) -> StoreResult<SwipeOutcome> {
    if from.id == to.id {
        return Err(StoreError::InvalidInput(
            "You cannot swipe on yourself".to_string(),
        ));
    }

    store.record_swipe(from.id, to.id, kind).await?;
    if !kind.is_positive() {
        return Ok(SwipeOutcome::no_match());
    }

    let reciprocal = match store.swipe(to.id, from.id).await? {
        Some(swipe) if swipe.kind.is_positive() => swipe,
        _ => return Ok(SwipeOutcome::no_match()),
    };
    if store.connection(from.id, to.id).await?.is_some() {
        return Ok(SwipeOutcome::no_match());
    }

    let super_like = kind == SwipeKind::SuperLike || reciprocal.kind == SwipeKind::SuperLike;
    let connection = match store.connect(from.id, to.id, super_like).await {
        Ok(connection) => connection,
        // the other side's swipe connected us first
        Err(StoreError::Conflict) => return Ok(SwipeOutcome::no_match()),
        Err(e) => return Err(e),
    };
    debug!(a = %from.id, b = %to.id, super_like, "mutual match");

    for notification in [
        NewNotification::matched(from.id, &to.name),
        NewNotification::matched(to.id, &from.name),
    ] {
        let user_id = notification.user_id;
        if let Err(e) = store.push_notification(notification).await {
            warn!(user_id = %user_id, error = %e, "failed to store match notification");
        }
    }

    Ok(SwipeOutcome {
        matched: true,
        connection: Some(connection),
    })
}
