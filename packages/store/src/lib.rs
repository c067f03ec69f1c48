//! Domain layer of Roomus: compatibility scoring, match ranking, swipes,
//! conversations, and the [`Store`] persistence trait with its in-memory
//! implementation.

pub mod compatibility;
pub mod conversations;
pub mod matching;
pub mod models;
pub mod ranking;
pub mod repo;

mod memory;
pub use memory::MemoryStore;

pub use compatibility::compatibility;
pub use models::{
    Answer, BudgetRange, Connection, Message, NewMessage, NewNotification, NewUser,
    Notification, NotificationKind, Preferences, Swipe, SwipeKind, UserInfo, UserRecord,
    UserSummary, MAX_ANSWER,
};
pub use ranking::{Candidate, CandidateFilter, RankedMatch};
pub use repo::{Store, StoreError, StoreResult};
