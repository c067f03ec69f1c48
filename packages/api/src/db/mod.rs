//! # Database module — PostgreSQL pool and the `PgStore` backend
//!
//! - [`connect`] — opens a [`sqlx::PgPool`] from [`crate::settings::Database`].
//! - [`migrate`] — runs the embedded migrations in `packages/api/migrations`.
//! - [`PgStore`] — the production implementation of [`store::Store`]. All queries are
//!   runtime-checked (`sqlx::query` / `sqlx::query_as` with `FromRow` row types), so
//!   building the crate does not need a live database.

mod pool;
mod postgres;

pub use pool::{connect, migrate};
pub use postgres::PgStore;
