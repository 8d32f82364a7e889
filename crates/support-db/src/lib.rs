//! Database layer for the support service.
//!
//! Provides per-operation SQLite connections, the idempotent schema pass that
//! brings a database into its known structural state, and the user
//! registration transaction.
//!
//! # Design decisions
//!
//! - **One connection per operation**: every caller asks a
//!   [`ConnectionProvider`] for a fresh connection and drops it before
//!   returning. No pool is kept; connections are built by
//!   `r2d2_sqlite::SqliteConnectionManager` acting as a factory.
//! - **Absence, not failure**: a provider that cannot connect logs the cause
//!   and returns `None`. Callers turn that into a log entry or a user-facing
//!   notice; nothing in this crate panics on a missing database.
//! - **Embedded schema**: table definitions are compiled in via
//!   `include_str!` and applied in foreign-key dependency order.

mod connection;
mod schema;
mod users;

pub use connection::{ConnectionProvider, SqliteProvider, StoreSettings};
pub use schema::{
    apply_schema, initialize_schema, schema_tables, table_exists, SchemaError, SchemaOutcome,
};
pub use users::{find_user, register_user, RegistrationError};
