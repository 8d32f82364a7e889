//! User registration and lookup.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use support_types::{NewUser, User};
use thiserror::Error;

use crate::connection::ConnectionProvider;

/// Errors that can occur while registering a user.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The provider had no connection; nothing was attempted.
    #[error("database connection unavailable")]
    NoConnection,

    /// The store rejected the insert or the commit. Displays the store's own
    /// message, e.g. `UNIQUE constraint failed: users.username`.
    #[error("{0}")]
    Store(#[from] rusqlite::Error),
}

impl RegistrationError {
    /// Whether the store refused the row because the username is taken.
    pub fn is_duplicate_username(&self) -> bool {
        match self {
            RegistrationError::Store(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            }
            _ => false,
        }
    }
}

/// Inserts one `users` row and commits it.
///
/// Opens its own connection from `provider` and releases it on every path.
/// The id and creation timestamp are assigned by the store; the returned
/// value is the new row's id. Failures are not retried.
///
/// # Errors
///
/// Returns [`RegistrationError::NoConnection`] if the provider has no
/// connection, or [`RegistrationError::Store`] if the insert or commit fails
/// (most commonly a duplicate username).
pub fn register_user<P>(provider: &P, user: &NewUser) -> Result<i64, RegistrationError>
where
    P: ConnectionProvider + ?Sized,
{
    let mut conn = provider.connect().ok_or(RegistrationError::NoConnection)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT INTO users (username, password, name) VALUES (?1, ?2, ?3)",
        params![user.username(), user.password(), user.name()],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    tracing::info!(user_id = id, username = user.username(), "registered user");

    Ok(id)
}

/// Looks up a user by username.
///
/// # Errors
///
/// Returns the underlying SQLite error on query failure.
pub fn find_user(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, name, created_at FROM users WHERE username = ?1",
        [username],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                name: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
}
