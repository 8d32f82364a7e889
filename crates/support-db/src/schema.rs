//! Idempotent schema initialization.
//!
//! The schema is a fixed, ordered list of `CREATE TABLE IF NOT EXISTS`
//! statements. They run in foreign-key dependency order inside a single
//! transaction that is committed once. Re-running the pass against a database
//! that already has the tables is a no-op, so concurrent passes are harmless.

use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;

use crate::connection::ConnectionProvider;

/// A single embedded table definition.
#[derive(Debug, Clone, Copy)]
struct SchemaStatement {
    table: &'static str,
    /// Tables this one references; they must exist before it is created.
    depends_on: &'static [&'static str],
    sql: &'static str,
}

/// All tables in creation order.
const SCHEMA: &[SchemaStatement] = &[
    SchemaStatement {
        table: "users",
        depends_on: &[],
        sql: include_str!("schema/000_users.sql"),
    },
    SchemaStatement {
        table: "issues",
        depends_on: &["users"],
        sql: include_str!("schema/001_issues.sql"),
    },
    SchemaStatement {
        table: "logins",
        depends_on: &["users"],
        sql: include_str!("schema/002_logins.sql"),
    },
    SchemaStatement {
        table: "knowledge_articles",
        depends_on: &["issues"],
        sql: include_str!("schema/003_knowledge_articles.sql"),
    },
];

/// Errors that can occur during the schema pass.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A table was about to be created before a table it references.
    #[error("table '{table}' references missing table '{dependency}'")]
    MissingDependency {
        /// The table whose creation was refused.
        table: String,
        /// The referenced table that does not exist yet.
        dependency: String,
    },

    /// A create statement failed.
    #[error("creating table '{table}' failed: {source}")]
    StatementFailed {
        /// The table whose statement failed.
        table: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Beginning or committing the schema transaction failed.
    #[error("schema transaction failed: {0}")]
    Transaction(rusqlite::Error),
}

/// What a call to [`initialize_schema`] did.
#[derive(Debug)]
pub enum SchemaOutcome {
    /// Initialization was disabled for this run; the store was not touched.
    Skipped,
    /// The provider had no connection to hand out.
    NoConnection,
    /// The pass committed; carries the number of statements issued.
    Applied(usize),
    /// The pass was abandoned and rolled back.
    Failed(SchemaError),
}

impl SchemaOutcome {
    /// Whether the schema pass committed.
    pub fn is_applied(&self) -> bool {
        matches!(self, SchemaOutcome::Applied(_))
    }
}

/// Brings the store into its known structural state.
///
/// With `skip` set, logs and returns without asking `provider` for a
/// connection. Otherwise opens one connection, applies every table
/// definition, and releases the connection before returning. Failures are
/// logged and reported through the returned [`SchemaOutcome`]; this function
/// never panics.
pub fn initialize_schema<P>(provider: &P, skip: bool) -> SchemaOutcome
where
    P: ConnectionProvider + ?Sized,
{
    if skip {
        tracing::info!("SKIP_DB_INIT set, skipping database initialization");
        return SchemaOutcome::Skipped;
    }

    let Some(mut conn) = provider.connect() else {
        tracing::error!("no database connection available, skipping schema creation");
        return SchemaOutcome::NoConnection;
    };

    match apply_schema(&mut conn) {
        Ok(count) => {
            tracing::info!(statements = count, "database initialized successfully");
            SchemaOutcome::Applied(count)
        }
        Err(e) => {
            tracing::error!(error = %e, "database initialization failed");
            SchemaOutcome::Failed(e)
        }
    }
}

/// Applies every table definition on `conn` and commits once.
///
/// Returns the number of statements issued. On error the transaction is
/// rolled back and no table from this pass is left behind.
///
/// # Errors
///
/// Returns [`SchemaError`] if a dependency is missing, a statement fails, or
/// the transaction cannot be started or committed.
pub fn apply_schema(conn: &mut Connection) -> Result<usize, SchemaError> {
    apply_statements(conn, SCHEMA)
}

/// Names of the tables the schema creates, in creation order.
pub fn schema_tables() -> impl Iterator<Item = &'static str> {
    SCHEMA.iter().map(|statement| statement.table)
}

/// Whether a table with the given name exists.
///
/// # Errors
///
/// Returns the underlying SQLite error if `sqlite_master` cannot be read.
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table],
        |row| row.get(0),
    )
}

fn apply_statements(
    conn: &mut Connection,
    statements: &[SchemaStatement],
) -> Result<usize, SchemaError> {
    // IMMEDIATE takes the write lock up front, so a concurrent pass waits on
    // busy_timeout rather than failing a read-to-write upgrade.
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(SchemaError::Transaction)?;

    for statement in statements {
        for dependency in statement.depends_on {
            let present =
                table_exists(&tx, dependency).map_err(|e| SchemaError::StatementFailed {
                    table: statement.table.to_string(),
                    source: e,
                })?;
            if !present {
                return Err(SchemaError::MissingDependency {
                    table: statement.table.to_string(),
                    dependency: (*dependency).to_string(),
                });
            }
        }

        tracing::debug!(table = statement.table, "ensuring table exists");

        tx.execute_batch(statement.sql)
            .map_err(|e| SchemaError::StatementFailed {
                table: statement.table.to_string(),
                source: e,
            })?;
    }

    tx.commit().map_err(SchemaError::Transaction)?;

    Ok(statements.len())
}
