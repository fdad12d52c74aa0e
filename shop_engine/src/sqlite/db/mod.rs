//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction as the need arises and pass `&mut *tx`
//! through to the functions without any other changes.
//!
//! SQLite has no `SELECT ... FOR UPDATE`. Where a row must be locked for the rest of a transaction, the first statement
//! of that transaction is a write to the row. SQLite takes the database write lock at that point, so any other writer
//! waits (up to the busy timeout) until the transaction commits.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod branches;
pub mod carts;
pub mod catalog;
pub mod customers;
pub mod orders;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/shop.db";

pub fn db_url() -> String {
    let result = env::var("SHOP_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ SHOP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Backslash-escapes `\`, `%` and `_` so that search text only matches itself. Use the result with `ESCAPE '\'`.
pub(crate) fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
