//! # SQLite database methods
//!
//! Low-level SQLite interactions, as plain functions that take a `&mut SqliteConnection`. Callers can pass a pooled
//! connection, or `&mut *tx` to run several of them atomically.
use std::{env, str::FromStr};

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod metadata;
pub mod orders;

const SQLITE_DB_URL: &str = "sqlite://data/crypto_payments.db";

pub fn db_url() -> String {
    let result = env::var("CPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ CPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// A connection pool for `url`. The database file is created if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
