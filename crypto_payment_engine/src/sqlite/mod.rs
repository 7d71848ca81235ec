//! SQLite reference implementation of the host [`crate::traits::OrderStore`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
