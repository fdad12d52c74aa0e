//! SQLite backend for the shop engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
