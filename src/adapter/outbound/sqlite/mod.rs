//! SQLite persistence for the trade journal, using Diesel ORM.

pub mod connection;
pub mod journal;
pub mod model;
pub mod schema;

pub use connection::{create_pool, run_migrations, DbPool};
pub use journal::SqliteJournal;
