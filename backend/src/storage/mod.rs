//! Storage layer: SQLite connection management and repositories.

pub mod db;
pub mod repositories;

pub use db::DbConnection;
pub use repositories::*;
