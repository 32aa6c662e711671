//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Entity models and staged (pre-commit) forms

mod database;
mod models;

pub use database::Database;
pub use models::*;
