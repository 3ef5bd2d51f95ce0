//! Data layer
//!
//! - `database`: SQLite access via sqlx
//! - `models`: entity structs

mod database;
mod models;

pub use database::Database;
pub use models::{SessionRecord, User, UserId};
