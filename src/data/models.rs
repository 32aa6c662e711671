//! Data models
//!
//! Rust structs representing database entities. IDs are SQLite
//! AUTOINCREMENT rowids and timestamps use chrono.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Placeholder profile image applied when signup omits one
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";

/// Placeholder header image for new profiles
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// Maximum message length in characters
pub const MESSAGE_MAX_CHARS: usize = 140;

// =============================================================================
// User
// =============================================================================

/// A registered user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt digest ($2b$...), never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// A staged user pending insertion
///
/// `username` and `email` stay optional so that a missing value travels
/// to the store and fails there as an integrity violation when the row
/// is committed. Staging itself only guarantees the password digest.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub image_url: String,
}

/// Profile stat block, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub messages: i64,
    pub following: i64,
    pub followers: i64,
    pub likes: i64,
}

// =============================================================================
// Message
// =============================================================================

/// A short message ("warble"), at most 140 characters
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

/// A staged message pending insertion
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub text: String,
    pub user_id: i64,
}

/// A message joined with its author's public fields for rendering
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageWithAuthor {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub username: String,
    pub image_url: String,
}
