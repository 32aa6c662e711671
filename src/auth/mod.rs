//! Authentication
//!
//! Handles:
//! - bcrypt password hashing
//! - HMAC-signed session cookies
//! - Per-request user resolution

mod middleware;
pub mod password;
pub mod session;

pub use middleware::{CurrentUser, MaybeUser};
pub use session::{Session, create_session_token, verify_session_token};
