//! Service layer
//!
//! Contains business logic separated from HTTP handlers.

mod auth;

pub use auth::AuthService;
