//! Auth service
//!
//! Signup staging and credential verification, built on the data model
//! and the password hasher.

use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::data::{DEFAULT_IMAGE_URL, Database, NewUser, User};
use crate::error::AppError;

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Auth service
pub struct AuthService {
    db: Arc<Database>,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create new auth service
    pub fn new(db: Arc<Database>, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// Stage a new user for signup.
    ///
    /// Validates and hashes the password and applies the profile image
    /// placeholder, but never touches the store: the caller commits the
    /// staged user via [`Database::insert_user`], which is where
    /// uniqueness and non-null violations surface. A missing username
    /// or email therefore passes through staging untouched.
    ///
    /// # Errors
    /// [`AppError::Validation`] if the password is absent or empty
    pub fn signup(
        &self,
        username: Option<String>,
        email: Option<String>,
        password: Option<&str>,
        image_url: Option<String>,
    ) -> Result<NewUser, AppError> {
        let password = match password {
            Some(password) if !password.is_empty() => password,
            _ => {
                return Err(AppError::Validation(
                    "password must be non-empty".to_string(),
                ));
            }
        };

        let password_hash = hash_password(password, self.bcrypt_cost)?;
        let image_url =
            normalize_optional_text(image_url).unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string());

        tracing::debug!(username = ?username, "staged new user");

        Ok(NewUser {
            username,
            email,
            password_hash,
            image_url,
        })
    }

    /// Check a username/password pair.
    ///
    /// # Returns
    /// The matching user, or `None` for an unknown username or a wrong
    /// password. Bad credentials are a definite negative result, not an
    /// error.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(user) = self.db.get_user_by_username(username).await? else {
            tracing::debug!(username = %username, "authentication failed: unknown username");
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            tracing::info!(username = %username, "authentication succeeded");
            Ok(Some(user))
        } else {
            tracing::debug!(username = %username, "authentication failed: wrong password");
            Ok(None)
        }
    }
}
