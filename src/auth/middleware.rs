//! Authentication extractors
//!
//! Resolve the session cookie to a stored user on every request.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::session::{CURR_USER_COOKIE, verify_session_token};
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(CURR_USER_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

/// Verify the token and load the user it names.
///
/// A valid signature over an id that no longer resolves to a user is
/// still unauthorized; the session key alone proves nothing.
async fn resolve_user(token: &str, state: &AppState) -> Result<User, AppError> {
    let session = verify_session_token(token, &state.config.auth.session_secret)?;
    state
        .db
        .get_user(session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Extractor for the current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, @{}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let app_state = AppState::from_ref(state);
        let token = extract_session_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = resolve_user(&token, &app_state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(MaybeUser(Some(user)));
        }

        let app_state = AppState::from_ref(state);
        let user = match extract_session_token(&parts.headers) {
            Some(token) => resolve_user(&token, &app_state).await.ok(),
            None => None,
        };

        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }

        Ok(MaybeUser(user))
    }
}
