//! User views: index/search, profiles, follow edges, likes, profile
//! editing and account deletion.

use axum::Router;
use axum::extract::{Form, Path, Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::CookieJar;
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;

use super::render;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::auth::session::{removal_session_cookie, take_flash};
use crate::data::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, MessageWithAuthor, User};
use crate::error::AppError;
use crate::metrics::{FOLLOW_CHANGES_TOTAL, HTTP_REQUEST_DURATION_SECONDS, LIKES_TOGGLED_TOTAL};

/// Create user router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/profile", get(profile_form).post(update_profile))
        .route("/users/delete", post(delete_account))
        .route("/users/:user_id", get(show))
        .route("/users/:user_id/following", get(following))
        .route("/users/:user_id/followers", get(followers))
        .route("/users/:user_id/likes", get(likes))
        .route("/users/follow/:follow_id", post(follow))
        .route("/users/stop-following/:follow_id", post(stop_following))
        .route("/users/add_like/:message_id", post(add_like))
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub header_image_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub password: String,
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// GET /users
///
/// Without `q`: every user. With `q`: case-insensitive substring match
/// on username.
async fn index(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flash) = take_flash(jar);

    let users = match query.q.as_deref() {
        Some(q) if !q.is_empty() => state.db.search_users(q).await?,
        _ => state.db.list_users().await?,
    };

    let body = render::user_list(&users);
    Ok((jar, Html(render::page("Users", flash.as_deref(), &body))).into_response())
}

/// GET /users/:user_id
///
/// Public profile: header, the four stats, and the user's messages.
async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/users/:user_id"])
        .start_timer();
    let (jar, flash) = take_flash(jar);

    let user = state.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
    let stats = state.db.get_user_stats(user.id).await?;
    let messages: Vec<MessageWithAuthor> = state
        .db
        .get_messages_for_user(user.id)
        .await?
        .into_iter()
        .map(|message| MessageWithAuthor {
            id: message.id,
            text: message.text,
            created_at: message.created_at,
            user_id: message.user_id,
            username: user.username.clone(),
            image_url: user.image_url.clone(),
        })
        .collect();

    let body = format!(
        "{}\n{}",
        render::profile_header(&user, &stats),
        render::message_list(&messages),
    );
    let title = format!("@{}", user.username);
    Ok((jar, Html(render::page(&title, flash.as_deref(), &body))).into_response())
}

/// GET /users/:user_id/following
async fn following(
    State(state): State<AppState>,
    CurrentUser(_current): CurrentUser,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flash) = take_flash(jar);

    let user = state.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
    let stats = state.db.get_user_stats(user.id).await?;
    let followed = state.db.list_following(user.id).await?;

    let body = format!(
        "{}\n{}",
        render::profile_header(&user, &stats),
        render::user_list(&followed),
    );
    let title = format!("People @{} follows", user.username);
    Ok((jar, Html(render::page(&title, flash.as_deref(), &body))).into_response())
}

/// GET /users/:user_id/followers
async fn followers(
    State(state): State<AppState>,
    CurrentUser(_current): CurrentUser,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flash) = take_flash(jar);

    let user = state.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
    let stats = state.db.get_user_stats(user.id).await?;
    let follower_users = state.db.list_followers(user.id).await?;

    let body = format!(
        "{}\n{}",
        render::profile_header(&user, &stats),
        render::user_list(&follower_users),
    );
    let title = format!("People following @{}", user.username);
    Ok((jar, Html(render::page(&title, flash.as_deref(), &body))).into_response())
}

/// GET /users/:user_id/likes
async fn likes(
    State(state): State<AppState>,
    CurrentUser(_current): CurrentUser,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flash) = take_flash(jar);

    let user = state.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
    let stats = state.db.get_user_stats(user.id).await?;
    let liked = state.db.get_liked_messages(user.id).await?;

    let body = format!(
        "{}\n{}",
        render::profile_header(&user, &stats),
        render::message_list(&liked),
    );
    let title = format!("Messages @{} likes", user.username);
    Ok((jar, Html(render::page(&title, flash.as_deref(), &body))).into_response())
}

/// POST /users/follow/:follow_id
async fn follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(follow_id): Path<i64>,
) -> Result<Response, AppError> {
    let target = state
        .db
        .get_user(follow_id)
        .await?
        .ok_or(AppError::NotFound)?;

    state.db.insert_follow(user.id, target.id).await?;
    FOLLOW_CHANGES_TOTAL.with_label_values(&["follow"]).inc();
    tracing::info!(
        follower = %user.username,
        followed = %target.username,
        "follow edge created"
    );

    Ok(super::found(&format!("/users/{}/following", user.id)))
}

/// POST /users/stop-following/:follow_id
async fn stop_following(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(follow_id): Path<i64>,
) -> Result<Response, AppError> {
    let removed = state.db.delete_follow(user.id, follow_id).await?;
    if removed {
        FOLLOW_CHANGES_TOTAL.with_label_values(&["unfollow"]).inc();
        tracing::info!(
            follower = %user.username,
            followed_id = follow_id,
            "follow edge removed"
        );
    }

    Ok(super::found(&format!("/users/{}/following", user.id)))
}

/// POST /users/add_like/:message_id
///
/// Toggles the like: a second POST for the same message removes it.
async fn add_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let message = state
        .db
        .get_message(message_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let liked = state.db.toggle_like(user.id, message.id).await?;
    let action = if liked { "liked" } else { "unliked" };
    LIKES_TOGGLED_TOTAL.with_label_values(&[action]).inc();
    tracing::debug!(
        username = %user.username,
        message_id = message.id,
        action = action,
        "like toggled"
    );

    Ok(super::found("/"))
}

fn profile_page(user: &User, flash: Option<&str>) -> Html<String> {
    let body = format!(
        "<h2>Edit Your Profile.</h2>\n\
         <form method=\"POST\" action=\"/users/profile\">\
         <input name=\"username\" value=\"{username}\">\
         <input name=\"email\" type=\"email\" value=\"{email}\">\
         <input name=\"image_url\" value=\"{image}\">\
         <input name=\"header_image_url\" value=\"{header}\">\
         <textarea name=\"bio\">{bio}</textarea>\
         <input name=\"location\" value=\"{location}\">\
         <input name=\"password\" type=\"password\" placeholder=\"Password to confirm changes\">\
         <button type=\"submit\">Edit this user!</button>\
         </form>\n\
         <form method=\"POST\" action=\"/users/delete\">\
         <button type=\"submit\">Delete Profile</button>\
         </form>",
        username = encode_double_quoted_attribute(&user.username),
        email = encode_double_quoted_attribute(&user.email),
        image = encode_double_quoted_attribute(&user.image_url),
        header = encode_double_quoted_attribute(&user.header_image_url),
        bio = encode_text(user.bio.as_deref().unwrap_or("")),
        location = encode_double_quoted_attribute(user.location.as_deref().unwrap_or("")),
    );
    Html(render::page("Edit Profile", flash, &body))
}

/// GET /users/profile
async fn profile_form(CurrentUser(user): CurrentUser, jar: CookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    (jar, profile_page(&user, flash.as_deref())).into_response()
}

/// POST /users/profile
///
/// Re-authenticates with the submitted password before changing
/// anything; a wrong password is the standard unauthorized outcome.
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    if state
        .auth
        .authenticate(&user.username, &form.password)
        .await?
        .is_none()
    {
        return Err(AppError::Unauthorized);
    }

    let updated = User {
        id: user.id,
        username: form.username,
        email: form.email,
        password_hash: user.password_hash,
        image_url: normalize_optional(form.image_url)
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
        header_image_url: normalize_optional(form.header_image_url)
            .unwrap_or_else(|| DEFAULT_HEADER_IMAGE_URL.to_string()),
        bio: normalize_optional(form.bio),
        location: normalize_optional(form.location),
    };

    match state.db.update_user(&updated).await {
        Ok(()) => {
            tracing::info!(username = %updated.username, "profile updated");
            Ok(super::found(&format!("/users/{}", updated.id)))
        }
        Err(AppError::Integrity(_)) => {
            Ok(profile_page(&updated, Some("Username already taken")).into_response())
        }
        Err(error) => Err(error),
    }
}

/// POST /users/delete
///
/// Ends the session and removes the user; messages and likes go with
/// the row via the cascade rules.
async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let jar = jar.remove(removal_session_cookie());
    state.db.delete_user(user.id).await?;
    tracing::info!(username = %user.username, "account deleted");

    Ok((jar, super::found("/signup")).into_response())
}
