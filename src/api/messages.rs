//! Message views: creation form, single-message page, deletion.

use axum::Router;
use axum::extract::{Form, Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::render;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::auth::session::take_flash;
use crate::data::{MESSAGE_MAX_CHARS, NewMessage};
use crate::error::AppError;
use crate::metrics::{HTTP_REQUESTS_TOTAL, MESSAGES_CREATED_TOTAL};

/// Create message router
pub fn messages_router() -> Router<AppState> {
    Router::new()
        .route("/messages/new", get(new_form).post(create))
        .route("/messages/:message_id", get(show))
        .route("/messages/:message_id/delete", post(destroy))
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub text: String,
}

fn new_message_page(flash: Option<&str>) -> Html<String> {
    let body = format!(
        "<form method=\"POST\" action=\"/messages/new\">\
         <textarea name=\"text\" placeholder=\"What's happening?\" maxlength=\"{MESSAGE_MAX_CHARS}\"></textarea>\
         <button type=\"submit\">Add my message!</button>\
         </form>"
    );
    Html(render::page("New Message", flash, &body))
}

/// GET /messages/new
async fn new_form(CurrentUser(_user): CurrentUser, jar: CookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    (jar, new_message_page(flash.as_deref())).into_response()
}

/// POST /messages/new
///
/// Empty text re-renders the form; text over the character cap is a
/// validation error. On success the author's profile shows the new
/// message at the top.
async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let text = form.text.trim().to_string();
    if text.is_empty() {
        return Ok(new_message_page(Some("Message text is required.")).into_response());
    }
    if text.chars().count() > MESSAGE_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "message text must be at most {MESSAGE_MAX_CHARS} characters"
        )));
    }

    let new_message = NewMessage {
        text,
        user_id: user.id,
    };
    let message = state.db.insert_message(&new_message).await?;
    MESSAGES_CREATED_TOTAL.inc();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/messages/new", "302"])
        .inc();
    tracing::info!(
        username = %user.username,
        message_id = message.id,
        "message created"
    );

    Ok(super::found(&format!("/users/{}", user.id)))
}

/// GET /messages/:message_id
async fn show(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(message_id): Path<i64>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flash) = take_flash(jar);

    let message = state
        .db
        .get_message_with_author(message_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let body = render::message_item(&message);
    let title = format!("Message from @{}", message.username);
    Ok((jar, Html(render::page(&title, flash.as_deref(), &body))).into_response())
}

/// POST /messages/:message_id/delete
///
/// Only the author may delete; anyone else gets the unauthorized
/// redirect even when the message exists.
async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let message = state
        .db
        .get_message(message_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if message.user_id != user.id {
        return Err(AppError::Unauthorized);
    }

    state.db.delete_message(message.id).await?;
    tracing::info!(
        username = %user.username,
        message_id = message.id,
        "message deleted"
    );

    Ok(super::found(&format!("/users/{}", user.id)))
}
