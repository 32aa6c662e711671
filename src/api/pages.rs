//! Page routes: home feed, signup, login, logout

use axum::Router;
use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::render;
use crate::AppState;
use crate::auth::session::{
    Session, create_session_token, flash_cookie, removal_session_cookie, session_cookie,
    take_flash,
};
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::metrics::{AUTH_ATTEMPTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS, SIGNUPS_TOTAL};

/// The home feed shows at most this many messages
const HOME_FEED_LIMIT: i64 = 100;

/// Create page router
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/signup", get(signup_form).post(signup))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// GET /
///
/// Logged in: the last [`HOME_FEED_LIMIT`] messages from followed
/// users and the user themself. Anonymous: a landing page. Either way
/// this is where flash messages (including every unauthorized warning)
/// get rendered.
async fn home(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/"])
        .start_timer();
    let (jar, flash) = take_flash(jar);

    let body = match &user {
        Some(user) => {
            let feed = state.db.get_feed_messages(user.id, HOME_FEED_LIMIT).await?;
            format!(
                "<form method=\"POST\" action=\"/messages/new\">\
                 <textarea name=\"text\" maxlength=\"140\" placeholder=\"What's happening?\"></textarea>\
                 <button type=\"submit\">Add my message!</button>\
                 </form>\n{}",
                render::message_list(&feed),
            )
        }
        None => "<div class=\"home-hero\">\
                 <h1>What's Happening?</h1>\
                 <p>Sign up now to get your own personalized timeline!</p>\
                 <a href=\"/signup\" class=\"btn\">Sign up</a>\
                 </div>"
            .to_string(),
    };

    Ok((jar, Html(render::page("Home", flash.as_deref(), &body))).into_response())
}

fn signup_page(flash: Option<&str>) -> Html<String> {
    let body = "<h2>Join Warbler today.</h2>\n\
                <form method=\"POST\" action=\"/signup\">\
                <input name=\"username\" placeholder=\"Username\">\
                <input name=\"email\" type=\"email\" placeholder=\"E-mail\">\
                <input name=\"password\" type=\"password\" placeholder=\"Password\">\
                <input name=\"image_url\" placeholder=\"(Optional) Image URL\">\
                <button type=\"submit\">Sign me up!</button>\
                </form>";
    Html(render::page("Sign up", flash, body))
}

/// GET /signup
async fn signup_form(jar: CookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    (jar, signup_page(flash.as_deref())).into_response()
}

/// POST /signup
///
/// Stages the new user, commits it, and starts a session. A duplicate
/// username or email surfaces as an integrity error at the commit and
/// re-renders the form; an invalid password never reaches the store.
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let staged = match state.auth.signup(
        Some(form.username),
        Some(form.email),
        Some(&form.password),
        form.image_url,
    ) {
        Ok(staged) => staged,
        Err(AppError::Validation(message)) => {
            return Ok(signup_page(Some(&message)).into_response());
        }
        Err(error) => return Err(error),
    };

    let user = match state.db.insert_user(&staged).await {
        Ok(user) => user,
        Err(AppError::Integrity(_)) => {
            return Ok(signup_page(Some("Username already taken")).into_response());
        }
        Err(error) => return Err(error),
    };

    SIGNUPS_TOTAL.inc();
    tracing::info!(username = %user.username, "user signed up");

    let session = Session::new(user.id, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let jar = jar.add(session_cookie(
        token,
        state.config.should_use_secure_cookies(),
    ));

    Ok((jar, super::found("/")).into_response())
}

fn login_page(flash: Option<&str>) -> Html<String> {
    let body = "<h2>Welcome back.</h2>\n\
                <form method=\"POST\" action=\"/login\">\
                <input name=\"username\" placeholder=\"Username\">\
                <input name=\"password\" type=\"password\" placeholder=\"Password\">\
                <button type=\"submit\">Log in</button>\
                </form>";
    Html(render::page("Log in", flash, body))
}

/// GET /login
async fn login_form(jar: CookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    (jar, login_page(flash.as_deref())).into_response()
}

/// POST /login
///
/// Wrong credentials re-render the form; they are a negative result,
/// not an error.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/login"])
        .start_timer();

    let Some(user) = state.auth.authenticate(&form.username, &form.password).await? else {
        AUTH_ATTEMPTS_TOTAL.with_label_values(&["failure"]).inc();
        tracing::warn!(username = %form.username, "login rejected");
        return Ok(login_page(Some("Invalid credentials.")).into_response());
    };

    AUTH_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();

    let session = Session::new(user.id, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let jar = jar
        .add(session_cookie(
            token,
            state.config.should_use_secure_cookies(),
        ))
        .add(flash_cookie(&format!("Hello, {}!", user.username)));

    Ok((jar, super::found("/")).into_response())
}

/// GET /logout
async fn logout(CurrentUser(user): CurrentUser, jar: CookieJar) -> Result<Response, AppError> {
    tracing::info!(username = %user.username, "user logged out");

    let jar = jar
        .remove(removal_session_cookie())
        .add(flash_cookie("You have successfully logged out."));

    Ok((jar, super::found("/login")).into_response())
}
