use anyhow::Context;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::forms::{normalize_email, LoginForm, RegisterForm};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{
    clear_session_cookie, extract_session_token, session_cookie, Session,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::User;
use crate::views;

/// One generic message for unknown email and wrong password alike, so a
/// failed login does not reveal which accounts exist.
const LOGIN_FAILED: &str = "Email or Password does not match.";
const LOGIN_FORMAT: &str = "Invalid email or password format.";
const REGISTER_FORMAT: &str = "Invalid input format.";
const EMAIL_TAKEN: &str = "Email is already in use.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/register", get(register_form).post(register))
        .route("/logout", post(logout))
}

async fn login_form() -> Html<String> {
    Html(views::login_page(""))
}

async fn register_form() -> Html<String> {
    Html(views::register_page(""))
}

#[instrument(skip(state, form))]
async fn login(
    State(state): State<AppState>,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, AppError> {
    form.email = normalize_email(&form.email);

    if form.validate().is_err() {
        return Ok(Html(views::login_page(LOGIN_FORMAT)).into_response());
    }

    let Some(user) = User::find_by_email(&state.db, &form.email).await? else {
        warn!(email = %form.email, "login unknown email");
        return Ok(Html(views::login_page(LOGIN_FAILED)).into_response());
    };

    // A malformed stored hash counts as a failed verification.
    let ok = verify_password(&form.password, &user.password_hash).unwrap_or(false);
    if !ok {
        warn!(email = %form.email, user_id = %user.id, "login invalid password");
        return Ok(Html(views::login_page(LOGIN_FAILED)).into_response());
    }

    let (session, token) = Session::create(&state.db, &state.config.session, &user).await?;
    let cookie = session_cookie(&token, state.config.session.ttl_minutes * 60)
        .context("build session cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    info!(user_id = %user.id, session_id = %session.id, is_admin = session.is_admin, "user logged in");
    Ok((headers, Redirect::to("/members")).into_response())
}

#[instrument(skip(state, form))]
async fn register(
    State(state): State<AppState>,
    Form(mut form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    form.email = normalize_email(&form.email);

    if form.validate().is_err() {
        return Ok(Html(views::register_page(REGISTER_FORMAT)).into_response());
    }

    let hash = hash_password(&form.password)?;

    match User::create(&state.db, form.username.trim(), &form.email, &hash).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(Redirect::to("/login").into_response())
        }
        Err(AppError::DuplicateEmail) => {
            warn!(email = %form.email, "registration with taken email");
            Ok(Html(views::register_page(EMAIL_TAKEN)).into_response())
        }
        Err(err) => Err(err),
    }
}

#[instrument(skip(state, headers))]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = extract_session_token(&headers) {
        Session::destroy_by_token(&state.db, &state.config.session.secret, &token).await?;
        info!("session destroyed");
    }

    // Clear the cookie even if there was no session record behind it.
    let mut out = HeaderMap::new();
    out.insert(SET_COOKIE, clear_session_cookie());
    Ok((out, Redirect::to("/")).into_response())
}
