use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use crate::auth::guards::AdminSession;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::{parse_user_id, User};
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_page))
        .route("/promote/:user_id", post(promote))
        .route("/demote/:user_id", post(demote))
}

#[instrument(skip(state, session))]
async fn admin_page(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<Html<String>, AppError> {
    let users = User::list_all(&state.db).await?;
    Ok(Html(views::admin_page(&users, session.is_auth, None)))
}

#[instrument(skip(state, _session))]
async fn promote(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(user_id): Path<String>,
) -> Result<Redirect, AppError> {
    set_admin(&state, &user_id, true).await
}

#[instrument(skip(state, _session))]
async fn demote(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(user_id): Path<String>,
) -> Result<Redirect, AppError> {
    set_admin(&state, &user_id, false).await
}

/// Malformed ids never reach the store; they bounce straight back to the
/// admin page. A well-formed id for a missing user is a silent no-op.
async fn set_admin(state: &AppState, raw_id: &str, grant: bool) -> Result<Redirect, AppError> {
    let Ok(id) = parse_user_id(raw_id) else {
        warn!(raw_id, "malformed user id in promote/demote");
        return Ok(Redirect::to("/admin"));
    };
    User::set_admin_flag(&state.db, id, grant).await?;
    info!(user_id = %id, is_admin = grant, "admin flag updated");
    Ok(Redirect::to("/admin"))
}
