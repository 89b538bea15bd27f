//! Request gates, implemented as extractors so handlers state their access
//! requirement in their signature.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::error;

use crate::auth::session::{extract_session_token, Session};
use crate::error::AppError;
use crate::state::AppState;
use crate::views;

async fn resolve_session(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Option<Session>, AppError> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    Session::find_by_token(&state.db, &state.config.session.secret, &token).await
}

/// Gate requiring an authenticated session; anonymous requests are
/// redirected to the login page.
pub struct AuthSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_session(&parts.headers, state).await {
            Ok(Some(session)) if session.is_auth => Ok(AuthSession(session)),
            Ok(_) => Err(Redirect::to("/login").into_response()),
            Err(err) => {
                error!(error = %err, "session lookup failed");
                Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
            }
        }
    }
}

/// Gate requiring the admin role on top of authentication. A session that is
/// authenticated but not admin gets the admin view rendered in place with a
/// privilege error; the URL is preserved, no redirect.
pub struct AdminSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthSession(session) = AuthSession::from_request_parts(parts, state).await?;
        if session.is_admin {
            Ok(AdminSession(session))
        } else {
            let body = views::admin_page(&[], session.is_auth, Some(views::ADMIN_PRIVILEGE_ERROR));
            Err((StatusCode::FORBIDDEN, Html(body)).into_response())
        }
    }
}

/// Optional session for pages every visitor can see (the landing page shows
/// different navigation when logged in). Lookup failures degrade to
/// anonymous rather than breaking the page.
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = match resolve_session(&parts.headers, state).await {
            Ok(session) => session,
            Err(err) => {
                error!(error = %err, "session lookup failed, treating as anonymous");
                None
            }
        };
        Ok(MaybeSession(session))
    }
}
