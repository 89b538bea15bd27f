use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use rand::seq::SliceRandom;

use crate::auth::guards::{AuthSession, MaybeSession};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::User;
use crate::views;

const MEMBER_IMAGES: &[&str] = &["image1.jpg", "image2.jpg", "image3.jpg"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/members", get(members))
}

async fn landing(MaybeSession(session): MaybeSession) -> Html<String> {
    let is_auth = session.map(|s| s.is_auth).unwrap_or(false);
    Html(views::landing(is_auth))
}

async fn members(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Html<String>, AppError> {
    // Users are never deleted in this app, but the page degrades to an
    // anonymous greeting rather than failing if the row is gone.
    let username = User::find_by_id(&state.db, session.user_id)
        .await?
        .map(|user| user.username)
        .unwrap_or_default();
    let image = MEMBER_IMAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(MEMBER_IMAGES[0]);
    Ok(Html(views::members_page(&username, image)))
}

/// Catch-all for unmatched routes, wired as the router fallback.
pub async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(views::not_found()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_image_pool_is_nonempty_and_renders() {
        let image = MEMBER_IMAGES
            .choose(&mut rand::thread_rng())
            .copied()
            .expect("pool is nonempty");
        assert!(MEMBER_IMAGES.contains(&image));
        assert!(views::members_page("a", image).contains(image));
    }
}
