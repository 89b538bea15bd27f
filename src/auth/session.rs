//! Server-side sessions. The cookie carries a raw opaque token; the database
//! stores only a keyed digest of it, so a leaked sessions table cannot be
//! replayed against the server.

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::AppError;
use crate::users::User;

pub const SESSION_COOKIE_NAME: &str = "sid";

/// One browser's authenticated state.
///
/// `is_admin` is a snapshot of the user's role taken at login and is NOT
/// live-synced: demoting a logged-in admin leaves their existing session
/// privileged until it expires or they log out. Documented policy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_auth: bool,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Insert a session for a freshly verified login and return it together
    /// with the raw token destined for the cookie.
    pub async fn create(
        db: &PgPool,
        config: &SessionConfig,
        user: &User,
    ) -> Result<(Session, String), AppError> {
        let token = generate_token();
        let token_hash = hash_token(&config.secret, &token);
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token_hash, user_id, is_auth, is_admin, expires_at)
            VALUES ($1, $2, TRUE, $3, now() + ($4 * interval '1 minute'))
            RETURNING id, user_id, is_auth, is_admin, created_at, expires_at
            "#,
        )
        .bind(&token_hash)
        .bind(user.id)
        .bind(user.is_admin)
        .bind(config.ttl_minutes)
        .fetch_one(db)
        .await?;
        Ok((session, token))
    }

    /// Resolve a raw cookie token to a live session. Expired rows are
    /// invisible here; the sweep task deletes them later.
    pub async fn find_by_token(
        db: &PgPool,
        secret: &str,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        let token_hash = hash_token(secret, token);
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, is_auth, is_admin, created_at, expires_at
            FROM sessions
            WHERE token_hash = $1 AND expires_at > now()
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(db)
        .await?;
        Ok(session)
    }

    /// Destroy the session behind a raw token. Deletes expired rows too, so
    /// logout works even on a stale cookie.
    pub async fn destroy_by_token(
        db: &PgPool,
        secret: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let token_hash = hash_token(secret, token);
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Reap rows past their TTL. Called periodically from the sweep task.
    pub async fn delete_expired(db: &PgPool) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// New opaque session token. The raw value only ever travels in the cookie.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest stored in (and compared against) the database. Keyed with the
/// configured session secret so digests cannot be recomputed from tokens
/// alone.
pub fn hash_token(secret: &str, token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the `Set-Cookie` value for a fresh session.
pub fn session_cookie(token: &str, ttl_seconds: i64) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    ))
}

/// Expire the cookie on logout.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Pull the raw session token out of the `Cookie` header, if present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_opaque() {
        let first = generate_token();
        let second = generate_token();
        assert_ne!(first, second);
        let decoded = URL_SAFE_NO_PAD.decode(first.as_bytes()).expect("base64url");
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn token_digest_is_keyed_and_stable() {
        let token = generate_token();
        assert_eq!(hash_token("secret", &token), hash_token("secret", &token));
        assert_ne!(hash_token("secret", &token), hash_token("other", &token));
        assert_ne!(
            hash_token("secret", &token),
            hash_token("secret", "different-token")
        );
    }

    #[test]
    fn session_cookie_carries_expected_attributes() {
        let cookie = session_cookie("abc123", 3600).expect("valid header value");
        let value = cookie.to_str().expect("ascii");
        assert!(value.starts_with("sid=abc123;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Max-Age=3600"));
        assert!(value.contains("Path=/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let value = clear_session_cookie();
        assert!(value.to_str().expect("ascii").contains("Max-Age=0"));
    }

    #[test]
    fn extract_session_token_finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; sid=tok-1; lang=en"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok-1"));
    }

    #[test]
    fn extract_session_token_handles_missing_cookie() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(extract_session_token(&headers), None);
    }
}
