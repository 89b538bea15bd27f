use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::AppError;

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Checked after email normalization. Failures are recovered by the
    /// handler, which re-renders the form.
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(&self.email) || self.password.is_empty() {
            return Err(AppError::Validation(
                "invalid email or password format".into(),
            ));
        }
        Ok(())
    }
}

/// Body of `POST /register`. Registration always creates a regular user;
/// the admin role is only ever granted through `/promote`.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty()
            || self.password.is_empty()
            || !is_valid_email(&self.email)
        {
            return Err(AppError::Validation("invalid input format".into()));
        }
        Ok(())
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}
