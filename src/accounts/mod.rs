//! Local account service: signup, login, username availability and
//! per-user running averages, backed by SQLite.

pub mod profile;
pub mod store;
pub mod username_check;
pub mod worker;

use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use profile::ProfileCache;
pub use store::AccountStore;
pub use username_check::{Availability, UsernameCheck};
pub use worker::{AccountClient, AccountRequest, AccountResponse};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 100;
pub const NAME_MIN_LEN: usize = 2;
pub const PASSWORD_MIN_LEN: usize = 6;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_@.-]+$").expect("valid username pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error("{0}")]
    Invalid(String),
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("no account named {0}")]
    UserNotFound(String),
    #[error("account service is unavailable")]
    ServiceUnavailable,
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything the app knows about a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    pub email: String,
    pub races: u32,
    /// Average words per minute over all races.
    pub speed: u32,
    /// Average accuracy percentage over all races.
    pub accuracy: u32,
    pub member_since: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), AccountError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AccountError::Invalid(
                "Username and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), AccountError> {
        let fields = [&self.username, &self.email, &self.password, &self.name];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(AccountError::Invalid("All fields are required".to_string()));
        }
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        validate_password(&self.password)
    }
}

pub fn validate_username(username: &str) -> Result<(), AccountError> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(AccountError::Invalid(format!(
            "Username must be at least {} characters",
            USERNAME_MIN_LEN
        )));
    }
    if len > USERNAME_MAX_LEN {
        return Err(AccountError::Invalid(format!(
            "Username must be less than {} characters",
            USERNAME_MAX_LEN
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AccountError::Invalid(
            "Username can only contain letters, numbers, underscores, @ and periods".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AccountError> {
    if email.trim().is_empty() {
        return Err(AccountError::Invalid("Please enter your email".to_string()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AccountError::Invalid(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AccountError> {
    if name.trim().is_empty() {
        return Err(AccountError::Invalid("Please enter your full name".to_string()));
    }
    if name.chars().count() < NAME_MIN_LEN {
        return Err(AccountError::Invalid(format!(
            "Name must be at least {} characters",
            NAME_MIN_LEN
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.is_empty() {
        return Err(AccountError::Invalid("Please enter a password".to_string()));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AccountError::Invalid(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    Ok(())
}
