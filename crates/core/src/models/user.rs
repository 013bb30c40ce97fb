//! Users and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserRole;
use crate::validation::{Validate, ValidationError, bounded_text, optional_email, required_text};

/// Minimum password length for new users.
pub const MIN_PASSWORD_LEN: usize = 6;

const fn default_active() -> bool {
    true
}

/// A user as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(rename = "ad_soyad")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "departman", default)]
    pub department: String,
    #[serde(rename = "rol")]
    pub role: UserRole,
    #[serde(rename = "aktif", default = "default_active")]
    pub active: bool,
    #[serde(rename = "son_giris", default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Name recorded on audit entries and documents.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// Body of `POST /users`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(rename = "ad_soyad")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "departman", default)]
    pub department: String,
    #[serde(rename = "rol", default)]
    pub role: UserRole,
    #[serde(rename = "aktif", default = "default_active")]
    pub active: bool,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("username", &self.username)?;
        if self.username.chars().any(char::is_whitespace) {
            return Err(ValidationError::Invalid {
                field: "username",
                message: "must not contain whitespace".to_owned(),
            });
        }
        bounded_text("username", &self.username)?;
        required_text("ad_soyad", &self.full_name)?;
        optional_email("email", &self.email)?;
        bounded_text("departman", &self.department)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::OutOfRange {
                field: "password",
                message: format!("must be at least {MIN_PASSWORD_LEN} characters"),
            });
        }
        Ok(())
    }
}

/// Body of `PUT /users/{username}`. The username and password stay as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(rename = "ad_soyad")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "departman", default)]
    pub department: String,
    #[serde(rename = "rol")]
    pub role: UserRole,
    #[serde(rename = "aktif", default = "default_active")]
    pub active: bool,
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("ad_soyad", &self.full_name)?;
        optional_email("email", &self.email)?;
        bounded_text("departman", &self.department)
    }
}

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
