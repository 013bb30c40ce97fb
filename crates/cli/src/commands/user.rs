//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! ENVANTER_NEW_USER_PASSWORD=... envanter user create -u ayse -n "Ayşe Yılmaz" -r Admin
//! ```
//!
//! # Environment Variables
//!
//! - `ENVANTER_DATABASE_URL` - `PostgreSQL` connection string
//! - `ENVANTER_NEW_USER_PASSWORD` - Password for the new user (or `--password`)

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use envanter_core::models::{NewUser, User};
use envanter_core::{UserRole, Validate, ValidationError};
use envanter_server::db::{RepositoryError, UserRepository};
use envanter_server::services::auth::hash_password;

use super::migrate::{self, MigrationError};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] MigrationError),

    #[error("Invalid role: {0}. Valid roles: Admin, Yönetici, Kullanıcı, Görüntüleyici")]
    InvalidRole(String),

    #[error("Invalid user: {0}")]
    Invalid(#[from] ValidationError),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Options for a new user.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub department: String,
    pub email: String,
    pub password: SecretString,
}

impl CreateUser {
    /// Build and validate the user record.
    fn into_new_user(self) -> Result<NewUser, UserError> {
        let role: UserRole = self
            .role
            .parse()
            .map_err(|_| UserError::InvalidRole(self.role.clone()))?;

        let user = NewUser {
            username: self.username.trim().to_owned(),
            full_name: self.full_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            department: self.department.trim().to_owned(),
            role,
            active: true,
            password: self.password.expose_secret().to_owned(),
        };
        user.validate()?;
        Ok(user)
    }
}

/// Create a user directly in the database.
///
/// # Errors
///
/// Returns `UserError` for an invalid role or user, a taken username or a
/// database failure.
pub async fn create(options: CreateUser) -> Result<User, UserError> {
    let new_user = options.into_new_user()?;
    let pool = migrate::connect().await?;

    tracing::info!("Creating user: {} ({})", new_user.username, new_user.role);

    let user = UserRepository::new(&pool)
        .create(&new_user, &hash_password(&new_user.password))
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(new_user.username.clone()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! Username: {}, Role: {}",
        user.username,
        user.role
    );
    Ok(user)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn options(role: &str, password: &str) -> CreateUser {
        CreateUser {
            username: " ayse ".to_owned(),
            full_name: "Ayşe Yılmaz".to_owned(),
            role: role.to_owned(),
            department: "İdari İşler".to_owned(),
            email: String::new(),
            password: SecretString::from(password),
        }
    }

    #[test]
    fn test_builds_trimmed_user() {
        let user = options("Yönetici", "parola123").into_new_user().unwrap();
        assert_eq!(user.username, "ayse");
        assert_eq!(user.role, UserRole::Manager);
        assert!(user.active);
    }

    #[test]
    fn test_rejects_unknown_role() {
        let err = options("superuser", "parola123").into_new_user().unwrap_err();
        assert!(matches!(err, UserError::InvalidRole(_)));
        assert!(err.to_string().contains("Görüntüleyici"));
    }

    #[test]
    fn test_rejects_short_password() {
        let err = options("Admin", "abc").into_new_user().unwrap_err();
        assert!(matches!(err, UserError::Invalid(ValidationError::OutOfRange { field: "password", .. })));
    }
}
