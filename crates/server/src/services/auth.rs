//! Authentication: password hashing, bearer tokens and login.
//!
//! Passwords are stored as `"<salt hex>$<sha256(salt || password) hex>"`.
//! Tokens are 256 random bits, base64url encoded, held only in memory.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use envanter_core::models::{Credentials, NewUser, Session, User, UserUpdate};
use envanter_core::{Validate, ValidationError};

use crate::db::{RepositoryError, UserRepository};
use crate::state::{SessionStore, SessionUser};

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user, wrong password or inactive account.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The new user failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Hash a password with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), digest(&salt, password))
}

/// Check a password against a stored hash. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    constant_time_eq(digest(&salt, password).as_bytes(), expected.as_bytes())
}

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Generate an opaque bearer token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Login and user management.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    sessions: &'a SessionStore,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, sessions: &'a SessionStore) -> Self {
        Self {
            users: UserRepository::new(pool),
            sessions,
        }
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown user, a wrong
    /// password or an inactive account.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let username = credentials.username.trim();
        let Some(stored) = self.users.get_by_username(username).await? else {
            warn!("Login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !stored.user.active || !verify_password(&credentials.password, &stored.password_hash) {
            warn!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let last_login = self.users.record_login(stored.id).await?;
        let mut user = stored.user;
        user.last_login = Some(last_login);

        let token = self
            .sessions
            .open(SessionUser {
                id: stored.id,
                user: user.clone(),
            })
            .await;

        info!("User signed in");
        Ok(Session { user, token })
    }

    /// End the session behind `token`.
    pub async fn logout(&self, token: &str) {
        self.sessions.close(token).await;
    }

    /// Validate and create a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the user is invalid.
    /// Returns `AuthError::Repository` with `Conflict` if the username is taken.
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, AuthError> {
        new_user.validate()?;
        let hash = hash_password(&new_user.password);
        let user = self.users.create(new_user, &hash).await?;
        info!(role = %user.role, "User created");
        Ok(user)
    }

    /// Update a user's profile, role or status and close their sessions.
    ///
    /// Open sessions carry a copy of the user, so they are ended rather than
    /// left running with the old role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the update is invalid.
    /// Returns `AuthError::Repository` with `NotFound` for an unknown username.
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, username: &str, update: &UserUpdate) -> Result<User, AuthError> {
        update.validate()?;
        let stored = self
            .users
            .update(username, update)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let closed = self.sessions.revoke_user(stored.id).await;
        info!(role = %stored.user.role, active = stored.user.active, closed, "User updated");
        Ok(stored.user)
    }
}
