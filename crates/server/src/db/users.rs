//! User repository.
//!
//! Password hashes never leave this module except through [`StoredUser`],
//! which the login handler uses to verify credentials.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use envanter_core::models::{NewUser, User, UserUpdate};
use envanter_core::{UserId, UserRole};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    full_name: String,
    email: String,
    department: String,
    role: UserRole,
    active: bool,
    password_hash: String,
    last_login: Option<DateTime<Utc>>,
}

/// A user together with the stored password hash.
#[derive(Clone)]
pub struct StoredUser {
    pub id: UserId,
    pub user: User,
    pub password_hash: String,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl From<UserRow> for StoredUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            user: User {
                username: row.username,
                full_name: row.full_name,
                email: row.email,
                department: row.department,
                role: row.role,
                active: row.active,
                last_login: row.last_login,
            },
            password_hash: row.password_hash,
        }
    }
}

const USER_COLUMNS: &str = "id, username, full_name, email, department, role, active, \
                            password_hash, last_login";

// =============================================================================
// Repository
// =============================================================================

/// Repository for users.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users ordered by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM envanter.app_user ORDER BY username"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| StoredUser::from(r).user).collect())
    }

    /// Get a user and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<StoredUser>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM envanter.app_user WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a user with an already hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO envanter.app_user
                (username, full_name, email, department, role, active, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.username.trim())
        .bind(user.full_name.trim())
        .bind(&user.email)
        .bind(&user.department)
        .bind(user.role)
        .bind(user.active)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::unique_violation(e, "username already exists"))?;

        Ok(StoredUser::from(row).user)
    }

    /// Replace the editable fields of a user.
    ///
    /// Returns the updated user, or `None` if the username is unknown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        username: &str,
        update: &UserUpdate,
    ) -> Result<Option<StoredUser>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE envanter.app_user
            SET full_name = $2, email = $3, department = $4, role = $5, active = $6
            WHERE username = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(username)
        .bind(update.full_name.trim())
        .bind(&update.email)
        .bind(&update.department)
        .bind(update.role)
        .bind(update.active)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Stamp the last login time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_login(&self, id: UserId) -> Result<DateTime<Utc>, RepositoryError> {
        let at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "UPDATE envanter.app_user SET last_login = now() WHERE id = $1 RETURNING last_login",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(at)
    }
}
