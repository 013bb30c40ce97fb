//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use envanter_core::UserId;
use envanter_core::models::User;

use crate::config::ServerConfig;
use crate::services::auth::generate_token;

/// Upper bound on concurrently signed-in sessions.
const MAX_SESSIONS: u64 = 10_000;

/// The user behind a bearer token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: UserId,
    pub user: User,
}

impl SessionUser {
    /// Name recorded in actor fields when the client sends none.
    #[must_use]
    pub fn actor(&self) -> String {
        self.user.display_name().to_string()
    }
}

/// In-memory bearer token sessions that expire after an idle period.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, SessionUser>,
}

impl SessionStore {
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle)
            .build();
        Self { cache }
    }

    /// Open a session and return its token.
    pub async fn open(&self, session: SessionUser) -> String {
        let token = generate_token();
        self.cache.insert(token.clone(), session).await;
        token
    }

    /// Look up a session, refreshing its idle timer.
    pub async fn get(&self, token: &str) -> Option<SessionUser> {
        self.cache.get(token).await
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn close(&self, token: &str) {
        self.cache.invalidate(token).await;
    }

    /// End every session of a user so the next request signs in again with
    /// the stored role and status. Returns how many sessions were closed.
    pub async fn revoke_user(&self, id: UserId) -> usize {
        let tokens: Vec<_> = self
            .cache
            .iter()
            .filter(|(_, session)| session.id == id)
            .map(|(token, _)| token)
            .collect();
        for token in &tokens {
            self.cache.invalidate(token.as_str()).await;
        }
        tokens.len()
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    sessions: SessionStore,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let sessions = SessionStore::new(config.session_idle);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use envanter_core::UserRole;

    use super::*;

    fn session(username: &str) -> SessionUser {
        session_for(1, username)
    }

    fn session_for(id: i64, username: &str) -> SessionUser {
        SessionUser {
            id: UserId::new(id),
            user: User {
                username: username.to_string(),
                full_name: "Ayşe Yılmaz".to_string(),
                email: String::new(),
                department: "İdari İşler".to_string(),
                role: UserRole::Manager,
                active: true,
                last_login: None,
            },
        }
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.open(session("ayse")).await;

        let found = store.get(&token).await.unwrap();
        assert_eq!(found.user.username, "ayse");

        store.close(&token).await;
        assert!(store.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.open(session("ayse")).await;
        let b = store.open(session("ayse")).await;
        assert_ne!(a, b);
        assert!(store.get("not-a-token").await.is_none());
    }

    #[tokio::test]
    async fn test_revoke_user_closes_only_their_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        let laptop = store.open(session_for(1, "ayse")).await;
        let phone = store.open(session_for(1, "ayse")).await;
        let other = store.open(session_for(2, "mehmet")).await;

        assert_eq!(store.revoke_user(UserId::new(1)).await, 2);
        assert!(store.get(&laptop).await.is_none());
        assert!(store.get(&phone).await.is_none());
        assert_eq!(store.get(&other).await.unwrap().user.username, "mehmet");

        assert_eq!(store.revoke_user(UserId::new(1)).await, 0);
    }
}
