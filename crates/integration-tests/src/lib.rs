//! Integration tests for Envanter.
//!
//! # Running Tests
//!
//! ```bash
//! # Lifecycle and ledger tests (no services needed)
//! cargo test -p envanter-integration-tests
//!
//! # Live API tests against a running server with a migrated database
//! export ENVANTER_API_URL=http://127.0.0.1:8000/api
//! export ENVANTER_TEST_USERNAME=admin ENVANTER_TEST_PASSWORD=...
//! cargo test -p envanter-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `lifecycle` - Request, order and stock count state machines end to end
//! - `ledger` - Stock levels derived from movement streams
//! - `live_api` - Full workflows through `envanter-client` (ignored by default)
//!
//! The live tests create records with random codes and archive what they can
//! afterwards, so they can run against a shared development database.

use rand::Rng;
use secrecy::SecretString;

use envanter_client::{ApiClient, ClientError};

/// Login used by the live tests; must be an Admin.
pub const USERNAME_VAR: &str = "ENVANTER_TEST_USERNAME";
pub const PASSWORD_VAR: &str = "ENVANTER_TEST_PASSWORD";

/// Context for tests that talk to a running server.
pub struct TestContext {
    pub client: ApiClient,
    /// Username the client is signed in as.
    pub username: String,
}

impl TestContext {
    /// Sign in with the test credentials from the environment.
    ///
    /// # Panics
    ///
    /// Panics if the credentials are missing or the login fails; live tests
    /// are opt-in and should fail loudly when misconfigured.
    #[allow(clippy::expect_used)]
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let username = std::env::var(USERNAME_VAR)
            .unwrap_or_else(|_| panic!("{USERNAME_VAR} must be set for live tests"));
        let password = std::env::var(PASSWORD_VAR)
            .map(SecretString::from)
            .unwrap_or_else(|_| panic!("{PASSWORD_VAR} must be set for live tests"));

        let client = ApiClient::from_env().expect("valid ENVANTER_API_URL");
        client
            .login(&username, &password)
            .await
            .expect("test user can sign in");

        Self { client, username }
    }

    /// Sign out, ignoring an already expired session.
    pub async fn finish(self) -> Result<(), ClientError> {
        match self.client.logout().await {
            Ok(_) => Ok(()),
            Err(e) if e.is_unauthorized() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// A code that is unlikely to collide with existing records, e.g. `IT-MK-4F2A9C`.
#[must_use]
pub fn unique_code(prefix: &str) -> String {
    let suffix: u32 = rand::rng().random_range(0..0x0100_0000);
    format!("IT-{prefix}-{suffix:06X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_code_shape() {
        let code = unique_code("MK");
        assert!(code.starts_with("IT-MK-"));
        assert_eq!(code.len(), "IT-MK-".len() + 6);
        assert_ne!(unique_code("MK"), unique_code("MK"));
    }
}
