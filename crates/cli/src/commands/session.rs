//! Signed-in API client for commands that go through the REST API.
//!
//! # Environment Variables
//!
//! - `ENVANTER_API_URL` - API base URL (default `http://127.0.0.1:8000/api`)
//! - `ENVANTER_USERNAME` / `ENVANTER_PASSWORD` - Credentials to sign in with

use secrecy::SecretString;
use thiserror::Error;

use envanter_client::{ApiClient, ClientError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Client(#[from] ClientError),
}

fn required_env(key: &'static str) -> Result<String, SessionError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(SessionError::MissingEnvVar(key))
}

/// Build a client from the environment and sign in.
///
/// # Errors
///
/// Returns `SessionError` if credentials are missing or the login fails.
pub async fn signed_in_client() -> Result<ApiClient, SessionError> {
    dotenvy::dotenv().ok();

    let username = required_env("ENVANTER_USERNAME")?;
    let password = SecretString::from(required_env("ENVANTER_PASSWORD")?);

    let client = ApiClient::from_env()?;
    tracing::debug!(url = %client.config().base_url, "Signing in");
    let user = client.login(&username, &password).await?;
    tracing::info!("Signed in as {} ({})", user.display_name(), user.role);

    Ok(client)
}
