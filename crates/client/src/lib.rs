//! Envanter API client.
//!
//! A typed `reqwest` client for the Envanter REST API plus the dashboard
//! state container built on it.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), envanter_client::ClientError> {
//! use envanter_client::{ApiClient, ClientConfig};
//! use envanter_core::models::MaterialFilter;
//! use secrecy::SecretString;
//!
//! let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:8000/api")?)?;
//! client.login("admin", &SecretString::from("secret")).await?;
//! let critical = client.critical_materials().await?;
//! let all = client.materials(&MaterialFilter::default()).await?;
//! # let _ = (critical, all);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bulk;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;

pub use bulk::BulkDeleteReport;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use dashboard::{Dashboard, OrderAction, Page, Snapshot, next_action};
pub use error::ClientError;
