//! HTTP middleware for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID
//! 4. CORS
//!
//! Authentication is done per handler with the extractors in [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireUser, RequireWriter, bearer_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
