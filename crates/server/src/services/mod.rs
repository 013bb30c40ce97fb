//! Business logic that spans repositories.
//!
//! - [`auth`] - Password hashing, login and user creation
//! - [`audit`] - Recording audit entries for mutations
//! - [`import`] - CSV material import
//! - [`notify`] - Notifications raised by stock, request, order and budget changes

pub mod audit;
pub mod auth;
pub mod import;
pub mod notify;
