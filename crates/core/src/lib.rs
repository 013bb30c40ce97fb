//! Envanter Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Envanter components:
//! - `envanter-server` - REST API that owns all persisted state
//! - `envanter-client` - Typed API client and dashboard state container
//! - `envanter-cli` - Command-line tools for migrations, seeding and exports
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and traits - no I/O, no
//! database access, no HTTP clients. Both sides of the API share one
//! definition of the lifecycles and the stock ledger.
//!
//! # Modules
//!
//! - [`types`] - Newtype identifiers, codes, document numbers and status enums
//! - [`lifecycle`] - Request, order and stock count state transitions
//! - [`ledger`] - Quantities and stock level derivation
//! - [`models`] - Wire types with the API's field names
//! - [`validation`] - Input validation at the API boundary
//! - [`analytics`] - Dashboard statistics, trends and depletion predictions
//! - [`reports`] - Inventory, movement, department and supplier reports
//! - [`export`] - Tabular exports

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod export;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod reports;
pub mod types;
pub mod validation;

pub use ledger::{LedgerError, Quantity};
pub use lifecycle::{Review, TransitionError};
pub use types::*;
pub use validation::{Validate, ValidationError};
