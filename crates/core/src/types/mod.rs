//! Core types for Envanter.
//!
//! This module provides type-safe wrappers for the inventory domain.

pub mod code;
pub mod id;
pub mod number;
pub mod status;

pub use code::{CodeError, LocationCode, MaterialCode, SupplierCode};
pub use id::*;
pub use number::{CountNo, DocumentNumberError, OrderNo, RequestNo};
pub use status::*;
