//! One-way state machines for requests, orders and stock counts.
//!
//! The transitions are pure functions on the status enums. The server applies
//! them to decide whether an update is allowed and then persists the result
//! with a conditional `UPDATE ... WHERE status = <current>`, so two racing
//! callers cannot both succeed.

mod count;
mod order;
mod request;

use thiserror::Error;

use crate::types::UserRole;

pub use order::is_forward_progression;
pub use request::Review;

/// Errors raised by a rejected state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The target state is not reachable from the current one.
    #[error("cannot move from {from} to {to}")]
    Invalid { from: &'static str, to: &'static str },
    /// The current state is terminal.
    #[error("{state} is a final state")]
    Final { state: &'static str },
    /// The caller's role may not perform the transition.
    #[error("role {0} may not perform this transition")]
    NotPermitted(UserRole),
    /// A rejection was submitted without a reason.
    #[error("a rejection reason is required")]
    MissingReason,
}

impl TransitionError {
    /// Whether the error comes from the current state rather than the caller.
    #[must_use]
    pub const fn is_state_conflict(&self) -> bool {
        matches!(self, Self::Invalid { .. } | Self::Final { .. })
    }
}
