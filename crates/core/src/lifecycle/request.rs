use crate::types::{RequestStatus, UserRole};

use super::TransitionError;

/// A reviewer's decision on a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Review {
    Approve,
    Reject { reason: String },
}

impl Review {
    /// Build a rejection, trimming the reason.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::MissingReason` when the reason is blank.
    pub fn reject(reason: &str) -> Result<Self, TransitionError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TransitionError::MissingReason);
        }
        Ok(Self::Reject {
            reason: reason.to_owned(),
        })
    }

    /// The status a pending request ends up in.
    #[must_use]
    pub const fn target(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject { .. } => RequestStatus::Rejected,
        }
    }
}

impl RequestStatus {
    /// Whether the request has been resolved.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Resolve a pending request.
    ///
    /// Permission is checked before state, so an unauthorised caller learns
    /// nothing about the request.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` when the reviewer is neither Admin nor Manager
    /// - `MissingReason` for a rejection with a blank reason
    /// - `Final` when the request is already approved or rejected
    pub fn review(self, reviewer: UserRole, decision: &Review) -> Result<Self, TransitionError> {
        if !reviewer.can_review_requests() {
            return Err(TransitionError::NotPermitted(reviewer));
        }
        if matches!(decision, Review::Reject { reason } if reason.trim().is_empty()) {
            return Err(TransitionError::MissingReason);
        }
        if self.is_terminal() {
            return Err(TransitionError::Final {
                state: self.label(),
            });
        }
        Ok(decision.target())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_approves_pending() {
        let next = RequestStatus::Pending
            .review(UserRole::Manager, &Review::Approve)
            .unwrap();
        assert_eq!(next, RequestStatus::Approved);
    }

    #[test]
    fn test_admin_rejects_with_reason() {
        let decision = Review::reject("  stokta var ").unwrap();
        assert_eq!(
            decision,
            Review::Reject {
                reason: "stokta var".to_owned()
            }
        );
        let next = RequestStatus::Pending
            .review(UserRole::Admin, &decision)
            .unwrap();
        assert_eq!(next, RequestStatus::Rejected);
    }

    #[test]
    fn test_blank_reason_is_refused() {
        assert_eq!(Review::reject("   "), Err(TransitionError::MissingReason));
        let decision = Review::Reject {
            reason: String::new(),
        };
        assert_eq!(
            RequestStatus::Pending.review(UserRole::Admin, &decision),
            Err(TransitionError::MissingReason)
        );
    }

    #[test]
    fn test_regular_users_cannot_review() {
        for role in [UserRole::User, UserRole::Viewer] {
            assert_eq!(
                RequestStatus::Pending.review(role, &Review::Approve),
                Err(TransitionError::NotPermitted(role))
            );
        }
    }

    #[test]
    fn test_resolved_requests_never_move() {
        let decisions = [Review::Approve, Review::reject("no").unwrap()];
        for state in [RequestStatus::Approved, RequestStatus::Rejected] {
            for decision in &decisions {
                let err = state.review(UserRole::Admin, decision).unwrap_err();
                assert!(err.is_state_conflict());
            }
        }
    }
}
