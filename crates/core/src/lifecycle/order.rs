use crate::types::OrderStatus;

use super::TransitionError;

impl OrderStatus {
    /// Position in the lifecycle, starting at zero.
    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            Self::AwaitingApproval => 0,
            Self::Approved => 1,
            Self::InTransit => 2,
            Self::Delivered => 3,
        }
    }

    /// The single status that may follow this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::AwaitingApproval => Some(Self::Approved),
            Self::Approved => Some(Self::InTransit),
            Self::InTransit => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Whether the order counts as pending on the dashboard.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::AwaitingApproval | Self::InTransit)
    }

    /// Move to `target`, which must be exactly the next status.
    ///
    /// # Errors
    ///
    /// Returns `Final` for a delivered order and `Invalid` for any skip,
    /// repeat or reversal.
    pub fn advance_to(self, target: Self) -> Result<Self, TransitionError> {
        match self.next() {
            None => Err(TransitionError::Final {
                state: self.label(),
            }),
            Some(next) if next == target => Ok(next),
            Some(_) => Err(TransitionError::Invalid {
                from: self.label(),
                to: target.label(),
            }),
        }
    }
}

/// Whether an observed sequence of statuses only ever moved one step forward.
#[must_use]
pub fn is_forward_progression(observed: &[OrderStatus]) -> bool {
    observed
        .windows(2)
        .all(|pair| matches!(pair, [a, b] if a.next() == Some(*b)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_full_lifecycle() {
        let mut status = OrderStatus::default();
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            status = status.advance_to(next).unwrap();
            seen.push(status);
        }
        assert_eq!(seen, OrderStatus::ALL);
        assert!(is_forward_progression(&seen));
    }

    #[test]
    fn test_rejects_skips_repeats_and_reversals() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let result = from.advance_to(*to);
                if to.position() == from.position() + 1 {
                    assert_eq!(result, Ok(*to));
                } else {
                    assert!(result.unwrap_err().is_state_conflict(), "{from} -> {to}");
                }
            }
        }
    }

    #[test]
    fn test_delivered_is_final() {
        assert_eq!(
            OrderStatus::Delivered.advance_to(OrderStatus::Delivered),
            Err(TransitionError::Final {
                state: "Teslim Edildi"
            })
        );
    }

    #[test]
    fn test_progression_detects_gaps() {
        assert!(is_forward_progression(&[
            OrderStatus::Approved,
            OrderStatus::InTransit
        ]));
        assert!(!is_forward_progression(&[
            OrderStatus::AwaitingApproval,
            OrderStatus::InTransit
        ]));
        assert!(!is_forward_progression(&[
            OrderStatus::Approved,
            OrderStatus::Approved
        ]));
        assert!(is_forward_progression(&[]));
    }

    #[test]
    fn test_pending_orders() {
        assert!(OrderStatus::AwaitingApproval.is_pending());
        assert!(OrderStatus::InTransit.is_pending());
        assert!(!OrderStatus::Approved.is_pending());
        assert!(!OrderStatus::Delivered.is_pending());
    }
}
