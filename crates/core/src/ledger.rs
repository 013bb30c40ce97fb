//! Stock ledger rules.
//!
//! A material's current stock is never stored: it is the net sum of its
//! movements (`Σ In − Σ Out`). Movements are append-only, quantities are
//! strictly positive, and an `Out` movement is only accepted when the sum
//! stays non-negative.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{MovementDirection, StockStatus};

/// Errors raised when a movement violates the ledger rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("quantity must be greater than zero (got {0})")]
    NonPositiveQuantity(i64),
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },
}

/// A strictly positive movement quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i32);

impl Quantity {
    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NonPositiveQuantity` for zero, negative or
    /// out-of-range values.
    pub fn new(value: i64) -> Result<Self, LedgerError> {
        match i32::try_from(value) {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(LedgerError::NonPositiveQuantity(value)),
        }
    }

    /// The quantity as a wide integer for arithmetic.
    #[must_use]
    pub fn get(self) -> i64 {
        i64::from(self.0)
    }

    /// The quantity as stored in the database.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(q: Quantity) -> Self {
        q.get()
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(v))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Signed contribution of one movement to the stock level.
#[must_use]
pub fn signed(direction: MovementDirection, quantity: Quantity) -> i64 {
    match direction {
        MovementDirection::In => quantity.get(),
        MovementDirection::Out => -quantity.get(),
    }
}

/// Stock level of a single material: `Σ In − Σ Out`.
pub fn stock_level<I>(entries: I) -> i64
where
    I: IntoIterator<Item = (MovementDirection, Quantity)>,
{
    entries.into_iter().map(|(d, q)| signed(d, q)).sum()
}

/// Stock levels per key (usually a material code) from a movement stream.
pub fn stock_levels<K, I>(entries: I) -> HashMap<K, i64>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, MovementDirection, Quantity)>,
{
    let mut levels = HashMap::new();
    for (key, direction, quantity) in entries {
        *levels.entry(key).or_insert(0) += signed(direction, quantity);
    }
    levels
}

/// Apply a movement to the current level.
///
/// # Errors
///
/// Returns `LedgerError::InsufficientStock` when an `Out` movement would take
/// the level below zero.
pub fn apply(current: i64, direction: MovementDirection, quantity: Quantity) -> Result<i64, LedgerError> {
    let next = current + signed(direction, quantity);
    if next < 0 {
        return Err(LedgerError::InsufficientStock {
            available: current,
            requested: quantity.get(),
        });
    }
    Ok(next)
}

/// Derive the stock status from the current level and the configured limits.
///
/// Critical wins over excess when both limits are crossed.
#[must_use]
pub fn classify(current: i64, min_level: i32, max_level: i32) -> StockStatus {
    if current <= i64::from(min_level) {
        StockStatus::Critical
    } else if current >= i64::from(max_level) {
        StockStatus::Excess
    } else {
        StockStatus::Normal
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use MovementDirection::{In, Out};

    fn q(v: i64) -> Quantity {
        Quantity::new(v).unwrap()
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert_eq!(Quantity::new(0), Err(LedgerError::NonPositiveQuantity(0)));
        assert_eq!(Quantity::new(-3), Err(LedgerError::NonPositiveQuantity(-3)));
        assert!(Quantity::new(i64::from(i32::MAX) + 1).is_err());
        assert_eq!(q(5).get(), 5);
    }

    #[test]
    fn test_quantity_deserialize_validates() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("12").unwrap(), q(12));
    }

    #[test]
    fn test_stock_level_is_net_sum() {
        let level = stock_level([(In, q(10)), (Out, q(3)), (In, q(5)), (Out, q(2))]);
        assert_eq!(level, 10);
    }

    #[test]
    fn test_stock_levels_per_material() {
        let levels = stock_levels([
            ("A", In, q(10)),
            ("B", In, q(4)),
            ("A", Out, q(7)),
        ]);
        assert_eq!(levels["A"], 3);
        assert_eq!(levels["B"], 4);
    }

    #[test]
    fn test_apply_rejects_overdraw() {
        assert_eq!(apply(5, Out, q(5)), Ok(0));
        assert_eq!(
            apply(5, Out, q(6)),
            Err(LedgerError::InsufficientStock {
                available: 5,
                requested: 6
            })
        );
        assert_eq!(apply(0, In, q(1)), Ok(1));
    }

    #[test]
    fn test_applied_sequence_never_goes_negative() {
        let moves = [(In, 3), (Out, 2), (Out, 2), (In, 1), (Out, 2), (Out, 1)];
        let mut level = 0;
        for (direction, amount) in moves {
            if let Ok(next) = apply(level, direction, q(amount)) {
                level = next;
            }
            assert!(level >= 0);
        }
        assert_eq!(level, 0);
    }

    #[test]
    fn test_classify_critical_iff_at_or_below_min() {
        for current in -1..=20 {
            let status = classify(current, 5, 15);
            assert_eq!(status == StockStatus::Critical, current <= 5, "current={current}");
        }
        assert_eq!(classify(15, 5, 15), StockStatus::Excess);
        assert_eq!(classify(10, 5, 15), StockStatus::Normal);
    }

    #[test]
    fn test_classify_critical_wins_when_limits_overlap() {
        assert_eq!(classify(3, 5, 2), StockStatus::Critical);
    }
}
