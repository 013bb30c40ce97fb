//! Input validation at the API boundary.
//!
//! Request bodies are decoded into typed structs first (unknown enum labels,
//! non-positive quantities and malformed codes already fail there). The
//! [`Validate`] implementations check the remaining cross-field rules.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by [`Validate::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} {message}")]
    OutOfRange { field: &'static str, message: String },
    #[error("{field} is invalid: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ValidationError {
    /// The offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::TooLong { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Invalid { field, .. } => field,
        }
    }
}

/// Cross-field validation of a decoded value.
pub trait Validate {
    /// Check the value.
    ///
    /// # Errors
    ///
    /// Returns the first rule the value breaks.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl<T: Validate> Validate for [T] {
    fn validate(&self) -> Result<(), ValidationError> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.as_slice().validate()
    }
}

/// Maximum length of free-text fields.
pub const MAX_TEXT_LEN: usize = 500;

/// Require a non-blank text field.
///
/// # Errors
///
/// Returns `Required` for blank text and `TooLong` past [`MAX_TEXT_LEN`].
pub fn required_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    bounded_text(field, value)
}

/// Limit the length of an optional text field.
///
/// # Errors
///
/// Returns `TooLong` past [`MAX_TEXT_LEN`].
pub fn bounded_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Require a non-negative amount of money.
///
/// # Errors
///
/// Returns `OutOfRange` for negative values.
pub fn non_negative_money(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::OutOfRange {
            field,
            message: format!("must not be negative (got {value})"),
        });
    }
    Ok(())
}

/// Require a non-negative integer.
///
/// # Errors
///
/// Returns `OutOfRange` for negative values.
pub fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field,
            message: format!("must not be negative (got {value})"),
        });
    }
    Ok(())
}

/// Loose e-mail shape check for optional contact fields; blank is accepted.
///
/// # Errors
///
/// Returns `Invalid` when a non-blank value has no `@` with text on both sides.
pub fn optional_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            bounded_text(field, value)
        }
        _ => Err(ValidationError::Invalid {
            field,
            message: format!("{value} is not an e-mail address"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(required_text("ad", "Kalem").is_ok());
        assert_eq!(
            required_text("ad", "  "),
            Err(ValidationError::Required { field: "ad" })
        );
        assert!(matches!(
            required_text("ad", &"x".repeat(MAX_TEXT_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_money_and_integers() {
        assert!(non_negative_money("birim_fiyat", Decimal::ZERO).is_ok());
        assert!(non_negative_money("birim_fiyat", Decimal::new(-1, 2)).is_err());
        assert!(non_negative("min_seviye", 0).is_ok());
        assert!(non_negative("min_seviye", -1).is_err());
    }

    #[test]
    fn test_optional_email() {
        assert!(optional_email("email", "").is_ok());
        assert!(optional_email("email", "satis@abc.com").is_ok());
        let err = optional_email("email", "satis").unwrap_err();
        assert_eq!(err.field(), "email");
    }

    #[test]
    fn test_error_display_names_field() {
        let err = ValidationError::OutOfRange {
            field: "puan",
            message: "must be between 1 and 5".to_owned(),
        };
        assert_eq!(err.to_string(), "puan must be between 1 and 5");
    }
}
