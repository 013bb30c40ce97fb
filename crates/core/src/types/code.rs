//! Business keys chosen by users: material, supplier and location codes.
//!
//! Codes appear in URL paths (`/materials/{kod}`), so they are restricted to
//! printable characters without whitespace or URL delimiters.

use thiserror::Error;

/// Maximum length of a business code.
pub const MAX_CODE_LEN: usize = 32;

/// Errors that can occur when parsing a code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("code cannot be empty")]
    Empty,
    #[error("code is too long (max {max} characters, got {actual})")]
    TooLong { max: usize, actual: usize },
    #[error("code contains invalid character {0:?}")]
    InvalidCharacter(char),
}

fn check_code(s: &str) -> Result<(), CodeError> {
    if s.is_empty() {
        return Err(CodeError::Empty);
    }
    let len = s.chars().count();
    if len > MAX_CODE_LEN {
        return Err(CodeError::TooLong {
            max: MAX_CODE_LEN,
            actual: len,
        });
    }
    if let Some(c) = s
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(CodeError::InvalidCharacter(c));
    }
    Ok(())
}

macro_rules! define_code {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse a code, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns `CodeError` if the code is empty, too long, or contains
            /// whitespace or URL delimiters.
            pub fn parse(s: &str) -> Result<Self, CodeError> {
                let trimmed = s.trim();
                check_code(trimmed)?;
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the code as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = CodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CodeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> Self {
                code.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                // Database values are assumed valid
                Ok(Self(s))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_code!(
    /// Unique material code (`kod`), e.g. `MLZ001`.
    MaterialCode
);
define_code!(
    /// Unique supplier code, e.g. `TED001`.
    SupplierCode
);
define_code!(
    /// Unique storage location code, e.g. `DEPO-A`.
    LocationCode
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let code = MaterialCode::parse("  MLZ001 ").unwrap();
        assert_eq!(code.as_str(), "MLZ001");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(MaterialCode::parse("   "), Err(CodeError::Empty));
    }

    #[test]
    fn test_parse_rejects_path_delimiters() {
        assert_eq!(
            SupplierCode::parse("TED/1"),
            Err(CodeError::InvalidCharacter('/'))
        );
        assert_eq!(
            LocationCode::parse("DEPO A"),
            Err(CodeError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_parse_rejects_long_codes() {
        let long = "X".repeat(MAX_CODE_LEN + 1);
        assert!(matches!(
            MaterialCode::parse(&long),
            Err(CodeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: MaterialCode = serde_json::from_str("\"KRT-01\"").unwrap();
        assert_eq!(ok.to_string(), "KRT-01");
        assert!(serde_json::from_str::<MaterialCode>("\"\"").is_err());
    }

    #[test]
    fn test_turkish_characters_allowed() {
        assert!(LocationCode::parse("DEPO-ŞUBE").is_ok());
    }
}
