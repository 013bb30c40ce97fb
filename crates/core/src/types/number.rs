//! Server-assigned document numbers.
//!
//! Requests, orders and stock counts are numbered from database sequences and
//! rendered as a fixed prefix followed by a zero-padded sequence value:
//! `TLP000001`, `SIP000001`, `SAY000001`. Ordering follows the sequence, so
//! numbers compare in creation order.

use thiserror::Error;

/// Width of the zero-padded sequence part.
const SEQUENCE_WIDTH: usize = 6;

/// Errors that can occur when parsing a document number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentNumberError {
    #[error("document number must start with {expected}")]
    WrongPrefix { expected: &'static str },
    #[error("document number has no sequence digits")]
    MissingSequence,
    #[error("document number sequence is not numeric: {0}")]
    InvalidSequence(String),
}

fn parse_sequence(s: &str, prefix: &'static str) -> Result<i64, DocumentNumberError> {
    let digits = s
        .trim()
        .strip_prefix(prefix)
        .ok_or(DocumentNumberError::WrongPrefix { expected: prefix })?;
    if digits.is_empty() {
        return Err(DocumentNumberError::MissingSequence);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DocumentNumberError::InvalidSequence(digits.to_owned()));
    }
    digits
        .parse()
        .map_err(|_| DocumentNumberError::InvalidSequence(digits.to_owned()))
}

macro_rules! define_document_number {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(i64);

        impl $name {
            /// Prefix that identifies this kind of document.
            pub const PREFIX: &'static str = $prefix;

            /// Build a document number from a database sequence value.
            #[must_use]
            pub const fn from_sequence(sequence: i64) -> Self {
                Self(sequence)
            }

            /// The sequence value this number was built from.
            #[must_use]
            pub const fn sequence(&self) -> i64 {
                self.0
            }

            /// Parse a rendered document number such as the one in a URL path.
            ///
            /// # Errors
            ///
            /// Returns `DocumentNumberError` if the prefix is wrong or the
            /// remainder is not a decimal sequence.
            pub fn parse(s: &str) -> Result<Self, DocumentNumberError> {
                parse_sequence(s, $prefix).map(Self)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}{:0width$}", $prefix, self.0, width = SEQUENCE_WIDTH)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = DocumentNumberError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DocumentNumberError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(number: $name) -> Self {
                number.to_string()
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
                let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self::parse(s)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
            }
        }
    };
}

define_document_number!(
    /// Material request number (`talep_no`).
    RequestNo,
    "TLP"
);
define_document_number!(
    /// Purchase order number (`siparis_no`).
    OrderNo,
    "SIP"
);
define_document_number!(
    /// Stock count number (`sayim_no`).
    CountNo,
    "SAY"
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_sequence() {
        assert_eq!(RequestNo::from_sequence(1).to_string(), "TLP000001");
        assert_eq!(OrderNo::from_sequence(42).to_string(), "SIP000042");
        assert_eq!(CountNo::from_sequence(1_234_567).to_string(), "SAY1234567");
    }

    #[test]
    fn test_parse() {
        let no = OrderNo::parse("SIP000123").unwrap();
        assert_eq!(no.sequence(), 123);
    }

    #[test]
    fn test_parse_wrong_prefix() {
        assert_eq!(
            RequestNo::parse("SIP000001"),
            Err(DocumentNumberError::WrongPrefix { expected: "TLP" })
        );
    }

    #[test]
    fn test_parse_rejects_missing_or_bad_digits() {
        assert_eq!(
            CountNo::parse("SAY"),
            Err(DocumentNumberError::MissingSequence)
        );
        assert!(matches!(
            CountNo::parse("SAY00x1"),
            Err(DocumentNumberError::InvalidSequence(_))
        ));
    }

    #[test]
    fn test_ordering_follows_sequence() {
        let earlier = RequestNo::parse("TLP999999").unwrap();
        let later = RequestNo::from_sequence(1_000_000);
        assert!(earlier < later);
    }

    #[test]
    fn test_serde_uses_rendered_form() {
        let no = RequestNo::from_sequence(7);
        let json = serde_json::to_string(&no).unwrap();
        assert_eq!(json, "\"TLP000007\"");
        let back: RequestNo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, no);
    }
}
