//! Suppliers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SupplierCode;
use crate::validation::{Validate, ValidationError, bounded_text, optional_email, required_text};

/// Supplier rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Rating(i16);

impl Rating {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    /// # Errors
    ///
    /// Returns `OutOfRange` outside 1..=5.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        i16::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "puan",
                message: format!("must be between {} and {} (got {value})", Self::MIN, Self::MAX),
            })
    }

    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

const fn default_active() -> bool {
    true
}

/// A supplier with its derived order statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(rename = "kod")]
    pub code: SupplierCode,
    #[serde(flatten)]
    pub details: SupplierDetails,
    #[serde(rename = "toplam_siparis", default)]
    pub order_count: i64,
    #[serde(rename = "son_siparis", default)]
    pub last_order_at: Option<DateTime<Utc>>,
}

/// The user-editable fields of a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDetails {
    #[serde(rename = "ad")]
    pub name: String,
    #[serde(rename = "yetkili_kisi", default)]
    pub contact_person: String,
    #[serde(rename = "telefon", default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "adres", default)]
    pub address: String,
    #[serde(rename = "kategori", default)]
    pub category: String,
    #[serde(rename = "puan", default)]
    pub rating: Rating,
    #[serde(rename = "notlar", default)]
    pub notes: String,
    #[serde(rename = "aktif", default = "default_active")]
    pub active: bool,
}

impl Validate for SupplierDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("ad", &self.name)?;
        bounded_text("yetkili_kisi", &self.contact_person)?;
        bounded_text("telefon", &self.phone)?;
        optional_email("email", &self.email)?;
        bounded_text("adres", &self.address)?;
        bounded_text("kategori", &self.category)?;
        bounded_text("notlar", &self.notes)
    }
}

/// Body of `POST /suppliers` and `PUT /suppliers/{kod}`.
///
/// On update the path code wins over the body code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    #[serde(rename = "kod")]
    pub code: SupplierCode,
    #[serde(flatten)]
    pub details: SupplierDetails,
}

impl Validate for NewSupplier {
    fn validate(&self) -> Result<(), ValidationError> {
        self.details.validate()
    }
}

/// Query parameters of `GET /suppliers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierFilter {
    #[serde(rename = "kategori", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "aktif", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(3).unwrap().get(), 3);
        assert_eq!(Rating::default().get(), 5);
    }

    #[test]
    fn test_rating_deserialize_validates() {
        let json = r#"{"kod":"TED001","ad":"ABC","puan":9}"#;
        assert!(serde_json::from_str::<NewSupplier>(json).is_err());
    }

    #[test]
    fn test_supplier_defaults() {
        let json = r#"{"kod":"TED001","ad":"ABC Kırtasiye"}"#;
        let supplier: NewSupplier = serde_json::from_str(json).unwrap();
        assert!(supplier.details.active);
        assert_eq!(supplier.details.rating, Rating::default());
        assert!(supplier.validate().is_ok());
    }

    #[test]
    fn test_supplier_rejects_bad_email() {
        let json = r#"{"kod":"TED001","ad":"ABC","email":"abc"}"#;
        let supplier: NewSupplier = serde_json::from_str(json).unwrap();
        assert_eq!(supplier.validate().unwrap_err().field(), "email");
    }

    #[test]
    fn test_supplier_wire_is_flat() {
        let json = r#"{"kod":"TED002","ad":"Temiz AŞ","puan":4,"toplam_siparis":7}"#;
        let supplier: Supplier = serde_json::from_str(json).unwrap();
        assert_eq!(supplier.order_count, 7);
        let value = serde_json::to_value(&supplier).unwrap();
        assert_eq!(value["ad"], "Temiz AŞ");
        assert_eq!(value["puan"], 4);
    }
}
