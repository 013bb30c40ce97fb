//! Storage locations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::LocationCode;
use crate::validation::{Validate, ValidationError, bounded_text, required_text};

const fn default_active() -> bool {
    true
}

/// A location with the number and value of the materials stored there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(flatten)]
    pub location: NewLocation,
    #[serde(rename = "malzeme_sayisi", default)]
    pub material_count: i64,
    #[serde(rename = "toplam_deger", default)]
    pub total_value: Decimal,
}

/// Body of `POST /locations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    #[serde(rename = "kod")]
    pub code: LocationCode,
    #[serde(rename = "ad")]
    pub name: String,
    #[serde(rename = "adres", default)]
    pub address: String,
    #[serde(rename = "sorumlu", default)]
    pub responsible: String,
    #[serde(rename = "telefon", default)]
    pub phone: String,
    #[serde(rename = "aktif", default = "default_active")]
    pub active: bool,
}

impl Validate for NewLocation {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("ad", &self.name)?;
        bounded_text("adres", &self.address)?;
        bounded_text("sorumlu", &self.responsible)?;
        bounded_text("telefon", &self.phone)
    }
}
