//! Materials and their derived stock status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger;
use crate::types::{Category, MaterialCode, StockStatus, Unit};
use crate::validation::{
    Validate, ValidationError, bounded_text, non_negative, non_negative_money, required_text,
};

const fn default_min_level() -> i32 {
    5
}

const fn default_max_level() -> i32 {
    100
}

/// A material with its stock level derived from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "kod")]
    pub code: MaterialCode,
    #[serde(rename = "ad")]
    pub name: String,
    #[serde(rename = "kategori")]
    pub category: Category,
    #[serde(rename = "birim")]
    pub unit: Unit,
    #[serde(rename = "mevcut_stok")]
    pub current_stock: i64,
    #[serde(rename = "min_seviye")]
    pub min_level: i32,
    #[serde(rename = "max_seviye")]
    pub max_level: i32,
    #[serde(rename = "konum")]
    pub location: String,
    #[serde(rename = "raf")]
    pub shelf: String,
    #[serde(rename = "barkod")]
    pub barcode: String,
    #[serde(rename = "birim_fiyat")]
    pub unit_price: Decimal,
    #[serde(rename = "durum")]
    pub status: StockStatus,
    #[serde(rename = "son_guncelleme", default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Material {
    /// Build a material from its descriptive fields and ledger sum.
    #[must_use]
    pub fn from_details(
        code: MaterialCode,
        details: MaterialDetails,
        current_stock: i64,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status: ledger::classify(current_stock, details.min_level, details.max_level),
            code,
            name: details.name,
            category: details.category,
            unit: details.unit,
            current_stock,
            min_level: details.min_level,
            max_level: details.max_level,
            location: details.location,
            shelf: details.shelf,
            barcode: details.barcode,
            unit_price: details.unit_price,
            last_updated,
        }
    }

    /// Whether the stock is at or below the minimum level.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.current_stock <= i64::from(self.min_level)
    }

    /// Current stock multiplied by the unit price.
    #[must_use]
    pub fn stock_value(&self) -> Decimal {
        Decimal::from(self.current_stock) * self.unit_price
    }
}

impl Validate for Material {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("mevcut_stok", self.current_stock)?;
        let expected = ledger::classify(self.current_stock, self.min_level, self.max_level);
        if self.status != expected {
            return Err(ValidationError::Invalid {
                field: "durum",
                message: format!("{} does not match stock level (expected {expected})", self.status),
            });
        }
        Ok(())
    }
}

/// The user-editable fields of a material. Stock is never edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDetails {
    #[serde(rename = "ad")]
    pub name: String,
    #[serde(rename = "kategori")]
    pub category: Category,
    #[serde(rename = "birim")]
    pub unit: Unit,
    #[serde(rename = "min_seviye", default = "default_min_level")]
    pub min_level: i32,
    #[serde(rename = "max_seviye", default = "default_max_level")]
    pub max_level: i32,
    #[serde(rename = "konum", default)]
    pub location: String,
    #[serde(rename = "raf", default)]
    pub shelf: String,
    #[serde(rename = "barkod", default)]
    pub barcode: String,
    #[serde(rename = "birim_fiyat", default)]
    pub unit_price: Decimal,
}

impl Validate for MaterialDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("ad", &self.name)?;
        non_negative("min_seviye", i64::from(self.min_level))?;
        if self.max_level < self.min_level {
            return Err(ValidationError::OutOfRange {
                field: "max_seviye",
                message: format!(
                    "must be at least min_seviye ({} < {})",
                    self.max_level, self.min_level
                ),
            });
        }
        bounded_text("konum", &self.location)?;
        bounded_text("raf", &self.shelf)?;
        bounded_text("barkod", &self.barcode)?;
        non_negative_money("birim_fiyat", self.unit_price)
    }
}

/// Body of `POST /materials`.
///
/// A non-zero `mevcut_stok` is recorded as an opening `In` movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterial {
    #[serde(rename = "kod")]
    pub code: MaterialCode,
    #[serde(rename = "mevcut_stok", default)]
    pub opening_stock: i64,
    #[serde(flatten)]
    pub details: MaterialDetails,
}

impl Validate for NewMaterial {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("mevcut_stok", self.opening_stock)?;
        if i32::try_from(self.opening_stock).is_err() {
            return Err(ValidationError::OutOfRange {
                field: "mevcut_stok",
                message: "is too large".to_owned(),
            });
        }
        self.details.validate()
    }
}

/// Query parameters of `GET /materials`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFilter {
    #[serde(rename = "kategori", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(rename = "durum", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StockStatus>,
    /// Case-insensitive search over name, code and barcode.
    #[serde(rename = "arama", default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl MaterialFilter {
    #[must_use]
    pub fn matches(&self, material: &Material) -> bool {
        if self.category.is_some_and(|c| c != material.category) {
            return false;
        }
        if self.status.is_some_and(|s| s != material.status) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                material.name.to_lowercase().contains(&term)
                    || material.code.as_str().to_lowercase().contains(&term)
                    || material.barcode.to_lowercase().contains(&term)
            }
        }
    }
}

/// Result of a CSV material import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub success: bool,
    pub imported: u32,
    pub updated: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details() -> MaterialDetails {
        MaterialDetails {
            name: "A4 Fotokopi Kağıdı".to_owned(),
            category: Category::Stationery,
            unit: Unit::Pack,
            min_level: 10,
            max_level: 100,
            location: "DEPO-A".to_owned(),
            shelf: "R1".to_owned(),
            barcode: "8690000000011".to_owned(),
            unit_price: Decimal::new(8550, 2),
        }
    }

    fn material(stock: i64) -> Material {
        Material::from_details(MaterialCode::parse("MLZ001").unwrap(), details(), stock, None)
    }

    #[test]
    fn test_new_material_defaults() {
        let json = r#"{"kod":"MLZ009","ad":"Sünger","kategori":"Temizlik","birim":"Adet"}"#;
        let new: NewMaterial = serde_json::from_str(json).unwrap();
        assert_eq!(new.opening_stock, 0);
        assert_eq!(new.details.min_level, 5);
        assert_eq!(new.details.max_level, 100);
        assert_eq!(new.details.unit_price, Decimal::ZERO);
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_details_reject_inverted_levels() {
        let mut d = details();
        d.max_level = 5;
        assert_eq!(d.validate().unwrap_err().field(), "max_seviye");
    }

    #[test]
    fn test_details_reject_blank_name_and_negative_price() {
        let mut d = details();
        d.name = " ".to_owned();
        assert_eq!(d.validate().unwrap_err().field(), "ad");
        let mut d = details();
        d.unit_price = Decimal::new(-1, 0);
        assert_eq!(d.validate().unwrap_err().field(), "birim_fiyat");
    }

    #[test]
    fn test_status_follows_stock() {
        assert_eq!(material(10).status, StockStatus::Critical);
        assert!(material(10).is_critical());
        assert_eq!(material(11).status, StockStatus::Normal);
        assert_eq!(material(100).status, StockStatus::Excess);
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(material(4).stock_value(), Decimal::new(34200, 2));
    }

    #[test]
    fn test_validate_detects_inconsistent_status() {
        let mut m = material(50);
        assert!(m.validate().is_ok());
        m.status = StockStatus::Critical;
        assert_eq!(m.validate().unwrap_err().field(), "durum");
    }

    #[test]
    fn test_filter_matches() {
        let m = material(50);
        assert!(MaterialFilter::default().matches(&m));
        let by_search = MaterialFilter {
            search: Some("toner".to_owned()),
            ..MaterialFilter::default()
        };
        assert!(!by_search.matches(&m));
        let by_code = MaterialFilter {
            search: Some("mlz0".to_owned()),
            ..MaterialFilter::default()
        };
        assert!(by_code.matches(&m));
        let by_barcode = MaterialFilter {
            search: Some("000011".to_owned()),
            ..MaterialFilter::default()
        };
        assert!(by_barcode.matches(&m));
        let wrong_category = MaterialFilter {
            category: Some(Category::Kitchen),
            ..MaterialFilter::default()
        };
        assert!(!wrong_category.matches(&m));
        let critical = MaterialFilter {
            status: Some(StockStatus::Critical),
            ..MaterialFilter::default()
        };
        assert!(!critical.matches(&m));
    }

    #[test]
    fn test_wire_names() {
        let value = serde_json::to_value(material(3)).unwrap();
        assert_eq!(value["kod"], "MLZ001");
        assert_eq!(value["mevcut_stok"], 3);
        assert_eq!(value["durum"], "Kritik");
        assert_eq!(value["kategori"], "Kırtasiye");
    }
}
