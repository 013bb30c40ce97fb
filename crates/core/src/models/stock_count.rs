//! Planned physical stock counts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CountNo, CountStatus, MaterialCode};
use crate::validation::{Validate, ValidationError, bounded_text, non_negative};

/// A stock count with one line per selected material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCount {
    #[serde(rename = "sayim_no")]
    pub number: CountNo,
    #[serde(rename = "tarih")]
    pub created_at: DateTime<Utc>,
    /// `None` counts every location.
    #[serde(rename = "lokasyon", default)]
    pub location: Option<String>,
    #[serde(rename = "planlanan_tarih")]
    pub planned_date: NaiveDate,
    #[serde(rename = "aciklama", default)]
    pub note: String,
    #[serde(rename = "durum")]
    pub status: CountStatus,
    #[serde(rename = "olusturan", default)]
    pub created_by: String,
    #[serde(rename = "tamamlayan", default)]
    pub completed_by: String,
    #[serde(rename = "tamamlanma_tarihi", default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "kalemler", default)]
    pub lines: Vec<StockCountLine>,
}

impl StockCount {
    /// Lines whose counted quantity differs from the snapshot.
    pub fn discrepancies(&self) -> impl Iterator<Item = &StockCountLine> {
        self.lines
            .iter()
            .filter(|l| l.difference.is_some_and(|d| d != 0))
    }
}

/// Expected quantity snapshot for one material, and the counted result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCountLine {
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "malzeme_adi", default)]
    pub material_name: String,
    #[serde(rename = "beklenen_miktar")]
    pub expected: i64,
    #[serde(rename = "sayilan_miktar", default)]
    pub counted: Option<i64>,
    /// `counted - expected`.
    #[serde(rename = "fark", default)]
    pub difference: Option<i64>,
}

impl StockCountLine {
    #[must_use]
    pub const fn planned(material_code: MaterialCode, material_name: String, expected: i64) -> Self {
        Self {
            material_code,
            material_name,
            expected,
            counted: None,
            difference: None,
        }
    }

    /// Record a counted quantity and its difference to the snapshot.
    pub fn record(&mut self, counted: i64) {
        self.counted = Some(counted);
        self.difference = Some(counted - self.expected);
    }
}

/// Body of `POST /stock-counts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockCount {
    #[serde(rename = "lokasyon", default)]
    pub location: Option<String>,
    #[serde(rename = "planlanan_tarih")]
    pub planned_date: NaiveDate,
    #[serde(rename = "aciklama", default)]
    pub note: String,
    /// Empty selects every material (at the location, when one is given).
    #[serde(rename = "malzeme_kodlari", default)]
    pub material_codes: Vec<MaterialCode>,
    #[serde(rename = "olusturan", default)]
    pub created_by: String,
}

impl NewStockCount {
    /// The location filter, treating a blank value as "all locations".
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

impl Validate for NewStockCount {
    fn validate(&self) -> Result<(), ValidationError> {
        bounded_text("lokasyon", self.location().unwrap_or_default())?;
        bounded_text("aciklama", &self.note)?;
        bounded_text("olusturan", &self.created_by)
    }
}

/// A counted quantity for one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedQuantity {
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "sayilan_miktar")]
    pub counted: i64,
}

impl Validate for CountedQuantity {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("sayilan_miktar", self.counted)
    }
}

/// Optional body of `PUT /stock-counts/{no}/complete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteCount {
    #[serde(rename = "sayimlar", default)]
    pub counted: Vec<CountedQuantity>,
}

impl Validate for CompleteCount {
    fn validate(&self) -> Result<(), ValidationError> {
        self.counted.validate()
    }
}

/// Query parameters of `PUT /stock-counts/{no}/complete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteCountQuery {
    #[serde(rename = "tamamlayan", default)]
    pub completed_by: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_computes_difference() {
        let mut line =
            StockCountLine::planned(MaterialCode::parse("MLZ001").unwrap(), "Kalem".to_owned(), 20);
        line.record(17);
        assert_eq!(line.counted, Some(17));
        assert_eq!(line.difference, Some(-3));
    }

    #[test]
    fn test_blank_location_means_all() {
        let json = r#"{"lokasyon":"  ","planlanan_tarih":"2026-05-01"}"#;
        let count: NewStockCount = serde_json::from_str(json).unwrap();
        assert_eq!(count.location(), None);
        assert!(count.material_codes.is_empty());

        let json = r#"{"lokasyon":"DEPO-A","planlanan_tarih":"2026-05-01","malzeme_kodlari":["MLZ001"]}"#;
        let count: NewStockCount = serde_json::from_str(json).unwrap();
        assert_eq!(count.location(), Some("DEPO-A"));
        assert_eq!(count.material_codes.len(), 1);
    }

    #[test]
    fn test_counted_quantity_cannot_be_negative() {
        let body = CompleteCount {
            counted: vec![CountedQuantity {
                material_code: MaterialCode::parse("MLZ001").unwrap(),
                counted: -1,
            }],
        };
        assert_eq!(body.validate().unwrap_err().field(), "sayilan_miktar");
    }
}
