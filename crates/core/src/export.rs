//! Tabular exports: `GET /export/{type}` returns headers and rows that the
//! CLI writes out as CSV.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::models::{Material, MaterialRequest, Movement, PurchaseOrder};

/// Export type in the `/export/{type}` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Materials,
    Movements,
    Requests,
    Orders,
}

impl ExportKind {
    pub const ALL: [Self; 4] = [Self::Materials, Self::Movements, Self::Requests, Self::Orders];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Movements => "movements",
            Self::Requests => "requests",
            Self::Orders => "orders",
        }
    }

    /// Suggested file name for the exported table.
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::Materials => "malzemeler.csv",
            Self::Movements => "hareketler.csv",
            Self::Requests => "talepler.csv",
            Self::Orders => "siparisler.csv",
        }
    }

    /// Column headers, in row order.
    #[must_use]
    pub const fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Materials => &[
                "Kod", "Ad", "Kategori", "Birim", "Stok", "Min", "Max", "Konum", "Raf", "Barkod",
                "Fiyat", "Durum",
            ],
            Self::Movements => &[
                "Tarih",
                "Malzeme Kodu",
                "İşlem",
                "Miktar",
                "Kişi/Firma",
                "Açıklama",
                "Sipariş No",
                "Onaylayan",
            ],
            Self::Requests => &[
                "Talep No",
                "Tarih",
                "Malzeme",
                "Miktar",
                "Öncelik",
                "Talep Eden",
                "Departman",
                "Durum",
            ],
            Self::Orders => &["Sipariş No", "Tarih", "Tedarikçi", "Tutar", "Durum", "Oluşturan"],
        }
    }
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown export type: {s}"))
    }
}

/// An exported table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    pub filename: String,
    pub headers: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

impl ExportTable {
    fn new(kind: ExportKind, data: Vec<Vec<Value>>) -> Self {
        Self {
            filename: kind.filename().to_owned(),
            headers: kind.headers().iter().map(|h| (*h).to_owned()).collect(),
            data,
        }
    }

    #[must_use]
    pub fn materials(materials: &[Material]) -> Self {
        let rows = materials
            .iter()
            .map(|m| {
                vec![
                    json!(m.code),
                    json!(m.name),
                    json!(m.category),
                    json!(m.unit),
                    json!(m.current_stock),
                    json!(m.min_level),
                    json!(m.max_level),
                    json!(m.location),
                    json!(m.shelf),
                    json!(m.barcode),
                    json!(m.unit_price),
                    json!(m.status),
                ]
            })
            .collect();
        Self::new(ExportKind::Materials, rows)
    }

    #[must_use]
    pub fn movements(movements: &[Movement]) -> Self {
        let rows = movements
            .iter()
            .map(|m| {
                vec![
                    json!(m.recorded_at.format(TIMESTAMP_FORMAT).to_string()),
                    json!(m.material_code),
                    json!(m.direction),
                    json!(m.quantity),
                    json!(m.counterparty),
                    json!(m.note),
                    json!(m.order_no.map(|n| n.to_string()).unwrap_or_default()),
                    json!(m.approved_by),
                ]
            })
            .collect();
        Self::new(ExportKind::Movements, rows)
    }

    #[must_use]
    pub fn requests(requests: &[MaterialRequest]) -> Self {
        let rows = requests
            .iter()
            .map(|r| {
                vec![
                    json!(r.number),
                    json!(r.created_at.format(TIMESTAMP_FORMAT).to_string()),
                    json!(r.material_name),
                    json!(r.quantity),
                    json!(r.priority),
                    json!(r.requester),
                    json!(r.department),
                    json!(r.status),
                ]
            })
            .collect();
        Self::new(ExportKind::Requests, rows)
    }

    #[must_use]
    pub fn orders(orders: &[PurchaseOrder]) -> Self {
        let rows = orders
            .iter()
            .map(|o| {
                vec![
                    json!(o.number),
                    json!(o.created_at.format(TIMESTAMP_FORMAT).to_string()),
                    json!(o.supplier_name),
                    json!(o.total),
                    json!(o.status),
                    json!(o.created_by),
                ]
            })
            .collect();
        Self::new(ExportKind::Orders, rows)
    }

    /// Render one cell as plain text for CSV output.
    #[must_use]
    pub fn cell_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Whether every row has one cell per header.
    #[must_use]
    pub fn is_rectangular(&self) -> bool {
        self.data.iter().all(|row| row.len() == self.headers.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::MaterialDetails;
    use crate::types::{Category, MaterialCode, Unit};

    #[test]
    fn test_kind_parsing() {
        assert_eq!("orders".parse::<ExportKind>().unwrap(), ExportKind::Orders);
        assert!("budgets".parse::<ExportKind>().is_err());
    }

    #[test]
    fn test_material_rows_match_headers() {
        let material = Material::from_details(
            MaterialCode::parse("MLZ001").unwrap(),
            MaterialDetails {
                name: "Tükenmez Kalem".to_owned(),
                category: Category::Stationery,
                unit: Unit::Box,
                min_level: 5,
                max_level: 50,
                location: "DEPO-A".to_owned(),
                shelf: "R2".to_owned(),
                barcode: String::new(),
                unit_price: Decimal::new(4500, 2),
            },
            12,
            None,
        );
        let table = ExportTable::materials(&[material]);
        assert_eq!(table.filename, "malzemeler.csv");
        assert!(table.is_rectangular());
        let row = &table.data[0];
        assert_eq!(ExportTable::cell_text(&row[0]), "MLZ001");
        assert_eq!(ExportTable::cell_text(&row[2]), "Kırtasiye");
        assert_eq!(ExportTable::cell_text(&row[4]), "12");
        assert_eq!(ExportTable::cell_text(&row[11]), "Normal");
    }

    #[test]
    fn test_headers_have_expected_widths() {
        assert_eq!(ExportKind::Materials.headers().len(), 12);
        assert_eq!(ExportKind::Movements.headers().len(), 8);
        assert_eq!(ExportKind::Requests.headers().len(), 8);
        assert_eq!(ExportKind::Orders.headers().len(), 6);
    }
}
