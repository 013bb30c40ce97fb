//! Purchase orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Quantity;
use crate::types::{MaterialCode, OrderNo, OrderStatus, SupplierCode};
use crate::validation::{Validate, ValidationError, bounded_text, non_negative_money};

/// A purchase order placed with a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    #[serde(rename = "siparis_no")]
    pub number: OrderNo,
    #[serde(rename = "tarih")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "tedarikci_kodu")]
    pub supplier_code: SupplierCode,
    #[serde(rename = "tedarikci_adi", default)]
    pub supplier_name: String,
    #[serde(rename = "kalemler")]
    pub lines: Vec<OrderLine>,
    #[serde(rename = "notlar", default)]
    pub notes: String,
    #[serde(rename = "toplam_tutar")]
    pub total: Decimal,
    #[serde(rename = "durum")]
    pub status: OrderStatus,
    #[serde(rename = "olusturan", default)]
    pub created_by: String,
    #[serde(rename = "onaylayan", default)]
    pub approved_by: String,
    #[serde(rename = "teslim_tarihi", default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    /// The single status this order may move to next.
    #[must_use]
    pub const fn next_status(&self) -> Option<OrderStatus> {
        self.status.next()
    }
}

impl Validate for PurchaseOrder {
    fn validate(&self) -> Result<(), ValidationError> {
        let expected = order_total(&self.lines);
        if self.total != expected {
            return Err(ValidationError::Invalid {
                field: "toplam_tutar",
                message: format!("{} does not equal the line total {expected}", self.total),
            });
        }
        if self.lines.iter().any(|l| l.total != l.unit_price * Decimal::from(l.quantity.get())) {
            return Err(ValidationError::Invalid {
                field: "kalemler",
                message: "line total does not equal quantity times unit price".to_owned(),
            });
        }
        if (self.status == OrderStatus::Delivered) != self.delivered_at.is_some() {
            return Err(ValidationError::Invalid {
                field: "teslim_tarihi",
                message: "is set exactly when the order is delivered".to_owned(),
            });
        }
        Ok(())
    }
}

/// One line of an order with its computed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "malzeme_adi", default)]
    pub material_name: String,
    #[serde(rename = "miktar")]
    pub quantity: Quantity,
    #[serde(rename = "birim_fiyat")]
    pub unit_price: Decimal,
    #[serde(rename = "toplam")]
    pub total: Decimal,
}

impl From<NewOrderLine> for OrderLine {
    fn from(line: NewOrderLine) -> Self {
        Self {
            total: line.unit_price * Decimal::from(line.quantity.get()),
            material_code: line.material_code,
            material_name: line.material_name,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Sum of the line totals.
#[must_use]
pub fn order_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(|l| l.total).sum()
}

/// A line as submitted; any client-side total is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "malzeme_adi", default)]
    pub material_name: String,
    #[serde(rename = "miktar")]
    pub quantity: Quantity,
    #[serde(rename = "birim_fiyat", default)]
    pub unit_price: Decimal,
}

impl Validate for NewOrderLine {
    fn validate(&self) -> Result<(), ValidationError> {
        bounded_text("malzeme_adi", &self.material_name)?;
        non_negative_money("birim_fiyat", self.unit_price)
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(rename = "tedarikci_kodu")]
    pub supplier_code: SupplierCode,
    #[serde(rename = "tedarikci_adi", default)]
    pub supplier_name: String,
    #[serde(rename = "kalemler")]
    pub lines: Vec<NewOrderLine>,
    #[serde(rename = "notlar", default)]
    pub notes: String,
    #[serde(rename = "olusturan", default)]
    pub created_by: String,
}

impl NewOrder {
    /// Lines with their totals computed.
    #[must_use]
    pub fn priced_lines(&self) -> Vec<OrderLine> {
        self.lines.iter().cloned().map(OrderLine::from).collect()
    }
}

impl Validate for NewOrder {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.lines.is_empty() {
            return Err(ValidationError::Required { field: "kalemler" });
        }
        self.lines.validate()?;
        bounded_text("tedarikci_adi", &self.supplier_name)?;
        bounded_text("notlar", &self.notes)?;
        bounded_text("olusturan", &self.created_by)
    }
}

/// Query parameters of `GET /orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(rename = "durum", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(rename = "tedarikci_kodu", default, skip_serializing_if = "Option::is_none")]
    pub supplier_code: Option<SupplierCode>,
}

/// Query parameters of `PUT /orders/{no}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusQuery {
    #[serde(rename = "durum")]
    pub status: OrderStatus,
    #[serde(rename = "onaylayan", default)]
    pub approver: String,
}
