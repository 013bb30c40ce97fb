//! Stock movements: the append-only ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::Quantity;
use crate::types::{MaterialCode, MovementDirection, MovementId, OrderNo};
use crate::validation::{Validate, ValidationError, bounded_text};

/// A recorded movement. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    #[serde(rename = "tarih")]
    pub recorded_at: DateTime<Utc>,
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "islem_tipi")]
    pub direction: MovementDirection,
    #[serde(rename = "miktar")]
    pub quantity: Quantity,
    /// Supplier for incoming stock, receiving person or department for outgoing.
    #[serde(rename = "tedarikci_teslim_alan", default)]
    pub counterparty: String,
    #[serde(rename = "aciklama", default)]
    pub note: String,
    #[serde(rename = "siparis_no", default)]
    pub order_no: Option<OrderNo>,
    #[serde(rename = "onaylayan", default)]
    pub approved_by: String,
}

impl Movement {
    /// Signed effect on the material's stock.
    #[must_use]
    pub fn delta(&self) -> i64 {
        crate::ledger::signed(self.direction, self.quantity)
    }
}

/// Body of `POST /movements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "islem_tipi")]
    pub direction: MovementDirection,
    #[serde(rename = "miktar")]
    pub quantity: Quantity,
    #[serde(rename = "tedarikci_teslim_alan", default)]
    pub counterparty: String,
    #[serde(rename = "aciklama", default)]
    pub note: String,
    #[serde(rename = "siparis_no", default)]
    pub order_no: Option<OrderNo>,
    #[serde(rename = "onaylayan", default)]
    pub approved_by: String,
}

impl Validate for NewMovement {
    fn validate(&self) -> Result<(), ValidationError> {
        bounded_text("tedarikci_teslim_alan", &self.counterparty)?;
        bounded_text("aciklama", &self.note)?;
        bounded_text("onaylayan", &self.approved_by)
    }
}

/// Query parameters of `GET /movements`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    #[serde(rename = "malzeme_kodu", default, skip_serializing_if = "Option::is_none")]
    pub material_code: Option<MaterialCode>,
    #[serde(rename = "islem_tipi", default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<MovementDirection>,
}
