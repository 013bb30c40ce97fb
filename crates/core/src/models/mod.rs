//! Wire types shared by the server and the client.
//!
//! Field names follow the API's JSON contract (`kod`, `mevcut_stok`,
//! `talep_no`, ...); the Rust names say what the fields mean.

pub mod audit;
pub mod budget;
pub mod location;
pub mod material;
pub mod movement;
pub mod notification;
pub mod order;
pub mod request;
pub mod stock_count;
pub mod supplier;
pub mod user;

use serde::{Deserialize, Serialize};

pub use audit::{AuditEntry, AuditFilter, NewAuditEntry};
pub use budget::{Budget, BudgetQuery, BudgetSpend, BudgetStatus, BudgetSummary, NewBudget};
pub use location::{Location, NewLocation};
pub use material::{ImportSummary, Material, MaterialDetails, MaterialFilter, NewMaterial};
pub use movement::{Movement, MovementFilter, NewMovement};
pub use notification::{NewNotification, Notification, UnreadCount};
pub use order::{NewOrder, NewOrderLine, OrderFilter, OrderLine, OrderStatusQuery, PurchaseOrder, order_total};
pub use request::{MaterialRequest, NewMaterialRequest, RequestFilter, ReviewQuery};
pub use stock_count::{CompleteCount, CompleteCountQuery, CountedQuantity, NewStockCount, StockCount, StockCountLine};
pub use supplier::{NewSupplier, SupplierDetails, Rating, Supplier, SupplierFilter};
pub use user::{Credentials, NewUser, Session, User, UserUpdate};

/// Plain acknowledgement returned by deletes and logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
