//! In-app notifications.
//!
//! A notification is addressed to a username, a display name, a role label
//! (`"Admin"`, `"Yönetici"`) or [`EVERYONE`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Budget, Material, MaterialRequest, PurchaseOrder, User};
use crate::types::{NotificationId, NotificationKind, RequestStatus, UserRole};
use crate::validation::{Validate, ValidationError, bounded_text, required_text};

/// Recipient that matches every user.
pub const EVERYONE: &str = "all";

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "tarih")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "kullanici")]
    pub recipient: String,
    #[serde(rename = "tip")]
    pub kind: NotificationKind,
    #[serde(rename = "baslik")]
    pub title: String,
    #[serde(rename = "mesaj", default)]
    pub message: String,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "okundu", default)]
    pub read: bool,
}

impl Notification {
    /// Whether `user` sees this notification.
    #[must_use]
    pub fn is_for(&self, user: &User) -> bool {
        addressed_to(&self.recipient, user)
    }
}

/// Whether a recipient string addresses `user`.
#[must_use]
pub fn addressed_to(recipient: &str, user: &User) -> bool {
    recipient == EVERYONE
        || recipient == user.username
        || recipient == user.display_name()
        || recipient == user.role.label()
}

/// Body of `POST /notifications` and the notifications raised by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    #[serde(rename = "kullanici")]
    pub recipient: String,
    #[serde(rename = "tip", default = "default_kind")]
    pub kind: NotificationKind,
    #[serde(rename = "baslik")]
    pub title: String,
    #[serde(rename = "mesaj", default)]
    pub message: String,
    #[serde(default)]
    pub link: String,
}

const fn default_kind() -> NotificationKind {
    NotificationKind::System
}

impl NewNotification {
    #[must_use]
    pub fn new(recipient: impl Into<String>, kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            kind,
            title: title.into(),
            message: String::new(),
            link: String::new(),
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Raised when a movement leaves a material at or below its minimum.
    #[must_use]
    pub fn critical_stock(material: &Material) -> Self {
        Self::new(
            UserRole::Admin.label(),
            NotificationKind::CriticalStock,
            format!("{} kritik stok seviyesinde", material.name),
        )
        .message(format!(
            "Mevcut: {}, Minimum: {}",
            material.current_stock, material.min_level
        ))
        .link("/materials")
    }

    /// Raised for reviewers when a request is created.
    #[must_use]
    pub fn request_created(request: &MaterialRequest) -> Self {
        Self::new(
            UserRole::Manager.label(),
            NotificationKind::System,
            "Yeni talep oluşturuldu",
        )
        .message(format!(
            "{} - {} ({} adet)",
            request.number,
            request.material_name,
            request.quantity.get()
        ))
        .link("/requests")
    }

    /// Raised for the requester once a request is reviewed.
    ///
    /// Returns `None` while the request is still pending.
    #[must_use]
    pub fn request_reviewed(request: &MaterialRequest) -> Option<Self> {
        let (kind, title, message) = match request.status {
            RequestStatus::Pending => return None,
            RequestStatus::Approved => (
                NotificationKind::RequestApproved,
                "Talebiniz onaylandı",
                format!("{} - {}", request.number, request.material_name),
            ),
            RequestStatus::Rejected => (
                NotificationKind::RequestRejected,
                "Talebiniz reddedildi",
                format!("{} - Neden: {}", request.number, request.rejection_reason),
            ),
        };
        Some(
            Self::new(&request.requester, kind, title)
                .message(message)
                .link("/requests"),
        )
    }

    /// Raised for the order's creator when its status moves on.
    #[must_use]
    pub fn order_updated(order: &PurchaseOrder) -> Self {
        Self::new(
            &order.created_by,
            NotificationKind::OrderUpdate,
            format!("Sipariş {} güncellendi", order.number),
        )
        .message(format!("{} - {}", order.supplier_name, order.status))
        .link("/orders")
    }

    /// Raised for admins when spending passes a category's annual limit.
    ///
    /// Returns `None` while the budget still has room.
    #[must_use]
    pub fn budget_overrun(budget: &Budget) -> Option<Self> {
        let overrun = budget.overrun()?;
        Some(
            Self::new(
                UserRole::Admin.label(),
                NotificationKind::BudgetWarning,
                format!("{} bütçe limiti aşıldı!", budget.category),
            )
            .message(format!("Aşım miktarı: {overrun:.2} TL"))
            .link("/budget"),
        )
    }
}

impl Validate for NewNotification {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("kullanici", &self.recipient)?;
        required_text("baslik", &self.title)?;
        bounded_text("mesaj", &self.message)?;
        bounded_text("link", &self.link)
    }
}

/// Response of `GET /notifications/unread/count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::ledger::Quantity;
    use crate::types::{Category, MaterialCode, Priority, RequestNo};

    fn user(role: UserRole) -> User {
        User {
            username: "mehmet".to_owned(),
            full_name: "Mehmet Kaya".to_owned(),
            email: String::new(),
            department: "Muhasebe".to_owned(),
            role,
            active: true,
            last_login: None,
        }
    }

    fn request(status: RequestStatus) -> MaterialRequest {
        MaterialRequest {
            number: RequestNo::from_sequence(4),
            created_at: Utc::now(),
            material_code: MaterialCode::parse("KRT-001").unwrap(),
            material_name: "A4 Kağıt".to_owned(),
            quantity: Quantity::new(10).unwrap(),
            priority: Priority::High,
            note: String::new(),
            requester: "Mehmet Kaya".to_owned(),
            department: "Muhasebe".to_owned(),
            status,
            reviewed_by: "Ayşe Yılmaz".to_owned(),
            reviewed_at: None,
            rejection_reason: "Bütçe yok".to_owned(),
        }
    }

    #[test]
    fn test_recipient_matching() {
        let manager = user(UserRole::Manager);
        assert!(addressed_to("mehmet", &manager));
        assert!(addressed_to("Mehmet Kaya", &manager));
        assert!(addressed_to("Yönetici", &manager));
        assert!(addressed_to(EVERYONE, &manager));
        assert!(!addressed_to("Admin", &manager));
        assert!(!addressed_to("ayse", &manager));
    }

    #[test]
    fn test_request_notifications() {
        let created = NewNotification::request_created(&request(RequestStatus::Pending));
        assert_eq!(created.recipient, "Yönetici");
        assert_eq!(created.message, "TLP000004 - A4 Kağıt (10 adet)");

        assert!(NewNotification::request_reviewed(&request(RequestStatus::Pending)).is_none());

        let approved = NewNotification::request_reviewed(&request(RequestStatus::Approved)).unwrap();
        assert_eq!(approved.kind, NotificationKind::RequestApproved);
        assert_eq!(approved.recipient, "Mehmet Kaya");
        assert!(approved.validate().is_ok());

        let rejected = NewNotification::request_reviewed(&request(RequestStatus::Rejected)).unwrap();
        assert_eq!(rejected.kind, NotificationKind::RequestRejected);
        assert_eq!(rejected.message, "TLP000004 - Neden: Bütçe yok");
    }

    #[test]
    fn test_budget_overrun_message() {
        let mut budget = Budget {
            year: 2026,
            category: Category::Kitchen,
            monthly_limit: Decimal::from(2000),
            annual_limit: Decimal::from(24_000),
            used: Decimal::from(23_000),
            remaining: Decimal::from(1000),
        };
        assert!(NewNotification::budget_overrun(&budget).is_none());

        budget.record_spend(Decimal::new(150_050, 2));
        let warning = NewNotification::budget_overrun(&budget).unwrap();
        assert_eq!(warning.recipient, "Admin");
        assert_eq!(warning.title, "Mutfak bütçe limiti aşıldı!");
        assert_eq!(warning.message, "Aşım miktarı: 500.50 TL");
    }

    #[test]
    fn test_posted_notification_defaults() {
        let json = r#"{"kullanici":"all","baslik":"Bakım"}"#;
        let posted: NewNotification = serde_json::from_str(json).unwrap();
        assert_eq!(posted.kind, NotificationKind::System);
        assert!(posted.validate().is_ok());

        let blank = NewNotification::new(" ", NotificationKind::System, "Bakım");
        assert_eq!(blank.validate().unwrap_err().field(), "kullanici");
    }
}
