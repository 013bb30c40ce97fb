//! Dashboard application state.
//!
//! One explicit container for what a dashboard session holds: the signed-in
//! user, the current page and the last fetched data. Page navigation is a
//! plain [`Page`] value; changing it refetches the shared data.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;

use envanter_core::analytics::DashboardStats;
use envanter_core::models::{
    Material, MaterialFilter, MaterialRequest, Movement, MovementFilter, NewOrderLine,
    Notification, OrderFilter, PurchaseOrder, RequestFilter, Supplier, SupplierFilter, User,
};
use envanter_core::{MaterialCode, OrderStatus, Quantity, RequestStatus};

use crate::client::ApiClient;
use crate::error::ClientError;

/// A dashboard screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Dashboard,
    Materials,
    Movements,
    Requests,
    Orders,
    Suppliers,
    Analytics,
    Predictions,
    Locations,
    StockCount,
    Audit,
    Reports,
    Notifications,
    Budget,
}

impl Page {
    /// Every page in menu order.
    pub const ALL: [Self; 14] = [
        Self::Dashboard,
        Self::Materials,
        Self::Movements,
        Self::Requests,
        Self::Orders,
        Self::Suppliers,
        Self::Analytics,
        Self::Predictions,
        Self::Locations,
        Self::StockCount,
        Self::Audit,
        Self::Reports,
        Self::Notifications,
        Self::Budget,
    ];

    /// Stable key used in links and settings.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Materials => "materials",
            Self::Movements => "movements",
            Self::Requests => "requests",
            Self::Orders => "orders",
            Self::Suppliers => "suppliers",
            Self::Analytics => "analytics",
            Self::Predictions => "predictions",
            Self::Locations => "locations",
            Self::StockCount => "stockcount",
            Self::Audit => "audit",
            Self::Reports => "reports",
            Self::Notifications => "notifications",
            Self::Budget => "budget",
        }
    }

    /// Page heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Materials => "Malzemeler",
            Self::Movements => "Stok Hareketleri",
            Self::Requests => "Talepler",
            Self::Orders => "Siparişler",
            Self::Suppliers => "Tedarikçiler",
            Self::Analytics => "Analitik",
            Self::Predictions => "Stok Tahminleri",
            Self::Locations => "Lokasyonlar",
            Self::StockCount => "Stok Sayım",
            Self::Audit => "Audit Log",
            Self::Reports => "Raporlar",
            Self::Notifications => "Bildirimler",
            Self::Budget => "Bütçe",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| format!("unknown page: {s}"))
    }
}

/// The single order action offered for an order's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAction {
    pub target: OrderStatus,
    pub label: &'static str,
}

/// The valid next status of an order, if any.
#[must_use]
pub fn next_action(order: &PurchaseOrder) -> Option<OrderAction> {
    let target = order.next_status()?;
    let label = match target {
        OrderStatus::Approved => "Onayla",
        OrderStatus::InTransit => "Yolda",
        OrderStatus::Delivered => "Teslim",
        OrderStatus::AwaitingApproval => return None,
    };
    Some(OrderAction { target, label })
}

/// Data shared by the dashboard screens.
///
/// A fetch that failed leaves its part empty.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub stats: Option<DashboardStats>,
    pub materials: Vec<Material>,
    pub movements: Vec<Movement>,
    pub critical: Vec<Material>,
    pub requests: Vec<MaterialRequest>,
    pub suppliers: Vec<Supplier>,
    pub orders: Vec<PurchaseOrder>,
    pub notifications: Vec<Notification>,
}

/// Dashboard session state.
#[derive(Debug)]
pub struct Dashboard {
    client: ApiClient,
    user: Option<User>,
    page: Page,
    data: Snapshot,
}

impl Dashboard {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            user: None,
            page: Page::default(),
            data: Snapshot::default(),
        }
    }

    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn page(&self) -> Page {
        self.page
    }

    #[must_use]
    pub const fn data(&self) -> &Snapshot {
        &self.data
    }

    /// Sign in and load the shared data.
    ///
    /// Returns the fetches that failed during the initial load.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the login itself fails.
    pub async fn login(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<Vec<ClientError>, ClientError> {
        let user = self.client.login(username, password).await?;
        self.user = Some(user);
        Ok(self.refresh().await)
    }

    /// Sign out and drop all cached data.
    pub async fn logout(&mut self) {
        if let Err(e) = self.client.logout().await {
            tracing::warn!(error = %e, "Logout call failed; session dropped locally");
        }
        self.user = None;
        self.page = Page::default();
        self.data = Snapshot::default();
    }

    /// Switch page and refetch when signed in.
    pub async fn navigate(&mut self, page: Page) -> Vec<ClientError> {
        self.page = page;
        if self.user.is_some() {
            self.refresh().await
        } else {
            Vec::new()
        }
    }

    /// Fetch the shared data concurrently.
    ///
    /// Each failed fetch is logged, leaves its part empty and is returned.
    pub async fn refresh(&mut self) -> Vec<ClientError> {
        let client = &self.client;
        let material_filter = MaterialFilter::default();
        let movement_filter = MovementFilter::default();
        let request_filter = RequestFilter::default();
        let supplier_filter = SupplierFilter::default();
        let order_filter = OrderFilter::default();
        let (stats, materials, movements, critical, requests, suppliers, orders, notifications) =
            tokio::join!(
                client.dashboard(),
                client.materials(&material_filter),
                client.movements(&movement_filter),
                client.critical_materials(),
                client.requests(&request_filter),
                client.suppliers(&supplier_filter),
                client.orders(&order_filter),
                client.notifications(),
            );

        let mut failures = Vec::new();
        self.data = Snapshot {
            stats: stats.map_err(|e| failures.push(e)).ok(),
            materials: or_empty(materials, &mut failures),
            movements: or_empty(movements, &mut failures),
            critical: or_empty(critical, &mut failures),
            requests: or_empty(requests, &mut failures),
            suppliers: or_empty(suppliers, &mut failures),
            orders: or_empty(orders, &mut failures),
            notifications: or_empty(notifications, &mut failures),
        };

        for e in &failures {
            tracing::warn!(error = %e, "Dashboard fetch failed");
        }
        failures
    }

    /// Requests still awaiting review.
    pub fn pending_requests(&self) -> impl Iterator<Item = &MaterialRequest> {
        self.data
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
    }

    /// Badge count for the requests menu entry.
    #[must_use]
    pub fn pending_request_count(&self) -> usize {
        self.pending_requests().count()
    }

    /// Badge count for the notifications menu entry.
    #[must_use]
    pub fn unread_notification_count(&self) -> usize {
        self.data.notifications.iter().filter(|n| !n.read).count()
    }

    /// Whether the user may approve or reject requests.
    #[must_use]
    pub fn can_review(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.can_review_requests())
    }

    /// Whether the user may change anything.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.can_write())
    }

    /// The action offered for an order; none when nobody may write.
    #[must_use]
    pub fn next_order_action(&self, order: &PurchaseOrder) -> Option<OrderAction> {
        self.can_write().then(|| next_action(order)).flatten()
    }

    /// An order line priced from the cached material list.
    #[must_use]
    pub fn order_line_for(&self, code: &MaterialCode, quantity: Quantity) -> Option<NewOrderLine> {
        self.data
            .materials
            .iter()
            .find(|m| &m.code == code)
            .map(|m| NewOrderLine {
                material_code: m.code.clone(),
                material_name: m.name.clone(),
                quantity,
                unit_price: m.unit_price,
            })
    }
}

fn or_empty<T>(result: Result<Vec<T>, ClientError>, failures: &mut Vec<ClientError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        failures.push(e);
        Vec::new()
    })
}
