//! Envanter REST API client.
//!
//! Every response is decoded into the typed models of `envanter-core`, and
//! the models that carry derived fields (material status, order totals,
//! request review state) are re-checked with [`Validate`] before they are
//! handed to the caller.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::instrument;

use envanter_core::analytics::{
    CategoryShare, DashboardStats, MonthlyTotals, StockPrediction, TrendSeries,
};
use envanter_core::export::{ExportKind, ExportTable};
use envanter_core::models::{
    AuditEntry, AuditFilter, Budget, BudgetQuery, BudgetSpend, BudgetSummary, CompleteCount,
    CompleteCountQuery, Credentials, ImportSummary, Location, Material, MaterialDetails,
    MaterialFilter, MaterialRequest, Message, Movement, MovementFilter, NewBudget, NewLocation,
    NewMaterial, NewMaterialRequest, NewMovement, NewNotification, NewOrder, NewStockCount,
    NewSupplier, NewUser, Notification, OrderFilter, OrderStatusQuery, PurchaseOrder,
    RequestFilter, ReviewQuery, Session, StockCount, Supplier, SupplierDetails, SupplierFilter,
    UnreadCount, User, UserUpdate,
};
use envanter_core::reports::{
    DepartmentConsumption, InventoryReport, MovementReport, SupplierSummary,
};
use envanter_core::{
    Category, CountNo, LocationCode, MaterialCode, NotificationId, OrderNo, OrderStatus, RequestNo,
    SupplierCode, Validate, ValidationError,
};

use crate::bulk::{self, BulkDeleteReport};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Envanter API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session
/// token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    /// Bearer token of the current session
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client without a session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("envanter-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                config,
                token: RwLock::new(None),
            }),
        })
    }

    /// Create a client from `ENVANTER_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Use an existing session token.
    pub async fn set_token(&self, token: SecretString) {
        *self.inner.token.write().await = Some(token);
    }

    /// Whether a session token is held.
    pub async fn has_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Forget the session token without telling the server.
    pub async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    /// Log in and keep the returned token for later calls.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 401 for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<User, ClientError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.expose_secret().to_string(),
        };
        let session: Session = send(
            self.public(Method::POST, "auth/login")?.json(&credentials),
        )
        .await?;

        *self.inner.token.write().await = Some(SecretString::from(session.token));
        tracing::info!(role = %session.user.role, "Signed in");
        Ok(session.user)
    }

    /// End the session on the server and drop the token.
    ///
    /// The token is dropped even when the server call fails.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the server call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<Message, ClientError> {
        let result = send(self.authed(Method::POST, "auth/logout").await?).await;
        self.clear_token().await;
        result
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the session is missing or expired.
    pub async fn me(&self) -> Result<User, ClientError> {
        self.get("auth/me").await
    }

    /// Liveness of the server (`/health`, outside the API prefix).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the server is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), ClientError> {
        let url = self.inner.config.base_url.join("/health")?;
        let response = self.inner.http.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.bytes().await?;
            Err(ClientError::from_response(status, &body))
        }
    }

    // =========================================================================
    // Dashboard and materials
    // =========================================================================

    /// Headline figures.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn dashboard(&self) -> Result<DashboardStats, ClientError> {
        self.get("dashboard").await
    }

    /// Materials matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if a material's status does not
    /// match its stock level.
    #[instrument(skip(self))]
    pub async fn materials(&self, filter: &MaterialFilter) -> Result<Vec<Material>, ClientError> {
        let materials: Vec<Material> =
            send(self.authed(Method::GET, "materials").await?.query(filter)).await?;
        checked(materials)
    }

    /// Materials at or below their minimum level.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status, decode or validation
    /// failures.
    pub async fn critical_materials(&self) -> Result<Vec<Material>, ClientError> {
        let materials: Vec<Material> = self.get("materials/critical").await?;
        checked(materials)
    }

    /// One material.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown or deleted code.
    pub async fn material(&self, code: &MaterialCode) -> Result<Material, ClientError> {
        let material: Material = self.get(&format!("materials/{code}")).await?;
        checked(material)
    }

    /// Create a material; a non-zero opening stock becomes an `In` movement.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` before sending for invalid input,
    /// or `ClientError::Status` with 409 for a used code.
    #[instrument(skip(self, material), fields(code = %material.code))]
    pub async fn create_material(&self, material: &NewMaterial) -> Result<Material, ClientError> {
        material.validate()?;
        let created: Material = self.send_json(Method::POST, "materials", material).await?;
        checked(created)
    }

    /// Update the descriptive fields of a material. Stock is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, details))]
    pub async fn update_material(
        &self,
        code: &MaterialCode,
        details: &MaterialDetails,
    ) -> Result<Material, ClientError> {
        details.validate()?;
        let updated: Material = self
            .send_json(Method::PUT, &format!("materials/{code}"), details)
            .await?;
        checked(updated)
    }

    /// Delete (archive) a material.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown code.
    #[instrument(skip(self))]
    pub async fn delete_material(&self, code: &MaterialCode) -> Result<Message, ClientError> {
        send(self.authed(Method::DELETE, &format!("materials/{code}")).await?).await
    }

    /// Delete materials one at a time, continuing past failures.
    pub async fn bulk_delete_materials(
        &self,
        codes: &[MaterialCode],
    ) -> BulkDeleteReport<MaterialCode> {
        bulk::delete_each(codes.iter().cloned(), |code| async move {
            self.delete_material(&code).await.map(|_| ())
        })
        .await
    }

    /// Upload a CSV file of materials.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 400 for spreadsheet binaries or a
    /// file without the required columns.
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn import_materials(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<ImportSummary, ClientError> {
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        send(
            self.authed(Method::POST, "materials/import-excel")
                .await?
                .multipart(form),
        )
        .await
    }

    // =========================================================================
    // Movements
    // =========================================================================

    /// Movements, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, ClientError> {
        send(self.authed(Method::GET, "movements").await?.query(filter)).await
    }

    /// Record a stock movement.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 409 when an `Out` movement would
    /// overdraw the stock.
    #[instrument(skip(self, movement), fields(code = %movement.material_code, direction = %movement.direction))]
    pub async fn record_movement(&self, movement: &NewMovement) -> Result<Movement, ClientError> {
        movement.validate()?;
        self.send_json(Method::POST, "movements", movement).await
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Material requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on a failed call or an inconsistent request.
    pub async fn requests(&self, filter: &RequestFilter) -> Result<Vec<MaterialRequest>, ClientError> {
        let requests: Vec<MaterialRequest> =
            send(self.authed(Method::GET, "requests").await?.query(filter)).await?;
        checked(requests)
    }

    /// Requests awaiting review.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on a failed call or an inconsistent request.
    pub async fn pending_requests(&self) -> Result<Vec<MaterialRequest>, ClientError> {
        let requests: Vec<MaterialRequest> = self.get("requests/pending").await?;
        checked(requests)
    }

    /// One request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown number.
    pub async fn request(&self, number: &RequestNo) -> Result<MaterialRequest, ClientError> {
        let request: MaterialRequest = self.get(&format!("requests/{number}")).await?;
        checked(request)
    }

    /// Submit a material request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, request), fields(code = %request.material_code))]
    pub async fn create_request(
        &self,
        request: &NewMaterialRequest,
    ) -> Result<MaterialRequest, ClientError> {
        request.validate()?;
        let created: MaterialRequest = self.send_json(Method::POST, "requests", request).await?;
        checked(created)
    }

    /// Approve a pending request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 403 for roles that cannot review
    /// and 409 when the request is no longer pending.
    #[instrument(skip(self))]
    pub async fn approve_request(
        &self,
        number: &RequestNo,
        reviewer: &str,
    ) -> Result<MaterialRequest, ClientError> {
        let query = ReviewQuery {
            reviewer: reviewer.to_string(),
            reason: String::new(),
        };
        let request: MaterialRequest = send(
            self.authed(Method::PUT, &format!("requests/{number}/approve"))
                .await?
                .query(&query),
        )
        .await?;
        checked(request)
    }

    /// Reject a pending request with a reason.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a blank reason without calling
    /// the server, otherwise as [`approve_request`](Self::approve_request).
    #[instrument(skip(self))]
    pub async fn reject_request(
        &self,
        number: &RequestNo,
        reviewer: &str,
        reason: &str,
    ) -> Result<MaterialRequest, ClientError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::Required { field: "red_nedeni" }.into());
        }
        let query = ReviewQuery {
            reviewer: reviewer.to_string(),
            reason: reason.to_string(),
        };
        let request: MaterialRequest = send(
            self.authed(Method::PUT, &format!("requests/{number}/reject"))
                .await?
                .query(&query),
        )
        .await?;
        checked(request)
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    /// Suppliers matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn suppliers(&self, filter: &SupplierFilter) -> Result<Vec<Supplier>, ClientError> {
        send(self.authed(Method::GET, "suppliers").await?.query(filter)).await
    }

    /// One supplier.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown code.
    pub async fn supplier(&self, code: &SupplierCode) -> Result<Supplier, ClientError> {
        self.get(&format!("suppliers/{code}")).await
    }

    /// Create a supplier.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, supplier), fields(code = %supplier.code))]
    pub async fn create_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, ClientError> {
        supplier.validate()?;
        self.send_json(Method::POST, "suppliers", supplier).await
    }

    /// Replace the editable fields of a supplier.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, details))]
    pub async fn update_supplier(
        &self,
        code: &SupplierCode,
        details: &SupplierDetails,
    ) -> Result<Supplier, ClientError> {
        details.validate()?;
        self.send_json(Method::PUT, &format!("suppliers/{code}"), details)
            .await
    }

    /// Delete a supplier.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown code.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, code: &SupplierCode) -> Result<Message, ClientError> {
        send(self.authed(Method::DELETE, &format!("suppliers/{code}")).await?).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Purchase orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if an order total does not match
    /// its lines.
    pub async fn orders(&self, filter: &OrderFilter) -> Result<Vec<PurchaseOrder>, ClientError> {
        let orders: Vec<PurchaseOrder> =
            send(self.authed(Method::GET, "orders").await?.query(filter)).await?;
        checked(orders)
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown number.
    pub async fn order(&self, number: &OrderNo) -> Result<PurchaseOrder, ClientError> {
        let order: PurchaseOrder = self.get(&format!("orders/{number}")).await?;
        checked(order)
    }

    /// Place an order; the server computes the total.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, order), fields(supplier = %order.supplier_code, lines = order.lines.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<PurchaseOrder, ClientError> {
        order.validate()?;
        let created: PurchaseOrder = self.send_json(Method::POST, "orders", order).await?;
        checked(created)
    }

    /// Move an order to the next status.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 409 unless `target` is exactly the
    /// successor of the current status.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        number: &OrderNo,
        target: OrderStatus,
        approver: &str,
    ) -> Result<PurchaseOrder, ClientError> {
        let query = OrderStatusQuery {
            status: target,
            approver: approver.to_string(),
        };
        let order: PurchaseOrder = send(
            self.authed(Method::PUT, &format!("orders/{number}/status"))
                .await?
                .query(&query),
        )
        .await?;
        checked(order)
    }

    // =========================================================================
    // Locations and stock counts
    // =========================================================================

    /// Locations with their material count and value.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn locations(&self) -> Result<Vec<Location>, ClientError> {
        self.get("locations").await
    }

    /// Create a location.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, location), fields(code = %location.code))]
    pub async fn create_location(&self, location: &NewLocation) -> Result<Location, ClientError> {
        location.validate()?;
        self.send_json(Method::POST, "locations", location).await
    }

    /// Delete a location.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown code.
    #[instrument(skip(self))]
    pub async fn delete_location(&self, code: &LocationCode) -> Result<Message, ClientError> {
        send(self.authed(Method::DELETE, &format!("locations/{code}")).await?).await
    }

    /// Stock counts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn stock_counts(&self) -> Result<Vec<StockCount>, ClientError> {
        self.get("stock-counts").await
    }

    /// Plan a count.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 when an explicit material code
    /// is unknown.
    #[instrument(skip(self, count))]
    pub async fn create_stock_count(&self, count: &NewStockCount) -> Result<StockCount, ClientError> {
        count.validate()?;
        self.send_json(Method::POST, "stock-counts", count).await
    }

    /// Start a planned count.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 409 unless the count is planned.
    #[instrument(skip(self))]
    pub async fn start_stock_count(&self, number: &CountNo) -> Result<StockCount, ClientError> {
        send(
            self.authed(Method::PUT, &format!("stock-counts/{number}/start"))
                .await?,
        )
        .await
    }

    /// Complete a count, optionally with counted quantities.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 409 for a completed count.
    #[instrument(skip(self, counted))]
    pub async fn complete_stock_count(
        &self,
        number: &CountNo,
        completed_by: &str,
        counted: &CompleteCount,
    ) -> Result<StockCount, ClientError> {
        counted.validate()?;
        let query = CompleteCountQuery {
            completed_by: completed_by.to_string(),
        };
        send(
            self.authed(Method::PUT, &format!("stock-counts/{number}/complete"))
                .await?
                .query(&query)
                .json(counted),
        )
        .await
    }

    // =========================================================================
    // Audit, analytics, reports, export
    // =========================================================================

    /// Audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn audit_logs(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, ClientError> {
        send(self.authed(Method::GET, "audit-logs").await?.query(filter)).await
    }

    // =========================================================================
    // Notifications and budgets
    // =========================================================================

    /// Notifications addressed to the signed-in user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        self.get("notifications").await
    }

    /// Number of unread notifications for the badge.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn unread_notifications(&self) -> Result<i64, ClientError> {
        let unread: UnreadCount = self.get("notifications/unread/count").await?;
        Ok(unread.count)
    }

    /// Mark a notification read.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown notification.
    #[instrument(skip(self))]
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<Message, ClientError> {
        send(
            self.authed(Method::PUT, &format!("notifications/{id}/read"))
                .await?,
        )
        .await
    }

    /// Post a notification to a user, a role or everyone.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, notification), fields(kullanici = %notification.recipient))]
    pub async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, ClientError> {
        notification.validate()?;
        self.send_json(Method::POST, "notifications", notification)
            .await
    }

    /// Budget summary of a year; the server's current year when `None`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn budget(&self, year: Option<i32>) -> Result<BudgetSummary, ClientError> {
        let query = BudgetQuery { year };
        send(self.authed(Method::GET, "budget").await?.query(&query)).await
    }

    /// Set the limits of a category for a year (Admin only).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, budget), fields(yil = budget.year, kategori = %budget.category))]
    pub async fn set_budget(&self, budget: &NewBudget) -> Result<Budget, ClientError> {
        budget.validate()?;
        self.send_json(Method::POST, "budget", budget).await
    }

    /// Record spending against a category budget.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 when the year has no budget for
    /// the category, 403 for roles below manager.
    #[instrument(skip(self))]
    pub async fn record_spend(&self, spend: &BudgetSpend) -> Result<Budget, ClientError> {
        spend.validate()?;
        send(
            self.authed(Method::POST, "budget/update")
                .await?
                .query(spend),
        )
        .await
    }

    /// Monthly in/out totals for the trend chart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn trends(&self) -> Result<TrendSeries, ClientError> {
        self.get("analytics/trends").await
    }

    /// Value share per category.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn category_breakdown(&self) -> Result<Vec<CategoryShare>, ClientError> {
        self.get("analytics/category").await
    }

    /// Monthly movement totals.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn monthly_totals(&self) -> Result<Vec<MonthlyTotals>, ClientError> {
        self.get("analytics/monthly").await
    }

    /// Depletion predictions, most urgent first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn predictions(&self) -> Result<Vec<StockPrediction>, ClientError> {
        self.get("predictions").await
    }

    /// Inventory report, optionally for one category.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn inventory_report(
        &self,
        category: Option<Category>,
    ) -> Result<InventoryReport, ClientError> {
        let query: Vec<(&str, &str)> = category.map(|c| ("kategori", c.label())).into_iter().collect();
        send(
            self.authed(Method::GET, "reports/inventory")
                .await?
                .query(&query),
        )
        .await
    }

    /// Movement totals, optionally for one material.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn movement_report(
        &self,
        material: Option<&MaterialCode>,
    ) -> Result<MovementReport, ClientError> {
        let query: Vec<(&str, &str)> = material
            .map(|m| ("malzeme_kodu", m.as_str()))
            .into_iter()
            .collect();
        send(
            self.authed(Method::GET, "reports/movements")
                .await?
                .query(&query),
        )
        .await
    }

    /// `Out` movements grouped by receiving department.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn department_report(
        &self,
        department: Option<&str>,
    ) -> Result<Vec<DepartmentConsumption>, ClientError> {
        let query: Vec<(&str, &str)> = department.map(|d| ("departman", d)).into_iter().collect();
        send(
            self.authed(Method::GET, "reports/department")
                .await?
                .query(&query),
        )
        .await
    }

    /// Ordered amount per supplier.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    pub async fn supplier_report(&self) -> Result<Vec<SupplierSummary>, ClientError> {
        self.get("reports/suppliers").await
    }

    /// A table export.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failures.
    #[instrument(skip(self))]
    pub async fn export(&self, kind: ExportKind) -> Result<ExportTable, ClientError> {
        self.get(&format!("export/{}", kind.as_str())).await
    }

    /// Labels of a closed value set (`categories`, `units`, ...).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown set.
    pub async fn enum_labels(&self, name: &str) -> Result<Vec<String>, ClientError> {
        self.get(&format!("enums/{name}")).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// All users (Admin only).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 403 for other roles.
    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        self.get("users").await
    }

    /// Create a user (Admin only).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on invalid input or a failed call.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        user.validate()?;
        self.send_json(Method::POST, "users", user).await
    }

    /// Change a user's profile, role or status (Admin only). The user's open
    /// sessions end and they sign in again.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown username.
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, username: &str, update: &UserUpdate) -> Result<User, ClientError> {
        update.validate()?;
        self.send_json(Method::PUT, &format!("users/{username}"), update)
            .await
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    /// A request without credentials.
    fn public(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.inner.http.request(method, self.inner.config.url(path)?))
    }

    /// A request carrying the session token.
    async fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.inner.token.read().await;
        let token = token.as_ref().ok_or(ClientError::NotSignedIn)?;
        Ok(self.public(method, path)?.bearer_auth(token.expose_secret()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        send(self.authed(Method::GET, path).await?).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        send(self.authed(method, path).await?.json(body)).await
    }
}

/// Send a request and decode a successful JSON response.
async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let err = ClientError::from_response(status, &body);
        tracing::debug!(error = %err, "API call failed");
        return Err(err);
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Re-check derived fields of a decoded value.
fn checked<T: Validate>(value: T) -> Result<T, ClientError> {
    value.validate()?;
    Ok(value)
}
