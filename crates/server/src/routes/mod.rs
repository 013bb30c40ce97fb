//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Database reachable
//!
//! # Everything below is nested under /api
//!
//! # Auth
//! POST /auth/login                      - Username/password -> {user, token}
//! POST /auth/logout                     - End the session
//! GET  /auth/me                         - Signed-in user
//!
//! # Users (Admin only)
//! GET  /users, POST /users
//! PUT  /users/{username}                - Also ends the user's sessions
//!
//! # Stock
//! GET  /dashboard
//! GET  /materials, /materials/critical, /materials/{kod}
//! POST /materials, /materials/import-excel
//! PUT  /materials/{kod}
//! DELETE /materials/{kod}               - Archive
//! GET  /movements, POST /movements
//!
//! # Requests and orders
//! GET  /requests, /requests/pending, /requests/{no}
//! POST /requests
//! PUT  /requests/{no}/approve, /requests/{no}/reject
//! GET  /orders, /orders/{no}
//! POST /orders
//! PUT  /orders/{no}/status
//!
//! # Master data
//! GET/POST /suppliers, GET/PUT/DELETE /suppliers/{kod}
//! GET/POST /locations, DELETE /locations/{kod}
//!
//! # Counts
//! GET/POST /stock-counts
//! PUT  /stock-counts/{no}/start, /stock-counts/{no}/complete
//!
//! # Notifications and budgets
//! GET  /notifications, /notifications/unread/count
//! POST /notifications
//! PUT  /notifications/{id}/read
//! GET  /budget?yil, POST /budget        - Summary, set limits (Admin)
//! POST /budget/update?yil&kategori&harcama
//!
//! # Read models
//! GET  /analytics/trends, /analytics/category, /analytics/monthly
//! GET  /predictions
//! GET  /reports/inventory, /reports/movements, /reports/department, /reports/suppliers
//! GET  /export/{type}
//! GET  /enums/{name}
//! GET  /audit-logs
//! ```

pub mod analytics;
pub mod audit;
pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod enums;
pub mod export;
pub mod health;
pub mod locations;
pub mod materials;
pub mod movements;
pub mod notifications;
pub mod orders;
pub mod reports;
pub mod requests;
pub mod stock_counts;
pub mod suppliers;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(dashboard::router())
        .merge(materials::router())
        .merge(movements::router())
        .merge(requests::router())
        .merge(orders::router())
        .merge(suppliers::router())
        .merge(locations::router())
        .merge(stock_counts::router())
        .merge(notifications::router())
        .merge(budget::router())
        .merge(analytics::router())
        .merge(reports::router())
        .merge(export::router())
        .merge(enums::router())
        .merge(audit::router())
}

/// The given actor, or the signed-in user's display name when blank.
fn actor_or(given: &str, session: &crate::state::SessionUser) -> String {
    match given.trim() {
        "" => session.actor(),
        name => name.to_owned(),
    }
}
