//! Closed value sets for form dropdowns.

use axum::{Json, Router, extract::Path, routing::get};

use envanter_core::{
    Category, MovementDirection, NotificationKind, OrderStatus, Priority, RequestStatus, Unit,
    UserRole,
};

use crate::error::{AppError, AppResult};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Build the enums router.
pub fn router() -> Router<AppState> {
    Router::new().route("/enums/{name}", get(labels))
}

/// Labels of a value set, in declaration order.
pub fn labels_for(name: &str) -> Option<Vec<&'static str>> {
    let labels = match name {
        "categories" => Category::labels(),
        "units" => Unit::labels(),
        "movement-types" => MovementDirection::labels(),
        "priorities" => Priority::labels(),
        "request-statuses" => RequestStatus::labels(),
        "order-statuses" => OrderStatus::labels(),
        "roles" => UserRole::labels(),
        "notification-types" => NotificationKind::labels(),
        _ => return None,
    };
    Some(labels)
}

async fn labels(_user: RequireUser, Path(name): Path<String>) -> AppResult<Json<Vec<&'static str>>> {
    labels_for(&name)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("enum {name}")))
}
