//! Stock counts: plan, start and complete.
//!
//! A count snapshots the expected stock of each selected material when it is
//! planned. Completing it records counted quantities and their differences;
//! stock itself is only ever changed by movements.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use envanter_core::models::{
    CompleteCount, CompleteCountQuery, Material, NewAuditEntry, NewStockCount, StockCount,
    StockCountLine,
};
use envanter_core::{AuditAction, AuditModule, CountNo, LocationCode, Validate};

use crate::db::{LocationRepository, MaterialRepository, StockCountRepository};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireUser, RequireWriter};
use crate::services::audit;
use crate::state::AppState;

use super::actor_or;

/// Build the stock counts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock-counts", get(list).post(create))
        .route("/stock-counts/{no}/start", put(start))
        .route("/stock-counts/{no}/complete", put(complete))
}

#[instrument(skip_all)]
async fn list(_user: RequireUser, State(state): State<AppState>) -> AppResult<Json<Vec<StockCount>>> {
    Ok(Json(StockCountRepository::new(state.pool()).list().await?))
}

#[instrument(skip_all, fields(lokasyon = ?count.location(), kodlar = count.material_codes.len()))]
async fn create(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppJson(mut count): AppJson<NewStockCount>,
) -> AppResult<(StatusCode, Json<StockCount>)> {
    count.validate()?;
    count.created_by = actor_or(&count.created_by, &session);

    let selected = select_materials(&state, &count).await?;
    let lines = selected
        .into_iter()
        .map(|m| StockCountLine::planned(m.code, m.name, m.current_stock))
        .collect();

    let created = StockCountRepository::new(state.pool()).create(&count, lines).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Create,
            AuditModule::StockCount,
            created.number.to_string(),
        )
        .detail(format!("{} materials", created.lines.len())),
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Explicit codes when given, otherwise every material, restricted to the
/// location when one is given.
async fn select_materials(state: &AppState, count: &NewStockCount) -> AppResult<Vec<Material>> {
    let materials = MaterialRepository::new(state.pool());

    if !count.material_codes.is_empty() {
        let mut selected = Vec::with_capacity(count.material_codes.len());
        for code in &count.material_codes {
            if selected.iter().any(|m: &Material| &m.code == code) {
                continue;
            }
            let material = materials
                .get(code)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("material {code}")))?;
            selected.push(material);
        }
        return Ok(selected);
    }

    let all = materials.list_all().await?;
    let Some(location) = count.location() else {
        return Ok(all);
    };

    // A material's location may hold either the code or the name.
    let mut names = vec![location.to_owned()];
    if let Ok(code) = LocationCode::parse(location)
        && let Some(found) = LocationRepository::new(state.pool()).get(&code).await?
    {
        names.push(found.location.name);
    }

    Ok(all
        .into_iter()
        .filter(|m| names.iter().any(|n| n == m.location.trim()))
        .collect())
}

#[instrument(skip(session, state))]
async fn start(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(no): Path<String>,
) -> AppResult<Json<StockCount>> {
    let number = CountNo::parse(&no)?;
    let repo = StockCountRepository::new(state.pool());
    let current = repo
        .get(number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("stock count {number}")))?;

    current.status.start()?;
    let started = repo
        .start(number, current.status)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("stock count {number} changed concurrently")))?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Update,
            AuditModule::StockCount,
            number.to_string(),
        )
        .change(current.status.label(), started.status.label()),
    )
    .await;

    Ok(Json(started))
}

#[instrument(skip(session, state, query, body))]
async fn complete(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(no): Path<String>,
    AppQuery(query): AppQuery<CompleteCountQuery>,
    body: Option<AppJson<CompleteCount>>,
) -> AppResult<Json<StockCount>> {
    let number = CountNo::parse(&no)?;
    let AppJson(counts) = body.unwrap_or_default();
    counts.validate()?;

    let repo = StockCountRepository::new(state.pool());
    let current = repo
        .get(number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("stock count {number}")))?;

    current.status.complete()?;
    let lines = apply_counts(current.lines.clone(), &counts)?;
    let completed_by = actor_or(&query.completed_by, &session);

    let completed = repo
        .complete(number, current.status, &completed_by, &lines)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("stock count {number} changed concurrently")))?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Update,
            AuditModule::StockCount,
            number.to_string(),
        )
        .change(current.status.label(), completed.status.label())
        .detail(format!("{} discrepancies", completed.discrepancies().count())),
    )
    .await;

    Ok(Json(completed))
}

/// Record counted quantities on the planned lines.
fn apply_counts(
    mut lines: Vec<StockCountLine>,
    counts: &CompleteCount,
) -> AppResult<Vec<StockCountLine>> {
    let index: HashMap<String, usize> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| (l.material_code.as_str().to_owned(), i))
        .collect();

    for counted in &counts.counted {
        let line = index
            .get(counted.material_code.as_str())
            .and_then(|&i| lines.get_mut(i))
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "material {} is not part of this count",
                    counted.material_code
                ))
            })?;
        line.record(counted.counted);
    }

    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use envanter_core::MaterialCode;
    use envanter_core::models::CountedQuantity;

    use super::*;

    fn line(code: &str, expected: i64) -> StockCountLine {
        StockCountLine::planned(MaterialCode::parse(code).unwrap(), code.to_string(), expected)
    }

    fn counted(code: &str, counted: i64) -> CountedQuantity {
        CountedQuantity {
            material_code: MaterialCode::parse(code).unwrap(),
            counted,
        }
    }

    #[test]
    fn test_apply_counts_records_differences() {
        let lines = vec![line("MLZ001", 10), line("MLZ002", 4)];
        let counts = CompleteCount {
            counted: vec![counted("MLZ002", 6)],
        };

        let lines = apply_counts(lines, &counts).unwrap();
        assert_eq!(lines[0].counted, None);
        assert_eq!(lines[1].counted, Some(6));
        assert_eq!(lines[1].difference, Some(2));
    }

    #[test]
    fn test_apply_counts_rejects_unknown_material() {
        let counts = CompleteCount {
            counted: vec![counted("MLZ999", 1)],
        };
        let err = apply_counts(vec![line("MLZ001", 10)], &counts).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
