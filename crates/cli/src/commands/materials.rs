//! Material commands that go through the REST API.

use std::fmt::Write as _;

use thiserror::Error;

use envanter_client::ClientError;
use envanter_core::MaterialCode;
use envanter_core::models::Material;
use envanter_core::types::CodeError;

use super::session::{self, SessionError};

#[derive(Debug, Error)]
pub enum MaterialsError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid material code: {0}")]
    InvalidCode(#[from] CodeError),

    #[error("{failed} of {total} materials could not be deleted")]
    Incomplete { failed: usize, total: usize },
}

/// Render materials as a fixed-width table.
#[must_use]
pub fn render_table(materials: &[Material]) -> String {
    let mut out = format!(
        "{:<10} {:<32} {:<14} {:>7} {:>5} {:>5}  {}\n",
        "Kod", "Ad", "Kategori", "Stok", "Min", "Max", "Konum"
    );
    for m in materials {
        let _ = writeln!(
            out,
            "{:<10} {:<32} {:<14} {:>7} {:>5} {:>5}  {}",
            m.code.as_str(),
            truncate(&m.name, 32),
            m.category.to_string(),
            format!("{} {}", m.current_stock, m.unit),
            m.min_level,
            m.max_level,
            m.location
        );
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_owned();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Print materials at or below their minimum level.
///
/// # Errors
///
/// Returns `MaterialsError` if signing in or the request fails.
#[allow(clippy::print_stdout)]
pub async fn critical() -> Result<(), MaterialsError> {
    let client = session::signed_in_client().await?;
    let materials = client.critical_materials().await?;

    if materials.is_empty() {
        tracing::info!("No critical materials");
        return Ok(());
    }
    print!("{}", render_table(&materials));
    Ok(())
}

/// Archive materials one by one, continuing past failures.
///
/// # Errors
///
/// Returns `MaterialsError::Incomplete` if any material could not be deleted.
pub async fn bulk_delete(codes: &[String]) -> Result<(), MaterialsError> {
    let codes = codes
        .iter()
        .map(|c| MaterialCode::parse(c))
        .collect::<Result<Vec<_>, _>>()?;

    let client = session::signed_in_client().await?;
    let report = client.bulk_delete_materials(&codes).await;

    for (code, e) in &report.failed {
        tracing::error!("{code}: {e}");
    }
    if report.is_complete() {
        tracing::info!("{} materials deleted", report.success_count());
        Ok(())
    } else {
        Err(MaterialsError::Incomplete {
            failed: report.failed.len(),
            total: codes.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use envanter_core::{Category, StockStatus, Unit};

    use super::*;

    fn material(code: &str, name: &str, stock: i64) -> Material {
        Material {
            code: MaterialCode::parse(code).unwrap(),
            name: name.to_owned(),
            category: Category::Stationery,
            unit: Unit::Box,
            current_stock: stock,
            min_level: 3,
            max_level: 45,
            location: "Ana Depo".to_owned(),
            shelf: String::new(),
            barcode: String::new(),
            unit_price: Decimal::ZERO,
            status: StockStatus::Critical,
            last_updated: None,
        }
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[material("MK0003", "Zımba Teli No:10", 2)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Kod"));
        assert!(lines[1].starts_with("MK0003"));
        assert!(lines[1].contains("2 Kutu"));
        assert!(lines[1].ends_with("Ana Depo"));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("Kağıt", 10), "Kağıt");
        assert_eq!(truncate("Çok uzun bir malzeme adı", 8), "Çok uzu…");
    }
}
