//! CSV material import.
//!
//! The file uses the material export headers (`Kod`, `Ad`, `Kategori`,
//! `Birim`, `Stok`, `Min`, `Max`, `Konum`, `Raf`, `Barkod`, `Fiyat`); the
//! `Durum` column is ignored. New codes are created with `Stok` as their
//! opening balance and defaults for absent columns. Existing codes get only
//! the columns present in the header overwritten; their stock is left alone.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use envanter_core::models::{ImportSummary, Material, MaterialDetails, NewMaterial};
use envanter_core::{Category, MaterialCode, Unit, Validate};

use crate::db::materials::CodeState;
use crate::db::{MaterialRepository, RepositoryError};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors that reject the whole upload.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("spreadsheet files are not supported; upload the sheet saved as CSV")]
    Spreadsheet,

    #[error("file is not valid UTF-8 text")]
    NotText,

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One parsed row with its 1-based line number in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub line: usize,
    pub material: NewMaterial,
}

/// Optional columns found in the header. `Kod` and `Ad` are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ImportColumns {
    pub category: bool,
    pub unit: bool,
    pub min: bool,
    pub max: bool,
    pub location: bool,
    pub shelf: bool,
    pub barcode: bool,
    pub price: bool,
}

impl ImportColumns {
    /// Details of `existing` with the imported columns overwritten.
    #[must_use]
    pub fn merge(&self, existing: &Material, imported: &MaterialDetails) -> MaterialDetails {
        let pick = |present: bool, new: &str, old: &str| {
            if present { new.to_owned() } else { old.to_owned() }
        };
        MaterialDetails {
            name: imported.name.clone(),
            category: if self.category { imported.category } else { existing.category },
            unit: if self.unit { imported.unit } else { existing.unit },
            min_level: if self.min { imported.min_level } else { existing.min_level },
            max_level: if self.max { imported.max_level } else { existing.max_level },
            location: pick(self.location, &imported.location, &existing.location),
            shelf: pick(self.shelf, &imported.shelf, &existing.shelf),
            barcode: pick(self.barcode, &imported.barcode, &existing.barcode),
            unit_price: if self.price { imported.unit_price } else { existing.unit_price },
        }
    }
}

/// Rows ready to import and per-row problems found while parsing.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub columns: ImportColumns,
    pub rows: Vec<ImportRow>,
    pub errors: Vec<String>,
    pub skipped: u32,
}

/// Parse an uploaded file.
///
/// # Errors
///
/// Returns `ImportError` when the file is a spreadsheet binary, is not text,
/// or lacks the `Kod` or `Ad` column.
pub fn parse_materials_csv(bytes: &[u8]) -> Result<ParsedImport, ImportError> {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return Err(ImportError::Spreadsheet);
    }
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|_| ImportError::NotText)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase(), i))
        .collect();
    let column = |name: &str| columns.get(&name.to_lowercase()).copied();

    let code_col = column("Kod").ok_or(ImportError::MissingColumn("Kod"))?;
    let name_col = column("Ad").ok_or(ImportError::MissingColumn("Ad"))?;

    let mut parsed = ParsedImport {
        columns: ImportColumns {
            category: column("Kategori").is_some(),
            unit: column("Birim").is_some(),
            min: column("Min").is_some(),
            max: column("Max").is_some(),
            location: column("Konum").is_some(),
            shelf: column("Raf").is_some(),
            barcode: column("Barkod").is_some(),
            price: column("Fiyat").is_some(),
        },
        ..ParsedImport::default()
    };
    for (index, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(format!("line {line}: {e}"));
                parsed.skipped += 1;
                continue;
            }
        };
        let cell = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or_default();

        if cell(Some(code_col)).is_empty() && cell(Some(name_col)).is_empty() {
            continue;
        }

        let row = RowCells {
            code: cell(Some(code_col)),
            name: cell(Some(name_col)),
            category: cell(column("Kategori")),
            unit: cell(column("Birim")),
            stock: cell(column("Stok")),
            min: cell(column("Min")),
            max: cell(column("Max")),
            location: cell(column("Konum")),
            shelf: cell(column("Raf")),
            barcode: cell(column("Barkod")),
            price: cell(column("Fiyat")),
        };

        match row.into_material() {
            Ok(material) => parsed.rows.push(ImportRow { line, material }),
            Err(e) => {
                parsed.errors.push(format!("line {line}: {e}"));
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

struct RowCells<'r> {
    code: &'r str,
    name: &'r str,
    category: &'r str,
    unit: &'r str,
    stock: &'r str,
    min: &'r str,
    max: &'r str,
    location: &'r str,
    shelf: &'r str,
    barcode: &'r str,
    price: &'r str,
}

impl RowCells<'_> {
    /// Parse the cells. Cross-field checks wait until the row is merged with
    /// any stored material, since absent columns may come from there.
    fn into_material(self) -> Result<NewMaterial, String> {
        if self.name.is_empty() {
            return Err("Ad: is required".to_owned());
        }
        let code = MaterialCode::parse(self.code).map_err(|e| format!("Kod: {e}"))?;
        let category = parse_or(self.category, Category::Other, "Kategori")?;
        let unit = parse_or(self.unit, Unit::Piece, "Birim")?;
        let opening_stock = parse_number(self.stock, 0, "Stok")?;
        let min_level = parse_number(self.min, 5, "Min")?;
        let max_level = parse_number(self.max, 100, "Max")?;
        let unit_price = parse_price(self.price)?;

        let material = NewMaterial {
            code,
            opening_stock,
            details: MaterialDetails {
                name: self.name.to_owned(),
                category,
                unit,
                min_level,
                max_level,
                location: self.location.to_owned(),
                shelf: self.shelf.to_owned(),
                barcode: self.barcode.to_owned(),
                unit_price,
            },
        };
        Ok(material)
    }
}

fn parse_or<T: FromStr<Err = String>>(value: &str, default: T, column: &str) -> Result<T, String> {
    if value.is_empty() {
        Ok(default)
    } else {
        value.parse().map_err(|e| format!("{column}: {e}"))
    }
}

fn parse_number<T: FromStr>(value: &str, default: T, column: &str) -> Result<T, String> {
    if value.is_empty() {
        return Ok(default);
    }
    value
        .parse()
        .map_err(|_| format!("{column}: not a whole number: {value:?}"))
}

fn parse_price(value: &str) -> Result<Decimal, String> {
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    // The rightmost separator is the decimal point: 1.234,50 and 1,234.50
    // are the same amount, and a lone comma is a Turkish decimal comma.
    let normalized = match (value.rfind(','), value.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => value.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => value.replace(',', ""),
        (Some(_), None) => value.replace(',', "."),
        (None, _) => value.to_owned(),
    };
    Decimal::from_str(&normalized).map_err(|_| format!("Fiyat: not a number: {value:?}"))
}

/// Apply parsed rows: create new codes, update existing ones.
///
/// # Errors
///
/// Returns `ImportError::Repository` if the database fails; rows processed
/// before the failure stay imported.
#[instrument(skip_all, fields(rows = parsed.rows.len()))]
pub async fn apply(
    pool: &PgPool,
    parsed: ParsedImport,
    recorded_by: &str,
) -> Result<ImportSummary, ImportError> {
    let materials = MaterialRepository::new(pool);
    let columns = parsed.columns;
    let mut summary = ImportSummary {
        success: true,
        skipped: parsed.skipped,
        errors: parsed.errors,
        ..ImportSummary::default()
    };

    for ImportRow { line, material } in parsed.rows {
        match materials.code_state(&material.code).await? {
            CodeState::Free => {
                if let Err(e) = material.validate() {
                    summary.errors.push(format!("line {line}: {e}"));
                    summary.skipped += 1;
                    continue;
                }
                match materials.create(&material, recorded_by).await {
                    Ok(_) => summary.imported += 1,
                    Err(RepositoryError::Conflict(msg)) => {
                        summary.errors.push(format!("line {line}: {msg}"));
                        summary.skipped += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            CodeState::Active => {
                let Some(existing) = materials.get(&material.code).await? else {
                    summary.errors.push(format!("line {line}: material {} vanished", material.code));
                    summary.skipped += 1;
                    continue;
                };
                let details = columns.merge(&existing, &material.details);
                if let Err(e) = details.validate() {
                    summary.errors.push(format!("line {line}: {e}"));
                    summary.skipped += 1;
                    continue;
                }
                materials.update(&material.code, &details).await?;
                summary.updated += 1;
            }
            CodeState::Archived => {
                summary
                    .errors
                    .push(format!("line {line}: material {} is archived", material.code));
                summary.skipped += 1;
            }
        }
    }

    info!(
        imported = summary.imported,
        updated = summary.updated,
        skipped = summary.skipped,
        "Material import finished"
    );
    Ok(summary)
}
