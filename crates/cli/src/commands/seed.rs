//! Seed the database with locations, suppliers, materials and budgets from a
//! YAML file.
//!
//! # File Format
//!
//! ```yaml
//! lokasyonlar:
//!   - kod: DEPO-A
//!     ad: Ana Depo
//! tedarikciler:
//!   - kod: TED001
//!     ad: Kırtasiye Dünyası
//! malzemeler:
//!   - kod: MK0001
//!     ad: A4 Fotokopi Kağıdı
//!     kategori: Kırtasiye
//!     birim: Paket
//!     mevcut_stok: 120
//! butceler:
//!   - yil: 2026
//!     kategori: Kırtasiye
//!     aylik_limit: "5000"
//!     yillik_limit: "60000"
//!     kullanilan: "12500"
//! ```
//!
//! Records whose code (or year and category) already exists are skipped, so a
//! file can be seeded more than once. Materials with opening stock get an
//! opening movement; budgets with usage get it recorded as spending.

use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};

use envanter_core::Validate;
use envanter_core::models::{NewBudget, NewLocation, NewMaterial, NewSupplier};
use envanter_server::db::materials::CodeState;
use envanter_server::db::{
    BudgetRepository, LocationRepository, MaterialRepository, RepositoryError, SupplierRepository,
};

use super::migrate::{self, MigrationError};

/// Name recorded on opening movements created by the seeder.
const SEED_ACTOR: &str = "seed";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] MigrationError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(rename = "lokasyonlar", default)]
    pub locations: Vec<NewLocation>,
    #[serde(rename = "tedarikciler", default)]
    pub suppliers: Vec<NewSupplier>,
    #[serde(rename = "malzemeler", default)]
    pub materials: Vec<NewMaterial>,
    #[serde(rename = "butceler", default)]
    pub budgets: Vec<SeedBudget>,
}

/// A budget with the spending already recorded against it.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedBudget {
    #[serde(flatten)]
    pub limits: NewBudget,
    #[serde(rename = "kullanilan", default)]
    pub used: Decimal,
}

impl SeedFile {
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len() + self.suppliers.len() + self.materials.len() + self.budgets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counts of created and skipped records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub locations: usize,
    pub suppliers: usize,
    pub materials: usize,
    pub budgets: usize,
    pub skipped: usize,
}

/// Check every record and report all problems at once.
#[must_use]
pub fn validate_seed(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    check_section(
        "lokasyonlar",
        seed.locations.iter().map(|l| (&l.code, l as &dyn Validate)),
        &mut errors,
    );
    check_section(
        "tedarikciler",
        seed.suppliers.iter().map(|s| (&s.code, s as &dyn Validate)),
        &mut errors,
    );
    check_section(
        "malzemeler",
        seed.materials.iter().map(|m| (&m.code, m as &dyn Validate)),
        &mut errors,
    );
    let keys: Vec<String> = seed
        .budgets
        .iter()
        .map(|b| format!("{}/{}", b.limits.year, b.limits.category))
        .collect();
    check_section(
        "butceler",
        keys.iter().zip(&seed.budgets).map(|(k, b)| (k, &b.limits as &dyn Validate)),
        &mut errors,
    );
    for (key, budget) in keys.iter().zip(&seed.budgets) {
        if budget.used < Decimal::ZERO {
            errors.push(format!("butceler/{key}: kullanilan must not be negative"));
        }
    }
    errors
}

fn check_section<'a, C>(
    section: &str,
    records: impl Iterator<Item = (&'a C, &'a dyn Validate)>,
    errors: &mut Vec<String>,
) where
    C: Display + Eq + std::hash::Hash + 'a,
{
    let mut seen = HashSet::new();
    for (code, record) in records {
        if !seen.insert(code) {
            errors.push(format!("{section}/{code}: duplicate code"));
        }
        if let Err(e) = record.validate() {
            errors.push(format!("{section}/{code}: {e}"));
        }
    }
}

/// Load and validate a seed file without touching the database.
///
/// # Errors
///
/// Returns `SeedError` if the file is missing, malformed, or invalid.
pub async fn load(path: &Path) -> Result<SeedFile, SeedError> {
    if !path.exists() {
        return Err(SeedError::NotFound(path.display().to_string()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    info!(records = seed.len(), "Parsed seed file");

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }
    Ok(seed)
}

/// Insert the seed records, skipping codes that already exist.
///
/// Locations and suppliers go first so materials can reference them.
///
/// # Errors
///
/// Returns `SeedError::Repository` if an insert fails.
pub async fn apply(pool: &PgPool, seed: &SeedFile) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    let locations = LocationRepository::new(pool);
    for location in &seed.locations {
        if locations.get(&location.code).await?.is_some() {
            summary.skipped += 1;
            continue;
        }
        locations.create(location).await?;
        summary.locations += 1;
    }

    let suppliers = SupplierRepository::new(pool);
    for supplier in &seed.suppliers {
        if suppliers.get(&supplier.code).await?.is_some() {
            summary.skipped += 1;
            continue;
        }
        suppliers.create(supplier).await?;
        summary.suppliers += 1;
    }

    let materials = MaterialRepository::new(pool);
    for material in &seed.materials {
        if materials.code_state(&material.code).await? != CodeState::Free {
            summary.skipped += 1;
            continue;
        }
        materials.create(material, SEED_ACTOR).await?;
        summary.materials += 1;
    }

    let budgets = BudgetRepository::new(pool);
    for budget in &seed.budgets {
        let NewBudget { year, category, .. } = budget.limits;
        if budgets.list_year(year).await?.iter().any(|b| b.category == category) {
            summary.skipped += 1;
            continue;
        }
        budgets.upsert(&budget.limits).await?;
        if budget.used > Decimal::ZERO {
            budgets.add_spend(year, category, budget.used).await?;
        }
        summary.budgets += 1;
    }

    Ok(summary)
}

/// Seed the database from a YAML file.
///
/// # Errors
///
/// Returns `SeedError` if the file is invalid or a database operation fails.
pub async fn run(file_path: &str) -> Result<SeedSummary, SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed file");

    // Validate before connecting
    let seed = load(path).await?;

    let pool = migrate::connect().await?;
    info!("Connected to database");

    let summary = apply(&pool, &seed).await?;
    info!(
        locations = summary.locations,
        suppliers = summary.suppliers,
        materials = summary.materials,
        budgets = summary.budgets,
        skipped = summary.skipped,
        "Seeding complete"
    );
    Ok(summary)
}
