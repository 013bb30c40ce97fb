//! Dashboard statistics, movement trends and depletion predictions.
//!
//! All functions are pure: the server loads the rows and hands them over.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{BudgetStatus, BudgetSummary, Material, MaterialRequest, Movement, PurchaseOrder};
use crate::types::{Category, MaterialCode, MovementDirection, Priority, RequestStatus};

/// Number of months returned by the trend endpoint.
pub const TREND_MONTHS: usize = 6;

/// Number of months returned by the monthly statistics endpoint.
pub const MONTHLY_STATS_MONTHS: usize = 12;

/// Window of `Out` movements used for consumption estimates, in days.
pub const CONSUMPTION_WINDOW_DAYS: i64 = 30;

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(rename = "toplam_malzeme")]
    pub total_materials: i64,
    #[serde(rename = "toplam_stok_degeri")]
    pub total_stock_value: Decimal,
    #[serde(rename = "kritik_stok_sayisi")]
    pub critical_count: i64,
    #[serde(rename = "bekleyen_talep_sayisi")]
    pub pending_requests: i64,
    #[serde(rename = "bekleyen_siparis_sayisi")]
    pub pending_orders: i64,
    /// Material count per category label.
    #[serde(rename = "kategori_dagilimi")]
    pub category_distribution: BTreeMap<String, i64>,
    /// This year's budget usage spread over twelve months.
    #[serde(rename = "aylik_harcama", default)]
    pub monthly_spend: Decimal,
    #[serde(rename = "butce_durumu", default)]
    pub budget: BudgetStatus,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(
        materials: &[Material],
        requests: &[MaterialRequest],
        orders: &[PurchaseOrder],
        budget: &BudgetSummary,
    ) -> Self {
        Self {
            total_materials: count(materials.len()),
            total_stock_value: total_value(materials),
            critical_count: count(materials.iter().filter(|m| m.is_critical()).count()),
            pending_requests: count(
                requests
                    .iter()
                    .filter(|r| r.status == RequestStatus::Pending)
                    .count(),
            ),
            pending_orders: count(orders.iter().filter(|o| o.status.is_pending()).count()),
            category_distribution: category_distribution(materials),
            monthly_spend: (budget.used / Decimal::from(12)).round_dp(2),
            budget: budget.status(),
        }
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Σ stock × unit price.
#[must_use]
pub fn total_value(materials: &[Material]) -> Decimal {
    materials.iter().map(Material::stock_value).sum()
}

/// Material count per category label; categories without materials are omitted.
#[must_use]
pub fn category_distribution(materials: &[Material]) -> BTreeMap<String, i64> {
    let mut distribution = BTreeMap::new();
    for m in materials {
        *distribution.entry(m.category.label().to_owned()).or_insert(0) += 1;
    }
    distribution
}

/// In and out totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// `YYYY-MM`.
    #[serde(rename = "ay")]
    pub month: String,
    #[serde(rename = "giris")]
    pub total_in: i64,
    #[serde(rename = "cikis")]
    pub total_out: i64,
}

/// Per-month totals for the latest `months` months that have movements,
/// oldest first.
#[must_use]
pub fn monthly_totals(movements: &[Movement], months: usize) -> Vec<MonthlyTotals> {
    let mut by_month: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for m in movements {
        let key = m.recorded_at.format("%Y-%m").to_string();
        let entry = by_month.entry(key).or_insert((0, 0));
        match m.direction {
            MovementDirection::In => entry.0 += m.quantity.get(),
            MovementDirection::Out => entry.1 += m.quantity.get(),
        }
    }
    let skip = by_month.len().saturating_sub(months);
    by_month
        .into_iter()
        .skip(skip)
        .map(|(month, (total_in, total_out))| MonthlyTotals {
            month,
            total_in,
            total_out,
        })
        .collect()
}

/// Chart-ready trend series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub labels: Vec<String>,
    #[serde(rename = "giris")]
    pub total_in: Vec<i64>,
    #[serde(rename = "cikis")]
    pub total_out: Vec<i64>,
}

/// Trend series over the latest [`TREND_MONTHS`] months with movements.
#[must_use]
pub fn trends(movements: &[Movement]) -> TrendSeries {
    let mut series = TrendSeries::default();
    for month in monthly_totals(movements, TREND_MONTHS) {
        series.labels.push(month.month);
        series.total_in.push(month.total_in);
        series.total_out.push(month.total_out);
    }
    series
}

/// One category's share of the total stock value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    #[serde(rename = "kategori")]
    pub category: Category,
    /// Number of materials.
    #[serde(rename = "miktar")]
    pub material_count: i64,
    #[serde(rename = "deger")]
    pub value: Decimal,
    /// Percentage of the total value, two decimals; zero when the total is zero.
    #[serde(rename = "oran")]
    pub share: Decimal,
}

/// Count, value and value share for every category, in category order.
#[must_use]
pub fn category_breakdown(materials: &[Material]) -> Vec<CategoryShare> {
    let total = total_value(materials);
    Category::ALL
        .iter()
        .map(|&category| {
            let in_category: Vec<&Material> =
                materials.iter().filter(|m| m.category == category).collect();
            let value: Decimal = in_category.iter().map(|m| m.stock_value()).sum();
            let share = if total.is_zero() {
                Decimal::ZERO
            } else {
                (value / total * Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            };
            CategoryShare {
                category,
                material_count: count(in_category.len()),
                value,
                share,
            }
        })
        .collect()
}

/// Estimated depletion of one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPrediction {
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "malzeme_adi")]
    pub material_name: String,
    #[serde(rename = "mevcut_stok")]
    pub current_stock: i64,
    /// Average daily `Out` quantity, two decimals.
    #[serde(rename = "gunluk_tuketim")]
    pub daily_consumption: Decimal,
    #[serde(rename = "tahmini_bitis")]
    pub depletion_date: NaiveDate,
    #[serde(rename = "kalan_gun")]
    pub days_left: i64,
    #[serde(rename = "onerilen_siparis")]
    pub suggested_order: i64,
    #[serde(rename = "oncelik")]
    pub priority: Priority,
}

/// Priority band for the number of days a material will last.
#[must_use]
pub const fn priority_for_days_left(days_left: i64) -> Priority {
    match days_left {
        i64::MIN..=7 => Priority::Urgent,
        8..=14 => Priority::High,
        15..=30 => Priority::Normal,
        _ => Priority::Low,
    }
}

/// `max(0, ⌊(max − stock) × 1.2⌋)`.
#[must_use]
pub fn suggested_order(current_stock: i64, max_level: i32) -> i64 {
    let gap = Decimal::from(i64::from(max_level) - current_stock);
    (gap * Decimal::new(12, 1))
        .floor()
        .to_i64()
        .unwrap_or(0)
        .max(0)
}

/// Predict depletion for every material with `Out` movements in the last
/// [`CONSUMPTION_WINDOW_DAYS`] days, most urgent first.
#[must_use]
pub fn predict_depletion(
    materials: &[Material],
    movements: &[Movement],
    now: DateTime<Utc>,
) -> Vec<StockPrediction> {
    let window = Decimal::from(CONSUMPTION_WINDOW_DAYS);
    let since = now - Duration::days(CONSUMPTION_WINDOW_DAYS);

    let mut predictions: Vec<StockPrediction> = materials
        .iter()
        .filter_map(|material| {
            let consumed: i64 = movements
                .iter()
                .filter(|m| {
                    m.material_code == material.code
                        && m.direction == MovementDirection::Out
                        && m.recorded_at >= since
                })
                .map(|m| m.quantity.get())
                .sum();
            if consumed <= 0 {
                return None;
            }
            let daily = Decimal::from(consumed) / window;
            let days_left = (Decimal::from(material.current_stock) / daily)
                .floor()
                .to_i64()
                .unwrap_or(i64::MAX);
            let depletion_date = now
                .date_naive()
                .checked_add_signed(Duration::days(days_left.min(365 * 100)))
                .unwrap_or(NaiveDate::MAX);
            Some(StockPrediction {
                material_code: material.code.clone(),
                material_name: material.name.clone(),
                current_stock: material.current_stock,
                daily_consumption: daily
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
                depletion_date,
                days_left,
                suggested_order: suggested_order(material.current_stock, material.max_level),
                priority: priority_for_days_left(days_left),
            })
        })
        .collect();

    predictions.sort_by_key(|p| (p.priority.urgency_rank(), p.days_left));
    predictions
}
