//! Yearly spending budgets per material category.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Category;
use crate::validation::{Validate, ValidationError, non_negative_money};

/// Spending limits and usage of one category in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "yil")]
    pub year: i32,
    #[serde(rename = "kategori")]
    pub category: Category,
    #[serde(rename = "aylik_limit")]
    pub monthly_limit: Decimal,
    #[serde(rename = "yillik_limit")]
    pub annual_limit: Decimal,
    #[serde(rename = "kullanilan", default)]
    pub used: Decimal,
    /// Annual limit minus usage; negative once the limit is passed.
    #[serde(rename = "kalan", default)]
    pub remaining: Decimal,
}

impl Budget {
    /// Add spending and recompute what remains.
    pub fn record_spend(&mut self, amount: Decimal) {
        self.used += amount;
        self.remaining = self.annual_limit - self.used;
    }

    /// How far usage is past the annual limit, if it is.
    #[must_use]
    pub fn overrun(&self) -> Option<Decimal> {
        (self.remaining < Decimal::ZERO).then(|| -self.remaining)
    }
}

/// Body of `POST /budget`: set the limits of one category for a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBudget {
    #[serde(rename = "yil")]
    pub year: i32,
    #[serde(rename = "kategori")]
    pub category: Category,
    #[serde(rename = "aylik_limit")]
    pub monthly_limit: Decimal,
    #[serde(rename = "yillik_limit")]
    pub annual_limit: Decimal,
}

impl Validate for NewBudget {
    fn validate(&self) -> Result<(), ValidationError> {
        valid_year(self.year)?;
        non_negative_money("aylik_limit", self.monthly_limit)?;
        non_negative_money("yillik_limit", self.annual_limit)
    }
}

/// Query of `GET /budget`. Defaults to the current year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetQuery {
    #[serde(rename = "yil", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Query of `POST /budget/update`: record spending against a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSpend {
    #[serde(rename = "yil")]
    pub year: i32,
    #[serde(rename = "kategori")]
    pub category: Category,
    #[serde(rename = "harcama")]
    pub amount: Decimal,
}

impl Validate for BudgetSpend {
    fn validate(&self) -> Result<(), ValidationError> {
        valid_year(self.year)?;
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::OutOfRange {
                field: "harcama",
                message: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

fn valid_year(year: i32) -> Result<(), ValidationError> {
    if (2000..=2100).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: "yil",
            message: format!("{year} is not a plausible budget year"),
        })
    }
}

/// Totals of one year's budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    #[serde(rename = "yil")]
    pub year: i32,
    #[serde(rename = "toplam_butce")]
    pub total: Decimal,
    #[serde(rename = "kullanilan")]
    pub used: Decimal,
    #[serde(rename = "kalan")]
    pub remaining: Decimal,
    /// Usage as a percentage of the total, two decimals. Zero without a budget.
    #[serde(rename = "oran")]
    pub ratio: Decimal,
    #[serde(rename = "kategoriler")]
    pub categories: Vec<Budget>,
}

impl BudgetSummary {
    #[must_use]
    pub fn from_budgets(year: i32, categories: Vec<Budget>) -> Self {
        let total: Decimal = categories.iter().map(|b| b.annual_limit).sum();
        let used: Decimal = categories.iter().map(|b| b.used).sum();
        Self {
            year,
            total,
            used,
            remaining: total - used,
            ratio: percentage(used, total),
            categories,
        }
    }

    /// The headline figures shown on the dashboard.
    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        BudgetStatus {
            total: self.total,
            used: self.used,
            remaining: self.remaining,
            ratio: self.ratio,
        }
    }
}

/// `butce_durumu` of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    #[serde(rename = "toplam")]
    pub total: Decimal,
    #[serde(rename = "kullanilan")]
    pub used: Decimal,
    #[serde(rename = "kalan")]
    pub remaining: Decimal,
    #[serde(rename = "oran")]
    pub ratio: Decimal,
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn budget(category: Category, annual: i64, used: i64) -> Budget {
        Budget {
            year: 2026,
            category,
            monthly_limit: Decimal::from(annual / 12),
            annual_limit: Decimal::from(annual),
            used: Decimal::from(used),
            remaining: Decimal::from(annual - used),
        }
    }

    #[test]
    fn test_summary_totals() {
        let summary = BudgetSummary::from_budgets(
            2026,
            vec![
                budget(Category::Stationery, 60_000, 12_500),
                budget(Category::Cleaning, 36_000, 8_400),
            ],
        );
        assert_eq!(summary.total, Decimal::from(96_000));
        assert_eq!(summary.used, Decimal::from(20_900));
        assert_eq!(summary.remaining, Decimal::from(75_100));
        assert_eq!(summary.ratio, Decimal::new(2177, 2));
        assert_eq!(summary.status().remaining, summary.remaining);
    }

    #[test]
    fn test_empty_year_has_zero_ratio() {
        let summary = BudgetSummary::from_budgets(2030, Vec::new());
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.ratio, Decimal::ZERO);
    }

    #[test]
    fn test_spend_updates_remaining() {
        let mut kitchen = budget(Category::Kitchen, 24_000, 6_000);
        kitchen.record_spend(Decimal::from(1_000));
        assert_eq!(kitchen.used, Decimal::from(7_000));
        assert_eq!(kitchen.remaining, Decimal::from(17_000));
        assert!(kitchen.overrun().is_none());

        kitchen.record_spend(Decimal::from(18_000));
        assert_eq!(kitchen.overrun(), Some(Decimal::from(1_000)));
    }

    #[test]
    fn test_spend_query_validation() {
        let json = r#"{"yil":2026,"kategori":"Teknik","harcama":"250.75"}"#;
        let spend: BudgetSpend = serde_json::from_str(json).unwrap();
        assert!(spend.validate().is_ok());

        let zero = BudgetSpend {
            amount: Decimal::ZERO,
            ..spend.clone()
        };
        assert_eq!(zero.validate().unwrap_err().field(), "harcama");

        let ancient = BudgetSpend { year: 1900, ..spend };
        assert_eq!(ancient.validate().unwrap_err().field(), "yil");
    }
}
