//! Inventory, movement, department and supplier reports.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::{category_distribution, total_value};
use crate::models::{Material, Movement, PurchaseOrder, Supplier};
use crate::types::{MovementDirection, SupplierCode};

/// Counterparty label used when an `Out` movement has none.
pub const UNKNOWN_DEPARTMENT: &str = "Bilinmiyor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    #[serde(rename = "malzemeler")]
    pub materials: Vec<Material>,
    #[serde(rename = "toplam_deger")]
    pub total_value: Decimal,
    #[serde(rename = "kritik_sayisi")]
    pub critical_count: i64,
    #[serde(rename = "kategori_ozeti")]
    pub category_summary: BTreeMap<String, i64>,
}

impl InventoryReport {
    #[must_use]
    pub fn new(materials: Vec<Material>) -> Self {
        let critical = materials.iter().filter(|m| m.is_critical()).count();
        Self {
            total_value: total_value(&materials),
            critical_count: i64::try_from(critical).unwrap_or(i64::MAX),
            category_summary: category_distribution(&materials),
            materials,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReport {
    #[serde(rename = "hareketler")]
    pub movements: Vec<Movement>,
    #[serde(rename = "toplam_giris")]
    pub total_in: i64,
    #[serde(rename = "toplam_cikis")]
    pub total_out: i64,
    #[serde(rename = "net_degisim")]
    pub net_change: i64,
}

impl MovementReport {
    #[must_use]
    pub fn new(movements: Vec<Movement>) -> Self {
        let sum = |direction| -> i64 {
            movements
                .iter()
                .filter(|m| m.direction == direction)
                .map(|m| m.quantity.get())
                .sum()
        };
        let total_in = sum(MovementDirection::In);
        let total_out = sum(MovementDirection::Out);
        Self {
            movements,
            total_in,
            total_out,
            net_change: total_in - total_out,
        }
    }
}

/// Consumption of one department (the counterparty of `Out` movements).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentConsumption {
    #[serde(rename = "departman")]
    pub department: String,
    #[serde(rename = "toplam_miktar")]
    pub total_quantity: i64,
    /// Number of distinct materials taken.
    #[serde(rename = "kalem_sayisi")]
    pub item_count: i64,
}

/// Group `Out` movements by counterparty, optionally for a single department.
#[must_use]
pub fn department_consumption(
    movements: &[Movement],
    department: Option<&str>,
) -> Vec<DepartmentConsumption> {
    let mut groups: BTreeMap<&str, (i64, BTreeSet<&str>)> = BTreeMap::new();
    for m in movements
        .iter()
        .filter(|m| m.direction == MovementDirection::Out)
    {
        let name = match m.counterparty.trim() {
            "" => UNKNOWN_DEPARTMENT,
            name => name,
        };
        if department.is_some_and(|d| d != name) {
            continue;
        }
        let group = groups.entry(name).or_default();
        group.0 += m.quantity.get();
        group.1.insert(m.material_code.as_str());
    }
    groups
        .into_iter()
        .map(|(name, (total, items))| DepartmentConsumption {
            department: name.to_owned(),
            total_quantity: total,
            item_count: i64::try_from(items.len()).unwrap_or(i64::MAX),
        })
        .collect()
}

/// Order volume of one supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSummary {
    #[serde(rename = "tedarikci")]
    pub supplier: String,
    #[serde(rename = "kod")]
    pub code: SupplierCode,
    #[serde(rename = "puan")]
    pub rating: i16,
    /// Σ order totals.
    #[serde(rename = "toplam_siparis")]
    pub total_ordered: Decimal,
    #[serde(rename = "siparis_sayisi")]
    pub order_count: i64,
}

/// Per-supplier order totals, largest amount first.
#[must_use]
pub fn supplier_summaries(suppliers: &[Supplier], orders: &[PurchaseOrder]) -> Vec<SupplierSummary> {
    let mut report: Vec<SupplierSummary> = suppliers
        .iter()
        .map(|s| {
            let theirs: Vec<&PurchaseOrder> =
                orders.iter().filter(|o| o.supplier_code == s.code).collect();
            SupplierSummary {
                supplier: s.details.name.clone(),
                code: s.code.clone(),
                rating: s.details.rating.get(),
                total_ordered: theirs.iter().map(|o| o.total).sum(),
                order_count: i64::try_from(theirs.len()).unwrap_or(i64::MAX),
            }
        })
        .collect();
    report.sort_by(|a, b| b.total_ordered.cmp(&a.total_ordered));
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::ledger::Quantity;
    use crate::models::SupplierDetails;
    use crate::types::{MaterialCode, MovementId, OrderNo, OrderStatus};

    fn movement(code: &str, direction: MovementDirection, qty: i64, to: &str) -> Movement {
        Movement {
            id: MovementId::new(0),
            recorded_at: Utc::now(),
            material_code: MaterialCode::parse(code).unwrap(),
            direction,
            quantity: Quantity::new(qty).unwrap(),
            counterparty: to.to_owned(),
            note: String::new(),
            order_no: None,
            approved_by: String::new(),
        }
    }

    #[test]
    fn test_movement_report_totals() {
        let report = MovementReport::new(vec![
            movement("A", MovementDirection::In, 10, "ABC"),
            movement("A", MovementDirection::Out, 4, "IK"),
            movement("B", MovementDirection::Out, 1, "IK"),
        ]);
        assert_eq!(report.total_in, 10);
        assert_eq!(report.total_out, 5);
        assert_eq!(report.net_change, 5);
    }

    #[test]
    fn test_department_consumption_groups_out_movements() {
        let movements = vec![
            movement("A", MovementDirection::Out, 4, "IK"),
            movement("A", MovementDirection::Out, 2, "IK"),
            movement("B", MovementDirection::Out, 1, "IK"),
            movement("B", MovementDirection::Out, 3, ""),
            movement("B", MovementDirection::In, 50, "IK"),
        ];
        let all = department_consumption(&movements, None);
        assert_eq!(all.len(), 2);
        let ik = all.iter().find(|d| d.department == "IK").unwrap();
        assert_eq!(ik.total_quantity, 7);
        assert_eq!(ik.item_count, 2);
        let unknown = all.iter().find(|d| d.department == UNKNOWN_DEPARTMENT).unwrap();
        assert_eq!(unknown.total_quantity, 3);

        let only = department_consumption(&movements, Some("IK"));
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn test_supplier_summaries_sorted_by_amount() {
        let supplier = |code: &str| Supplier {
            code: SupplierCode::parse(code).unwrap(),
            details: serde_json::from_str::<SupplierDetails>(r#"{"ad":"X"}"#).unwrap(),
            order_count: 0,
            last_order_at: None,
        };
        let order = |code: &str, total: i64| PurchaseOrder {
            number: OrderNo::from_sequence(1),
            created_at: Utc::now(),
            supplier_code: SupplierCode::parse(code).unwrap(),
            supplier_name: String::new(),
            lines: Vec::new(),
            notes: String::new(),
            total: Decimal::from(total),
            status: OrderStatus::AwaitingApproval,
            created_by: String::new(),
            approved_by: String::new(),
            delivered_at: None,
        };
        let report = supplier_summaries(
            &[supplier("T1"), supplier("T2"), supplier("T3")],
            &[order("T2", 100), order("T2", 50), order("T1", 20)],
        );
        let codes: Vec<&str> = report.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["T2", "T1", "T3"]);
        assert_eq!(report[0].order_count, 2);
        assert_eq!(report[0].total_ordered, Decimal::from(150));
    }
}
