//! Inventory health report built from a snapshot plus a recommendation list.

pub mod html;

use crate::domain::inventory::{Depletion, InventoryItem};
use crate::domain::recommendation::{Priority, Recommendation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Days reported for restock items that have no recorded sales.
pub const NO_DEPLETION_SENTINEL_DAYS: u64 = 999;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLimits {
    pub action_item_limit: usize,
    pub recommendation_limit: usize,
    pub slow_moving_max_daily_sales: f64,
    pub fast_moving_min_daily_sales: f64,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            action_item_limit: 5,
            recommendation_limit: 10,
            slow_moving_max_daily_sales: 0.5,
            fast_moving_min_daily_sales: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub category_breakdown: Vec<BreakdownEntry>,
    pub supplier_breakdown: Vec<BreakdownEntry>,
    pub stock_health: StockHealth,
    pub action_items: ActionItems,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_items: usize,
    pub total_value: f64,
    pub items_below_reorder_level: usize,
    /// High-priority recommendations in the full input list.
    pub critical_items: usize,
    pub health_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub name: String,
    pub item_count: usize,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHealth {
    pub overall: f64,
    pub by_category: Vec<CategoryHealth>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHealth {
    pub category: String,
    pub health_percentage: f64,
    pub item_count: usize,
    pub below_reorder_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItems {
    pub items_to_restock: Vec<RestockItem>,
    pub slow_moving_items: Vec<InventoryItem>,
    pub fast_moving_items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockItem {
    #[serde(flatten)]
    pub item: InventoryItem,
    /// Whole days left, or [`NO_DEPLETION_SENTINEL_DAYS`] when nothing sells.
    pub days_until_empty: u64,
    pub depletion: Depletion,
}

pub fn build_report(items: &[InventoryItem], recommendations: &[Recommendation]) -> Report {
    build_report_with(items, recommendations, Utc::now(), &ReportLimits::default())
}

/// Pure given its inputs; `generated_at` is stamped on the report as-is.
pub fn build_report_with(
    items: &[InventoryItem],
    recommendations: &[Recommendation],
    generated_at: DateTime<Utc>,
    limits: &ReportLimits,
) -> Report {
    let total_items = items.len();
    let total_value: f64 = items.iter().map(InventoryItem::stock_value).sum();
    let items_below_reorder_level = items.iter().filter(|i| i.is_below_reorder_level()).count();
    let critical_items = recommendations
        .iter()
        .filter(|r| r.priority == Priority::High)
        .count();
    let health_score = health_percentage(items_below_reorder_level, total_items);

    let categories = group_by(items, |i| i.category.as_str());
    let suppliers = group_by(items, |i| i.supplier.as_str());

    let by_category = categories
        .iter()
        .map(|(category, members)| {
            let below_reorder_count = members.iter().filter(|i| i.is_below_reorder_level()).count();
            CategoryHealth {
                category: category.to_string(),
                health_percentage: health_percentage(below_reorder_count, members.len()),
                item_count: members.len(),
                below_reorder_count,
            }
        })
        .collect();

    let report = Report {
        generated_at,
        summary: ReportSummary {
            total_items,
            total_value: round_to(total_value, 2),
            items_below_reorder_level,
            critical_items,
            health_score,
        },
        category_breakdown: breakdown(&categories, total_items),
        supplier_breakdown: breakdown(&suppliers, total_items),
        stock_health: StockHealth {
            overall: health_score,
            by_category,
        },
        action_items: action_items(items, limits),
        recommendations: recommendations
            .iter()
            .take(limits.recommendation_limit)
            .cloned()
            .collect(),
    };

    tracing::debug!(
        total_items,
        items_below_reorder_level,
        critical_items,
        health_score,
        "inventory report built"
    );
    report
}

fn action_items(items: &[InventoryItem], limits: &ReportLimits) -> ActionItems {
    let mut restock: Vec<RestockItem> = items
        .iter()
        .filter(|i| i.is_below_reorder_level())
        .map(|i| {
            let depletion = i.depletion();
            RestockItem {
                item: i.clone(),
                days_until_empty: depletion.whole_days().unwrap_or(NO_DEPLETION_SENTINEL_DAYS),
                depletion,
            }
        })
        .collect();
    restock.sort_by_key(|r| r.days_until_empty);
    restock.truncate(limits.action_item_limit);

    let mut slow: Vec<&InventoryItem> = items
        .iter()
        .filter(|i| {
            i.avg_daily_sales < limits.slow_moving_max_daily_sales
                && i.current_stock > i.reorder_level
        })
        .collect();
    // Ascending then reversed: equal values end up in reverse input order.
    slow.sort_by(|a, b| a.stock_value().total_cmp(&b.stock_value()));
    slow.reverse();

    let mut fast: Vec<&InventoryItem> = items
        .iter()
        .filter(|i| i.avg_daily_sales > limits.fast_moving_min_daily_sales)
        .collect();
    fast.sort_by(|a, b| b.avg_daily_sales.total_cmp(&a.avg_daily_sales));

    ActionItems {
        items_to_restock: restock,
        slow_moving_items: slow
            .into_iter()
            .take(limits.action_item_limit)
            .cloned()
            .collect(),
        fast_moving_items: fast
            .into_iter()
            .take(limits.action_item_limit)
            .cloned()
            .collect(),
    }
}

fn breakdown(groups: &[(&str, Vec<&InventoryItem>)], total_items: usize) -> Vec<BreakdownEntry> {
    groups
        .iter()
        .map(|(name, members)| BreakdownEntry {
            name: name.to_string(),
            item_count: members.len(),
            value: round_to(members.iter().map(|i| i.stock_value()).sum(), 2),
            percentage: round_to(members.len() as f64 / total_items as f64 * 100.0, 1),
        })
        .collect()
}

/// Groups in order of first appearance.
fn group_by<'a>(
    items: &'a [InventoryItem],
    key: impl Fn(&'a InventoryItem) -> &'a str,
) -> Vec<(&'a str, Vec<&'a InventoryItem>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&InventoryItem>)> = Vec::new();
    for item in items {
        let k = key(item);
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item);
    }
    groups
}

/// Share of items at or above reorder level. An empty set counts as fully healthy.
fn health_percentage(below: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    round_to(100.0 - below as f64 / total as f64 * 100.0, 1)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::tests::item;
    use crate::domain::recommendation::tests::rec;
    use crate::domain::recommendation::RecommendationType;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn build(items: &[InventoryItem], recs: &[Recommendation]) -> Report {
        build_report_with(items, recs, at(), &ReportLimits::default())
    }

    fn stocked(id: &str, category: &str, supplier: &str, stock: f64, reorder: f64) -> InventoryItem {
        let mut it = item(id);
        it.category = category.to_string();
        it.supplier = supplier.to_string();
        it.current_stock = stock;
        it.reorder_level = reorder;
        it
    }

    #[test]
    fn single_low_stock_item_scenario() {
        let mut it = stocked("1", "A", "X", 2.0, 10.0);
        it.price = 20.0;
        let recs = vec![rec("restock-1", RecommendationType::Warning, Priority::High)];

        let report = build(&[it], &recs);
        assert_eq!(report.summary.total_items, 1);
        assert_eq!(report.summary.items_below_reorder_level, 1);
        assert_eq!(report.summary.health_score, 0.0);
        assert_eq!(report.summary.total_value, 40.0);
        assert_eq!(report.summary.critical_items, 1);
        assert_eq!(report.action_items.items_to_restock[0].days_until_empty, 2);
        assert_eq!(format!("{:.1}", report.summary.health_score), "0.0");
    }

    #[test]
    fn empty_snapshot_is_fully_healthy() {
        let report = build(&[], &[]);
        assert_eq!(report.summary.total_items, 0);
        assert_eq!(report.summary.health_score, 100.0);
        assert_eq!(report.stock_health.overall, 100.0);
        assert!(report.category_breakdown.is_empty());
        assert!(report.supplier_breakdown.is_empty());
        assert!(report.stock_health.by_category.is_empty());
    }

    #[test]
    fn breakdowns_keep_first_appearance_order_and_sum_to_100() {
        let items = vec![
            stocked("1", "Tools", "Acme", 10.0, 5.0),
            stocked("2", "Paint", "Brush Co", 10.0, 5.0),
            stocked("3", "Tools", "Brush Co", 1.0, 5.0),
            stocked("4", "Garden", "Acme", 10.0, 5.0),
            stocked("5", "Paint", "Acme", 10.0, 5.0),
            stocked("6", "Lighting", "Lumen", 10.0, 5.0),
        ];
        let report = build(&items, &[]);

        let names: Vec<_> = report.category_breakdown.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Tools", "Paint", "Garden", "Lighting"]);
        assert_eq!(report.category_breakdown[0].item_count, 2);
        assert_eq!(report.category_breakdown[0].value, 110.0);

        for groups in [&report.category_breakdown, &report.supplier_breakdown] {
            let sum: f64 = groups.iter().map(|b| b.percentage).sum();
            assert!(
                (sum - 100.0).abs() <= 0.05 * groups.len() as f64 + 1e-9,
                "sum={sum}"
            );
        }

        let tools = &report.stock_health.by_category[0];
        assert_eq!(tools.below_reorder_count, 1);
        assert_eq!(tools.health_percentage, 50.0);
        assert_eq!(report.summary.health_score, 83.3);
    }

    #[test]
    fn restock_list_sorts_by_exported_days_and_caps_at_five() {
        let mut items = Vec::new();
        for (i, sales) in [0.0, 1.0, 4.0, 2.0, 0.5, 8.0, 3.0].iter().enumerate() {
            let mut it = stocked(&i.to_string(), "A", "X", 8.0, 10.0);
            it.avg_daily_sales = *sales;
            items.push(it);
        }
        let report = build(&items, &[]);
        let restock = &report.action_items.items_to_restock;
        assert_eq!(restock.len(), 5);
        let days: Vec<_> = restock.iter().map(|r| r.days_until_empty).collect();
        assert_eq!(days, [1, 2, 2, 4, 8]);

        let only_zero = vec![{
            let mut it = stocked("z", "A", "X", 1.0, 10.0);
            it.avg_daily_sales = 0.0;
            it
        }];
        let report = build(&only_zero, &[]);
        let r = &report.action_items.items_to_restock[0];
        assert_eq!(r.days_until_empty, NO_DEPLETION_SENTINEL_DAYS);
        assert_eq!(r.depletion, Depletion::NeverDepletes);
    }

    #[test]
    fn sentinel_sorts_by_value_against_long_projections() {
        let mut trickle = stocked("slow", "A", "X", 50.0, 100.0);
        trickle.avg_daily_sales = 0.01;
        let mut idle = stocked("idle", "A", "X", 50.0, 100.0);
        idle.avg_daily_sales = 0.0;
        let mut soon = stocked("soon", "A", "X", 50.0, 100.0);
        soon.avg_daily_sales = 10.0;

        let report = build(&[trickle, idle, soon], &[]);
        let order: Vec<_> = report
            .action_items
            .items_to_restock
            .iter()
            .map(|r| (r.item.id.as_str(), r.days_until_empty))
            .collect();
        assert_eq!(order, [("soon", 5), ("idle", 999), ("slow", 5000)]);
    }

    #[test]
    fn slow_and_fast_movers_are_ranked() {
        let mut slow_cheap = stocked("1", "A", "X", 30.0, 10.0);
        slow_cheap.avg_daily_sales = 0.1;
        slow_cheap.price = 1.0;
        let mut slow_dear = stocked("2", "A", "X", 30.0, 10.0);
        slow_dear.avg_daily_sales = 0.2;
        slow_dear.price = 100.0;
        let mut fast = stocked("3", "A", "X", 30.0, 10.0);
        fast.avg_daily_sales = 2.5;
        let mut faster = stocked("4", "A", "X", 30.0, 10.0);
        faster.avg_daily_sales = 6.0;

        let report = build(&[slow_cheap, slow_dear, fast, faster], &[]);
        let slow_ids: Vec<_> = report
            .action_items
            .slow_moving_items
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(slow_ids, ["2", "1"]);
        let fast_ids: Vec<_> = report
            .action_items
            .fast_moving_items
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(fast_ids, ["4", "3"]);
    }

    #[test]
    fn slow_movers_with_equal_value_come_out_in_reverse_input_order() {
        let items: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|id| {
                let mut it = stocked(id, "A", "X", 30.0, 10.0);
                it.avg_daily_sales = 0.1;
                it
            })
            .collect();
        let report = build(&items, &[]);
        let ids: Vec<_> = report
            .action_items
            .slow_moving_items
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn keeps_first_ten_recommendations_in_input_order() {
        let recs: Vec<_> = (0..14)
            .map(|i| rec(&format!("r{i}"), RecommendationType::Info, Priority::Low))
            .collect();
        let report = build(&[item("1")], &recs);
        assert_eq!(report.recommendations.len(), 10);
        assert_eq!(report.recommendations[0].id, "r0");
        assert_eq!(report.recommendations[9].id, "r9");
    }

    #[test]
    fn building_twice_is_idempotent() {
        let items = vec![stocked("1", "A", "X", 2.0, 10.0), stocked("2", "B", "Y", 50.0, 10.0)];
        let recs = vec![rec("a", RecommendationType::Warning, Priority::High)];
        assert_eq!(build(&items, &recs), build(&items, &recs));
    }

    #[test]
    fn exports_camel_case_json() {
        let report = build(&[stocked("1", "A", "X", 2.0, 10.0)], &[]);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["summary"]["itemsBelowReorderLevel"], 1);
        assert_eq!(v["actionItems"]["itemsToRestock"][0]["item_name"], "Item 1");
        assert_eq!(v["actionItems"]["itemsToRestock"][0]["daysUntilEmpty"], 2);
        assert_eq!(v["categoryBreakdown"][0]["percentage"], 100.0);
        assert!(v["generatedAt"].as_str().unwrap().starts_with("2026-10-18T09:00:00"));
    }
}
