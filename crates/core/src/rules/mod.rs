//! Rule-based recommendation engine.
//!
//! Every item is run through seven independent rules, each emitting at most one
//! recommendation. The combined list is stable-sorted by priority, so ties keep
//! item order and then rule order.

pub mod thresholds;

use crate::domain::inventory::{Depletion, InventoryItem};
use crate::domain::recommendation::{
    sort_by_priority, Icon, Priority, Recommendation, RecommendationType,
};
use crate::error::ValidationError;
use chrono::{NaiveDate, Utc};
use rand::Rng;
use std::collections::{HashMap, HashSet};

pub use thresholds::RuleThresholds;

/// Evaluates the default rule set against `items` using the current date and
/// thread-local randomness.
pub fn evaluate(items: &[InventoryItem]) -> Vec<Recommendation> {
    RuleEvaluator::default().evaluate(items)
}

#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    thresholds: RuleThresholds,
}

impl RuleEvaluator {
    pub fn new(thresholds: RuleThresholds) -> Result<Self, ValidationError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, items: &[InventoryItem]) -> Vec<Recommendation> {
        let today = Utc::now().date_naive();
        self.evaluate_with(items, today, &mut rand::thread_rng())
    }

    /// Deterministic given `today` and the state of `rng`.
    ///
    /// `rng` is only drawn from for items whose category has a single supplier.
    pub fn evaluate_with<R: Rng>(
        &self,
        items: &[InventoryItem],
        today: NaiveDate,
        rng: &mut R,
    ) -> Vec<Recommendation> {
        let suppliers_by_category = suppliers_by_category(items);

        let mut out = Vec::new();
        for item in items {
            let depletion = item.depletion();

            out.extend(self.low_stock(item, depletion));
            out.extend(self.slow_moving(item, depletion));
            out.extend(self.fast_moving(item));
            out.extend(self.stale_restock(item, today));
            out.extend(self.price_optimization(item));
            out.extend(self.imminent_stockout(item, depletion));

            let single_supplier = suppliers_by_category
                .get(item.category.as_str())
                .is_some_and(|s| s.len() == 1);
            if single_supplier && rng.gen_bool(self.thresholds.supplier_nudge_probability) {
                out.push(supplier_concentration(item));
            }
        }

        sort_by_priority(&mut out);

        tracing::debug!(
            items = items.len(),
            recommendations = out.len(),
            %today,
            "rule evaluation complete"
        );
        out
    }

    fn low_stock(&self, item: &InventoryItem, depletion: Depletion) -> Option<Recommendation> {
        if !item.is_below_reorder_level() {
            return None;
        }

        let whole_days = depletion.whole_days();
        let priority = match whole_days {
            Some(days) if days as f64 <= self.thresholds.low_stock_high_priority_days => {
                Priority::High
            }
            _ => Priority::Medium,
        };
        let detail = match whole_days {
            Some(days) => format!("Will run out in approximately {days} days based on average sales."),
            None => "No projected run-out date: no recorded sales.".to_string(),
        };

        Some(Recommendation {
            id: format!("restock-{}", item.id),
            item_id: item.id.clone(),
            item_name: item.item_name.clone(),
            kind: RecommendationType::Warning,
            priority,
            message: format!(
                "Restock {} - Current stock ({}) below reorder level ({}).",
                item.item_name, item.current_stock, item.reorder_level
            ),
            detail,
            action_required: true,
            icon: Icon::Alert,
        })
    }

    fn slow_moving(&self, item: &InventoryItem, depletion: Depletion) -> Option<Recommendation> {
        let t = &self.thresholds;
        if !(item.avg_daily_sales < t.slow_moving_max_daily_sales
            && item.current_stock > item.reorder_level * t.slow_moving_stock_multiple)
        {
            return None;
        }

        let detail = match depletion.whole_days() {
            Some(days) => format!(
                "Current stock of {} units will last {days} days at current sales rate.",
                item.current_stock
            ),
            None => format!(
                "Current stock of {} units will not sell through at current sales rate (no recorded sales).",
                item.current_stock
            ),
        };

        Some(Recommendation {
            id: format!("slow-{}", item.id),
            item_id: item.id.clone(),
            item_name: item.item_name.clone(),
            kind: RecommendationType::Info,
            priority: Priority::Low,
            message: format!("{} is slow-moving - Consider discounting.", item.item_name),
            detail,
            action_required: false,
            icon: Icon::ChartDown,
        })
    }

    fn fast_moving(&self, item: &InventoryItem) -> Option<Recommendation> {
        let t = &self.thresholds;
        if !(item.avg_daily_sales > t.fast_moving_min_daily_sales
            && item.current_stock < item.reorder_level * t.fast_moving_stock_multiple)
        {
            return None;
        }

        Some(Recommendation {
            id: format!("fast-{}", item.id),
            item_id: item.id.clone(),
            item_name: item.item_name.clone(),
            kind: RecommendationType::Success,
            priority: Priority::Medium,
            message: format!("{} is selling rapidly - Adjust restock frequency.", item.item_name),
            detail: format!(
                "Consider increasing reorder level due to high daily sales ({} units/day).",
                item.avg_daily_sales
            ),
            action_required: false,
            icon: Icon::ChartUp,
        })
    }

    fn stale_restock(&self, item: &InventoryItem, today: NaiveDate) -> Option<Recommendation> {
        let days_since_restock = (today - item.last_restocked_date).num_days();
        if days_since_restock <= self.thresholds.stale_restock_days {
            return None;
        }

        Some(Recommendation {
            id: format!("old-{}", item.id),
            item_id: item.id.clone(),
            item_name: item.item_name.clone(),
            kind: RecommendationType::Info,
            priority: Priority::Low,
            message: format!(
                "{} hasn't been restocked in {days_since_restock} days.",
                item.item_name
            ),
            detail: format!(
                "Last restock was on {}. Consider checking supplier relationship.",
                item.last_restocked_date.format("%Y-%m-%d")
            ),
            action_required: false,
            icon: Icon::Clock,
        })
    }

    fn price_optimization(&self, item: &InventoryItem) -> Option<Recommendation> {
        let t = &self.thresholds;
        if !(item.price > t.price_optimization_min_price
            && item.avg_daily_sales < t.price_optimization_max_daily_sales
            && item.current_stock > item.reorder_level)
        {
            return None;
        }

        Some(Recommendation {
            id: format!("price-{}", item.id),
            item_id: item.id.clone(),
            item_name: item.item_name.clone(),
            kind: RecommendationType::Info,
            priority: Priority::Medium,
            message: format!("Consider price adjustment for {}.", item.item_name),
            detail: format!(
                "High-priced item ({}) with low daily sales ({}).",
                item.price, item.avg_daily_sales
            ),
            action_required: false,
            icon: Icon::Tag,
        })
    }

    fn imminent_stockout(
        &self,
        item: &InventoryItem,
        depletion: Depletion,
    ) -> Option<Recommendation> {
        let days = depletion
            .days()
            .filter(|d| *d > 0.0 && *d < self.thresholds.imminent_stockout_days)?;

        Some(Recommendation {
            id: format!("urgent-{}", item.id),
            item_id: item.id.clone(),
            item_name: item.item_name.clone(),
            kind: RecommendationType::Danger,
            priority: Priority::High,
            message: format!(
                "URGENT: {} will stock out in {} days.",
                item.item_name,
                days.ceil()
            ),
            detail: format!("Expedite delivery from {}.", item.supplier),
            action_required: true,
            icon: Icon::AlertTriangle,
        })
    }
}

fn supplier_concentration(item: &InventoryItem) -> Recommendation {
    Recommendation {
        id: format!("supplier-{}", item.id),
        item_id: item.id.clone(),
        item_name: item.item_name.clone(),
        kind: RecommendationType::Info,
        priority: Priority::Low,
        message: format!("Consider diversifying suppliers for {}.", item.category),
        detail: format!(
            "All {} items are sourced from a single supplier ({}).",
            item.category, item.supplier
        ),
        action_required: false,
        icon: Icon::Users,
    }
}

fn suppliers_by_category(items: &[InventoryItem]) -> HashMap<&str, HashSet<&str>> {
    let mut out: HashMap<&str, HashSet<&str>> = HashMap::new();
    for item in items {
        out.entry(item.category.as_str())
            .or_default()
            .insert(item.supplier.as_str());
    }
    out
}
