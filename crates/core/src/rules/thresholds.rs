use crate::error::ValidationError;
use anyhow::Context;
use std::str::FromStr;

pub const DEFAULT_LOW_STOCK_HIGH_PRIORITY_DAYS: f64 = 3.0;
pub const DEFAULT_SLOW_MOVING_MAX_DAILY_SALES: f64 = 0.5;
pub const DEFAULT_SLOW_MOVING_STOCK_MULTIPLE: f64 = 2.0;
pub const DEFAULT_FAST_MOVING_MIN_DAILY_SALES: f64 = 3.0;
pub const DEFAULT_FAST_MOVING_STOCK_MULTIPLE: f64 = 1.5;
pub const DEFAULT_STALE_RESTOCK_DAYS: i64 = 45;
pub const DEFAULT_PRICE_OPTIMIZATION_MIN_PRICE: f64 = 50.0;
pub const DEFAULT_PRICE_OPTIMIZATION_MAX_DAILY_SALES: f64 = 1.0;
pub const DEFAULT_IMMINENT_STOCKOUT_DAYS: f64 = 3.0;
pub const DEFAULT_SUPPLIER_NUDGE_PROBABILITY: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleThresholds {
    /// Low-stock items projected to empty within this many whole days are high priority.
    pub low_stock_high_priority_days: f64,
    pub slow_moving_max_daily_sales: f64,
    /// Slow-moving requires stock above `reorder_level * multiple`.
    pub slow_moving_stock_multiple: f64,
    pub fast_moving_min_daily_sales: f64,
    /// Fast-moving requires stock below `reorder_level * multiple`.
    pub fast_moving_stock_multiple: f64,
    pub stale_restock_days: i64,
    pub price_optimization_min_price: f64,
    pub price_optimization_max_daily_sales: f64,
    pub imminent_stockout_days: f64,
    /// Chance that a single-supplier category nudge is shown on a given evaluation.
    pub supplier_nudge_probability: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            low_stock_high_priority_days: DEFAULT_LOW_STOCK_HIGH_PRIORITY_DAYS,
            slow_moving_max_daily_sales: DEFAULT_SLOW_MOVING_MAX_DAILY_SALES,
            slow_moving_stock_multiple: DEFAULT_SLOW_MOVING_STOCK_MULTIPLE,
            fast_moving_min_daily_sales: DEFAULT_FAST_MOVING_MIN_DAILY_SALES,
            fast_moving_stock_multiple: DEFAULT_FAST_MOVING_STOCK_MULTIPLE,
            stale_restock_days: DEFAULT_STALE_RESTOCK_DAYS,
            price_optimization_min_price: DEFAULT_PRICE_OPTIMIZATION_MIN_PRICE,
            price_optimization_max_daily_sales: DEFAULT_PRICE_OPTIMIZATION_MAX_DAILY_SALES,
            imminent_stockout_days: DEFAULT_IMMINENT_STOCKOUT_DAYS,
            supplier_nudge_probability: DEFAULT_SUPPLIER_NUDGE_PROBABILITY,
        }
    }
}

impl RuleThresholds {
    /// Defaults overridden by `RULE_*` variables. A value that does not parse is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut out = Self::default();
        let f64_overrides: [(&mut f64, &str); 9] = [
            (&mut out.low_stock_high_priority_days, "RULE_LOW_STOCK_HIGH_PRIORITY_DAYS"),
            (&mut out.slow_moving_max_daily_sales, "RULE_SLOW_MOVING_MAX_DAILY_SALES"),
            (&mut out.slow_moving_stock_multiple, "RULE_SLOW_MOVING_STOCK_MULTIPLE"),
            (&mut out.fast_moving_min_daily_sales, "RULE_FAST_MOVING_MIN_DAILY_SALES"),
            (&mut out.fast_moving_stock_multiple, "RULE_FAST_MOVING_STOCK_MULTIPLE"),
            (&mut out.price_optimization_min_price, "RULE_PRICE_OPTIMIZATION_MIN_PRICE"),
            (
                &mut out.price_optimization_max_daily_sales,
                "RULE_PRICE_OPTIMIZATION_MAX_DAILY_SALES",
            ),
            (&mut out.imminent_stockout_days, "RULE_IMMINENT_STOCKOUT_DAYS"),
            (&mut out.supplier_nudge_probability, "RULE_SUPPLIER_NUDGE_PROBABILITY"),
        ];
        for (slot, key) in f64_overrides {
            if let Some(v) = parsed(&lookup, key)? {
                *slot = v;
            }
        }
        if let Some(v) = parsed(&lookup, "RULE_STALE_RESTOCK_DAYS")? {
            out.stale_restock_days = v;
        }

        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let non_negative = [
            ("low_stock_high_priority_days", self.low_stock_high_priority_days),
            ("slow_moving_max_daily_sales", self.slow_moving_max_daily_sales),
            ("slow_moving_stock_multiple", self.slow_moving_stock_multiple),
            ("fast_moving_min_daily_sales", self.fast_moving_min_daily_sales),
            ("fast_moving_stock_multiple", self.fast_moving_stock_multiple),
            ("price_optimization_min_price", self.price_optimization_min_price),
            ("price_optimization_max_daily_sales", self.price_optimization_max_daily_sales),
            ("imminent_stockout_days", self.imminent_stockout_days),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ValidationError::InvalidThreshold {
                    name,
                    reason: format!("must be a finite non-negative number (got {value})"),
                });
            }
        }

        if self.stale_restock_days < 0 {
            return Err(ValidationError::InvalidThreshold {
                name: "stale_restock_days",
                reason: format!("must be non-negative (got {})", self.stale_restock_days),
            });
        }

        if !(0.0..=1.0).contains(&self.supplier_nudge_probability) {
            return Err(ValidationError::InvalidThreshold {
                name: "supplier_nudge_probability",
                reason: format!(
                    "must be between 0 and 1 (got {})",
                    self.supplier_nudge_probability
                ),
            });
        }

        Ok(())
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(|raw| raw.parse::<T>().with_context(|| format!("invalid {key}: {raw:?}")))
        .transpose()
}
