use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One stock-keeping record of an inventory snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryItem {
    pub id: String,
    pub item_name: String,
    pub category: String,
    pub supplier: String,
    pub current_stock: f64,
    pub reorder_level: f64,
    pub avg_daily_sales: f64,
    pub price: f64,
    pub last_restocked_date: NaiveDate,
}

impl InventoryItem {
    pub fn stock_value(&self) -> f64 {
        self.current_stock * self.price
    }

    pub fn is_below_reorder_level(&self) -> bool {
        self.current_stock < self.reorder_level
    }

    pub fn depletion(&self) -> Depletion {
        Depletion::project(self.current_stock, self.avg_daily_sales)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::field("<empty>", "id", "must be non-empty"));
        }
        let numbers = [
            ("current_stock", self.current_stock),
            ("reorder_level", self.reorder_level),
            ("avg_daily_sales", self.avg_daily_sales),
            ("price", self.price),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(ValidationError::field(&self.id, field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(ValidationError::field(
                    &self.id,
                    field,
                    format!("must be non-negative (got {value})"),
                ));
            }
        }
        Ok(())
    }
}

/// Projected time until stock runs out at the current sales rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum Depletion {
    FiniteDays(f64),
    /// No recorded sales, so stock is never projected to run out.
    NeverDepletes,
}

impl Depletion {
    pub fn project(current_stock: f64, avg_daily_sales: f64) -> Self {
        if avg_daily_sales > 0.0 {
            Self::FiniteDays(current_stock / avg_daily_sales)
        } else {
            Self::NeverDepletes
        }
    }

    pub fn days(self) -> Option<f64> {
        match self {
            Self::FiniteDays(days) => Some(days),
            Self::NeverDepletes => None,
        }
    }

    /// Whole days remaining, rounded down.
    pub fn whole_days(self) -> Option<u64> {
        self.days().map(|d| d.floor() as u64)
    }
}

pub fn parse_snapshot_str(json: &str) -> Result<Vec<InventoryItem>, ValidationError> {
    let value = serde_json::from_str::<Value>(json)
        .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    parse_snapshot(&value)
}

/// Strictly converts a JSON array of records into a snapshot.
///
/// Numeric fields must be JSON numbers, ids may be numbers or strings and are
/// normalised to strings. Fails on the first offending item and field.
pub fn parse_snapshot(value: &Value) -> Result<Vec<InventoryItem>, ValidationError> {
    let records = value.as_array().ok_or(ValidationError::NotAnArray)?;

    let mut items = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or(ValidationError::NotAnObject { index })?;
        items.push(parse_item(index, obj)?);
    }

    validate_snapshot(&items)?;
    Ok(items)
}

pub fn validate_snapshot(items: &[InventoryItem]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        item.validate()?;
        if !seen.insert(item.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                item_id: item.id.clone(),
            });
        }
    }
    Ok(())
}

fn parse_item(index: usize, obj: &Map<String, Value>) -> Result<InventoryItem, ValidationError> {
    let id = parse_id(index, obj)?;

    Ok(InventoryItem {
        item_name: string_field(&id, obj, "item_name")?,
        category: string_field(&id, obj, "category")?,
        supplier: string_field(&id, obj, "supplier")?,
        current_stock: number_field(&id, obj, "current_stock")?,
        reorder_level: number_field(&id, obj, "reorder_level")?,
        avg_daily_sales: number_field(&id, obj, "avg_daily_sales")?,
        price: number_field(&id, obj, "price")?,
        last_restocked_date: date_field(&id, obj, "last_restocked_date")?,
        id,
    })
}

fn parse_id(index: usize, obj: &Map<String, Value>) -> Result<String, ValidationError> {
    let placeholder = format!("#{index}");
    match obj.get("id") {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(ValidationError::field(placeholder, "id", "must be non-empty")),
        Some(_) => Err(ValidationError::field(placeholder, "id", "must be a number or string")),
        None => Err(ValidationError::field(placeholder, "id", "is missing")),
    }
}

fn string_field(
    id: &str,
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ValidationError::field(id, field, "must be non-empty")),
        Some(other) => Err(ValidationError::field(
            id,
            field,
            format!("must be a string (got {other})"),
        )),
        None => Err(ValidationError::field(id, field, "is missing")),
    }
}

fn number_field(
    id: &str,
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, ValidationError> {
    let value = obj
        .get(field)
        .ok_or_else(|| ValidationError::field(id, field, "is missing"))?;
    value
        .as_f64()
        .ok_or_else(|| ValidationError::field(id, field, format!("must be a number (got {value})")))
}

fn date_field(
    id: &str,
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<NaiveDate, ValidationError> {
    let raw = match obj.get(field) {
        Some(Value::String(s)) => s.trim(),
        Some(other) => {
            return Err(ValidationError::field(
                id,
                field,
                format!("must be a date string (got {other})"),
            ))
        }
        None => return Err(ValidationError::field(id, field, "is missing")),
    };

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| ValidationError::field(id, field, format!("is not a calendar date: {raw:?}")))
}
