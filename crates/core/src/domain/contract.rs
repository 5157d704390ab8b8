use crate::domain::inventory::InventoryItem;
use crate::domain::recommendation::{
    sort_by_priority, Icon, Priority, Recommendation, RecommendationType,
};
use anyhow::{ensure, Context};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Recommendation as returned by the advisory model. Every field is untrusted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRecommendation {
    pub id: Option<Value>,
    pub item_id: Option<Value>,
    pub item_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub priority: Option<String>,
    pub message: Option<String>,
    pub detail: Option<String>,
    pub action_required: Option<bool>,
    pub icon: Option<String>,
}

/// Checks an advisory payload against the snapshot it was generated for and
/// converts it into priority-sorted recommendations.
pub fn validate_and_into_recommendations(
    items: Vec<AdvisoryRecommendation>,
    snapshot: &[InventoryItem],
) -> anyhow::Result<Vec<Recommendation>> {
    ensure!(!items.is_empty(), "advisory output contains no recommendations");

    let names: HashMap<&str, &str> = snapshot
        .iter()
        .map(|i| (i.id.as_str(), i.item_name.as_str()))
        .collect();

    let mut seen_ids = HashSet::<String>::new();
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let rec = item
            .validate_and_into_recommendation(&names, &mut seen_ids)
            .with_context(|| format!("advisory recommendation #{index} is invalid"))?;
        out.push(rec);
    }

    sort_by_priority(&mut out);
    Ok(out)
}

impl AdvisoryRecommendation {
    fn validate_and_into_recommendation(
        self,
        names: &HashMap<&str, &str>,
        seen_ids: &mut HashSet<String>,
    ) -> anyhow::Result<Recommendation> {
        let id = scalar_to_string(self.id.as_ref()).context("id must be a non-empty string or number")?;
        ensure!(seen_ids.insert(id.clone()), "duplicate recommendation id: {id}");

        let item_id =
            scalar_to_string(self.item_id.as_ref()).context("itemId must be a string or number")?;
        let known_name = names
            .get(item_id.as_str())
            .with_context(|| format!("itemId {item_id} is not in the snapshot"))?;

        let item_name = self
            .item_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| known_name.to_string());

        let kind_raw = self.kind.context("type is required")?;
        let kind = RecommendationType::parse(&kind_raw)
            .with_context(|| format!("unknown type: {kind_raw}"))?;

        let priority_raw = self.priority.context("priority is required")?;
        let priority = Priority::parse(&priority_raw)
            .with_context(|| format!("unknown priority: {priority_raw}"))?;

        let icon_raw = self.icon.context("icon is required")?;
        let icon = Icon::parse(&icon_raw).with_context(|| format!("unknown icon: {icon_raw}"))?;

        let message = self.message.unwrap_or_default().trim().to_string();
        ensure!(!message.is_empty(), "message must be non-empty");

        let detail = self.detail.unwrap_or_default().trim().to_string();

        let action_required = self.action_required.unwrap_or(matches!(
            kind,
            RecommendationType::Warning | RecommendationType::Danger
        ));

        Ok(Recommendation {
            id,
            item_id,
            item_name,
            kind,
            priority,
            message,
            detail,
            action_required,
            icon,
        })
    }
}

fn scalar_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
