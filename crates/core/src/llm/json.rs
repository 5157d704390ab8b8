use crate::domain::contract::{validate_and_into_recommendations, AdvisoryRecommendation};
use crate::domain::inventory::InventoryItem;
use crate::domain::recommendation::Recommendation;
use anyhow::Context;

/// Returns the span from the first `[` to the last `]`, after stripping a
/// Markdown fence if the text is wrapped in one.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let mut inner = text.trim();
    if inner.starts_with("```") {
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
    }

    let start = inner.find('[')?;
    let end = inner.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(inner[start..=end].trim())
}

pub fn parse_recommendations(
    text: &str,
    snapshot: &[InventoryItem],
) -> anyhow::Result<Vec<Recommendation>> {
    let json_str = extract_json_array(text).context("no JSON array found in advisory output")?;
    let parsed = serde_json::from_str::<Vec<AdvisoryRecommendation>>(json_str)
        .with_context(|| format!("advisory output is not a valid recommendation array: {json_str}"))?;
    validate_and_into_recommendations(parsed, snapshot)
}
