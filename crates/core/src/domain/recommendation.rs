use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub message: String,
    pub detail: String,
    pub action_required: bool,
    pub icon: Icon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Warning,
    Danger,
    Success,
    Info,
}

impl RecommendationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warning" => Some(Self::Warning),
            "danger" => Some(Self::Danger),
            "success" => Some(Self::Success),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Sort rank: high first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Icon {
    #[serde(rename = "alert")]
    Alert,
    #[serde(rename = "alert-triangle")]
    AlertTriangle,
    #[serde(rename = "chart-up")]
    ChartUp,
    #[serde(rename = "chart-down")]
    ChartDown,
    #[serde(rename = "clock")]
    Clock,
    #[serde(rename = "tag")]
    Tag,
    #[serde(rename = "users")]
    Users,
}

impl Icon {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alert" => Some(Self::Alert),
            "alert-triangle" => Some(Self::AlertTriangle),
            "chart-up" => Some(Self::ChartUp),
            "chart-down" => Some(Self::ChartDown),
            "clock" => Some(Self::Clock),
            "tag" => Some(Self::Tag),
            "users" => Some(Self::Users),
            _ => None,
        }
    }
}

/// Stable sort by priority rank; equal priorities keep emission order.
pub fn sort_by_priority(recommendations: &mut [Recommendation]) {
    recommendations.sort_by_key(|r| r.priority.rank());
}

/// Dashboard type filter. `None` keeps everything.
pub fn filter_by_type(
    recommendations: &[Recommendation],
    kind: Option<RecommendationType>,
) -> Vec<Recommendation> {
    recommendations
        .iter()
        .filter(|r| kind.map_or(true, |k| r.kind == k))
        .cloned()
        .collect()
}

pub fn dismiss(recommendations: &[Recommendation], dismissed_ids: &[String]) -> Vec<Recommendation> {
    let dismissed: HashSet<&str> = dismissed_ids.iter().map(String::as_str).collect();
    recommendations
        .iter()
        .filter(|r| !dismissed.contains(r.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn rec(id: &str, kind: RecommendationType, priority: Priority) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            item_id: "1".to_string(),
            item_name: "Widget".to_string(),
            kind,
            priority,
            message: format!("message {id}"),
            detail: format!("detail {id}"),
            action_required: false,
            icon: Icon::Alert,
        }
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let r = rec("restock-1", RecommendationType::Warning, Priority::High);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["itemId"], json!("1"));
        assert_eq!(v["type"], json!("warning"));
        assert_eq!(v["priority"], json!("high"));
        assert_eq!(v["actionRequired"], json!(false));
        assert_eq!(v["icon"], json!("alert"));
    }

    #[test]
    fn priority_sort_is_stable() {
        let mut recs = vec![
            rec("a", RecommendationType::Info, Priority::Low),
            rec("b", RecommendationType::Warning, Priority::High),
            rec("c", RecommendationType::Info, Priority::Medium),
            rec("d", RecommendationType::Danger, Priority::High),
            rec("e", RecommendationType::Info, Priority::Low),
        ];
        sort_by_priority(&mut recs);
        let ids: Vec<_> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "c", "a", "e"]);
    }

    #[test]
    fn filters_and_dismisses() {
        let recs = vec![
            rec("a", RecommendationType::Info, Priority::Low),
            rec("b", RecommendationType::Warning, Priority::High),
        ];
        let warnings = filter_by_type(&recs, Some(RecommendationType::Warning));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].id, "b");
        assert_eq!(filter_by_type(&recs, None).len(), 2);

        let kept = dismiss(&recs, &["b".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn parses_enum_names_case_insensitively() {
        assert_eq!(Icon::parse("Alert-Triangle"), Some(Icon::AlertTriangle));
        assert_eq!(Priority::parse(" HIGH "), Some(Priority::High));
        assert_eq!(RecommendationType::parse("bogus"), None);
    }
}
