use thiserror::Error;

/// Rejection of an inventory snapshot or engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("snapshot is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("snapshot must be a JSON array of inventory items")]
    NotAnArray,

    #[error("item at index {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("item {item_id}: field `{field}` {reason}")]
    InvalidField {
        item_id: String,
        field: &'static str,
        reason: String,
    },

    #[error("duplicate item id {item_id}")]
    DuplicateId { item_id: String },

    #[error("invalid threshold `{name}`: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn field(
        item_id: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            item_id: item_id.into(),
            field,
            reason: reason.into(),
        }
    }
}
