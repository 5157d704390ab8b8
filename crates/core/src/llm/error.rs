use crate::llm::Provider;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single advisory call, with whatever raw output was available
/// for diagnostics.
#[derive(Debug, Clone, Error)]
#[error("advisory error (provider={provider}, stage={stage}): {detail}")]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}
