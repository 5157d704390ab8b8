use std::fmt;

pub mod error;
pub mod gemini;
pub mod json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
        }
    }
}

/// External text-generation capability: free-text prompt in, free text out.
#[async_trait::async_trait]
pub trait TextGenerationClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;
}
