use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{Provider, TextGenerationClient};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?;
        Self::new(
            api_key,
            settings.gemini_base_url.as_str(),
            settings.gemini_model.as_str(),
            Duration::from_secs(settings.gemini_timeout_secs),
        )
    }

    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate_content(&self, req: GenerateContentRequest) -> anyhow::Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let res = self
            .http
            .post(self.url())
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(v) => v,
            Err(e) => {
                return Err(LlmDiagnosticsError {
                    provider: Provider::Gemini,
                    stage: "envelope",
                    detail: format!("response body is not JSON: {e}"),
                    raw_output: Some(text),
                    raw_response_json: None,
                }
                .into())
            }
        };

        let parsed = match serde_json::from_value::<GenerateContentResponse>(raw_json.clone()) {
            Ok(v) => v,
            Err(e) => {
                return Err(LlmDiagnosticsError {
                    provider: Provider::Gemini,
                    stage: "envelope",
                    detail: format!("failed to decode GenerateContentResponse: {e}"),
                    raw_output: Some(text),
                    raw_response_json: Some(raw_json),
                }
                .into())
            }
        };

        Self::response_text(&parsed).ok_or_else(|| {
            LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "envelope",
                detail: "response has no candidate text".to_string(),
                raw_output: Some(text),
                raw_response_json: Some(raw_json),
            }
            .into()
        })
    }

    /// Text of the first candidate's first part.
    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        res.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .clone()
    }
}

#[async_trait::async_trait]
impl TextGenerationClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let req = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };
        self.generate_content(req).await
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
