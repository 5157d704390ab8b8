pub mod advisory;
pub mod domain;
pub mod error;
pub mod llm;
pub mod report;
pub mod rules;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;

    const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
    const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub gemini_base_url: String,
        pub gemini_model: String,
        pub gemini_timeout_secs: u64,
        pub sentry_dsn: Option<String>,
        pub port: u16,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gemini_api_key: non_empty_var("GEMINI_API_KEY"),
                gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                gemini_model: non_empty_var("GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                gemini_timeout_secs: parsed_var("GEMINI_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                port: parsed_var("PORT")?.unwrap_or(DEFAULT_PORT),
            })
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        pub fn advisory_enabled(&self) -> bool {
            self.gemini_api_key.is_some()
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed_var<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        non_empty_var(key)
            .map(|raw| raw.parse::<T>().with_context(|| format!("invalid {key}: {raw:?}")))
            .transpose()
    }
}
