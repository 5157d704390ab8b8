//! Advisory path: delegate recommendation generation to an external
//! text-generation model, falling back to the rule engine on any failure.
//!
//! The adapter never returns an error. Transport failures, non-success
//! responses, malformed envelopes, missing or unparsable JSON, payloads that
//! fail validation, timeouts and cancellation all resolve to the rule-based
//! output for the same snapshot.

use crate::domain::inventory::InventoryItem;
use crate::domain::recommendation::Recommendation;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{json, TextGenerationClient};
use crate::rules::RuleEvaluator;
use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ADVISORY_TIMEOUT: Duration = Duration::from_secs(45);
const MIN_REQUESTED_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Advisory,
    Rules,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryOutcome {
    pub source: RecommendationSource,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Clone)]
pub struct AdvisoryAdapter {
    client: Arc<dyn TextGenerationClient>,
    evaluator: RuleEvaluator,
    timeout: Duration,
}

impl AdvisoryAdapter {
    pub fn new(client: Arc<dyn TextGenerationClient>, evaluator: RuleEvaluator) -> Self {
        Self {
            client,
            evaluator,
            timeout: DEFAULT_ADVISORY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn evaluate_via_advisory(&self, items: &[InventoryItem]) -> Vec<Recommendation> {
        self.generate(items, std::future::pending()).await.recommendations
    }

    /// Single advisory attempt, abandoned when `cancel` resolves or the
    /// configured timeout elapses.
    pub async fn generate<F>(&self, items: &[InventoryItem], cancel: F) -> AdvisoryOutcome
    where
        F: Future<Output = ()>,
    {
        if items.is_empty() {
            return empty_snapshot_outcome();
        }
        match self.try_advisory(items, cancel).await {
            Ok(recommendations) => self.advisory_outcome(recommendations),
            Err(err) => {
                self.log_fallback(&err);
                AdvisoryOutcome {
                    source: RecommendationSource::Rules,
                    recommendations: self.evaluator.evaluate(items),
                }
            }
        }
    }

    /// Like [`generate`](Self::generate), with the fallback pinned to `today` and `rng`.
    pub async fn generate_with<F, R>(
        &self,
        items: &[InventoryItem],
        cancel: F,
        today: NaiveDate,
        rng: &mut R,
    ) -> AdvisoryOutcome
    where
        F: Future<Output = ()>,
        R: Rng,
    {
        if items.is_empty() {
            return empty_snapshot_outcome();
        }
        match self.try_advisory(items, cancel).await {
            Ok(recommendations) => self.advisory_outcome(recommendations),
            Err(err) => {
                self.log_fallback(&err);
                AdvisoryOutcome {
                    source: RecommendationSource::Rules,
                    recommendations: self.evaluator.evaluate_with(items, today, rng),
                }
            }
        }
    }

    async fn try_advisory<F>(
        &self,
        items: &[InventoryItem],
        cancel: F,
    ) -> anyhow::Result<Vec<Recommendation>>
    where
        F: Future<Output = ()>,
    {
        let prompt = build_prompt(items)?;
        let t0 = std::time::Instant::now();
        let call = tokio::time::timeout(self.timeout, self.client.generate_text(&prompt));

        let text = tokio::select! {
            res = call => res.map_err(|_| anyhow!("advisory call timed out after {:?}", self.timeout))??,
            _ = cancel => bail!("advisory call cancelled by caller"),
        };

        tracing::debug!(
            provider = %self.client.provider(),
            elapsed_ms = t0.elapsed().as_millis(),
            response_len = text.len(),
            "advisory response received"
        );

        json::parse_recommendations(&text, items)
    }

    fn advisory_outcome(&self, recommendations: Vec<Recommendation>) -> AdvisoryOutcome {
        tracing::info!(
            provider = %self.client.provider(),
            recommendations = recommendations.len(),
            "using advisory recommendations"
        );
        AdvisoryOutcome {
            source: RecommendationSource::Advisory,
            recommendations,
        }
    }

    fn log_fallback(&self, err: &anyhow::Error) {
        let stage = err
            .downcast_ref::<LlmDiagnosticsError>()
            .map(|d| d.stage)
            .unwrap_or("adapter");
        tracing::warn!(
            provider = %self.client.provider(),
            stage,
            error = %format!("{err:#}"),
            "advisory recommendations unavailable; falling back to rule-based output"
        );
    }
}

/// Rules produce nothing for an empty snapshot, so there is nothing to ask for.
fn empty_snapshot_outcome() -> AdvisoryOutcome {
    tracing::debug!("snapshot is empty; skipping advisory call");
    AdvisoryOutcome {
        source: RecommendationSource::Rules,
        recommendations: Vec::new(),
    }
}

pub fn build_prompt(items: &[InventoryItem]) -> anyhow::Result<String> {
    let snapshot = serde_json::to_string_pretty(items).context("failed to serialize snapshot")?;
    Ok(format!(
        "Analyze this inventory data and provide inventory management recommendations:\n\
{snapshot}\n\n\
Provide at least {MIN_REQUESTED_RECOMMENDATIONS} specific, actionable recommendations as a JSON array of objects with these fields:\n\
- id: a unique identifier for the recommendation\n\
- itemId: the id of the item\n\
- itemName: the name of the item\n\
- type: one of [warning, info, success, danger]\n\
- priority: one of [high, medium, low]\n\
- message: a short recommendation message\n\
- detail: more detailed explanation\n\
- actionRequired: boolean indicating if action is needed\n\
- icon: suggested icon name (one of: alert, alert-triangle, chart-up, chart-down, clock, tag, users)"
    ))
}
