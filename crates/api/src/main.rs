use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwise_core::advisory::{AdvisoryAdapter, AdvisoryOutcome, RecommendationSource};
use stockwise_core::config::Settings;
use stockwise_core::domain::inventory::{parse_snapshot, InventoryItem};
use stockwise_core::domain::recommendation::{
    dismiss, filter_by_type, Recommendation, RecommendationType,
};
use stockwise_core::error::ValidationError;
use stockwise_core::llm::gemini::GeminiClient;
use stockwise_core::report::{build_report, html::render_html, Report};
use stockwise_core::rules::{RuleEvaluator, RuleThresholds};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let evaluator = RuleEvaluator::new(RuleThresholds::from_env()?)?;
    let advisory = if settings.advisory_enabled() {
        match GeminiClient::from_settings(&settings) {
            Ok(client) => Some(AdvisoryAdapter::new(Arc::new(client), evaluator.clone())),
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "advisory client init failed; serving rule-based output only");
                None
            }
        }
    } else {
        tracing::info!("GEMINI_API_KEY not set; advisory path disabled");
        None
    };

    let app = router(AppState {
        advisory,
        evaluator,
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/recommendations", post(post_recommendations))
        .route("/report", post(post_report))
        .route("/report/html", post(post_report_html))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    advisory: Option<AdvisoryAdapter>,
    evaluator: RuleEvaluator,
}

type ApiError = (StatusCode, String);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SourceParam {
    #[default]
    Rules,
    Advisory,
}

#[derive(Debug, Deserialize)]
struct RecommendationsQuery {
    #[serde(default)]
    source: SourceParam,
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn post_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
    Json(body): Json<Value>,
) -> Result<Json<AdvisoryOutcome>, ApiError> {
    let kind = parse_type_filter(query.kind.as_deref())?;
    let items = parse_snapshot(&body).map_err(unprocessable)?;

    let outcome = match (query.source, &state.advisory) {
        (SourceParam::Advisory, Some(adapter)) => {
            adapter.generate(&items, std::future::pending()).await
        }
        (SourceParam::Advisory, None) => {
            tracing::warn!("advisory requested but not configured; using rule-based output");
            rules_outcome(&state, &items)
        }
        (SourceParam::Rules, _) => rules_outcome(&state, &items),
    };

    Ok(Json(AdvisoryOutcome {
        source: outcome.source,
        recommendations: filter_by_type(&outcome.recommendations, kind),
    }))
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    items: Value,
    recommendations: Option<Vec<Recommendation>>,
    #[serde(default)]
    dismissed: Vec<String>,
}

async fn post_report(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<Report>, ApiError> {
    report_for(&state, req).map(Json)
}

async fn post_report_html(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Html<String>, ApiError> {
    let report = report_for(&state, req)?;
    Ok(Html(render_html(&report)))
}

fn report_for(state: &AppState, req: ReportRequest) -> Result<Report, ApiError> {
    let items = parse_snapshot(&req.items).map_err(unprocessable)?;
    let recommendations = req
        .recommendations
        .unwrap_or_else(|| state.evaluator.evaluate(&items));
    let recommendations = dismiss(&recommendations, &req.dismissed);
    Ok(build_report(&items, &recommendations))
}

fn rules_outcome(state: &AppState, items: &[InventoryItem]) -> AdvisoryOutcome {
    AdvisoryOutcome {
        source: RecommendationSource::Rules,
        recommendations: state.evaluator.evaluate(items),
    }
}

/// `all` and an absent parameter both mean no filter.
fn parse_type_filter(raw: Option<&str>) -> Result<Option<RecommendationType>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => RecommendationType::parse(s).map(Some).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("unknown recommendation type {s:?}"),
            )
        }),
    }
}

fn unprocessable(err: ValidationError) -> ApiError {
    tracing::info!(error = %err, "rejected inventory snapshot");
    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState {
            advisory: None,
            evaluator: RuleEvaluator::default(),
        })
    }

    /// Two suppliers per category keeps the random supplier nudge out of play.
    fn snapshot() -> Value {
        json!([
            {"id": 1, "item_name": "Hammer", "category": "Tools", "supplier": "Acme",
             "current_stock": 2, "reorder_level": 10, "avg_daily_sales": 1, "price": 20,
             "last_restocked_date": "2026-10-10"},
            {"id": 2, "item_name": "Wrench", "category": "Tools", "supplier": "Bolt Bros",
             "current_stock": 40, "reorder_level": 10, "avg_daily_sales": 1, "price": 15,
             "last_restocked_date": "2026-10-10"}
        ])
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let res = app()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn recommendations_default_to_rules() {
        let res = app().oneshot(post("/recommendations", snapshot())).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = json_body(res).await;
        assert_eq!(body["source"], "rules");
        assert_eq!(body["recommendations"][0]["id"], "restock-1");
        assert_eq!(body["recommendations"][0]["priority"], "high");
    }

    #[tokio::test]
    async fn unconfigured_advisory_falls_back_to_rules() {
        let res = app()
            .oneshot(post("/recommendations?source=advisory", snapshot()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["source"], "rules");
    }

    #[tokio::test]
    async fn type_filter_keeps_only_matching_recommendations() {
        let res = app()
            .oneshot(post("/recommendations?type=success", snapshot()))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert!(body["recommendations"].as_array().unwrap().is_empty());

        let res = app()
            .oneshot(post("/recommendations?type=bogus", snapshot()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_snapshot_is_unprocessable() {
        let mut items = snapshot();
        items[1]["price"] = json!("cheap");
        let res = app().oneshot(post("/recommendations", items)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let msg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(msg.contains("item 2"));
        assert!(msg.contains("price"));
    }

    #[tokio::test]
    async fn report_uses_supplied_recommendations_minus_dismissed() {
        let recs = json!([
            {"id": "keep", "itemId": "1", "itemName": "Hammer", "type": "warning",
             "priority": "high", "message": "m", "detail": "d", "actionRequired": true,
             "icon": "alert-triangle"},
            {"id": "drop", "itemId": "2", "itemName": "Wrench", "type": "info",
             "priority": "low", "message": "m", "detail": "d", "actionRequired": false,
             "icon": "tag"}
        ]);
        let res = app()
            .oneshot(post(
                "/report",
                json!({"items": snapshot(), "recommendations": recs, "dismissed": ["drop"]}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = json_body(res).await;
        assert_eq!(body["summary"]["totalItems"], 2);
        assert_eq!(body["summary"]["itemsBelowReorderLevel"], 1);
        assert_eq!(body["summary"]["criticalItems"], 1);
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 1);
        assert_eq!(body["recommendations"][0]["id"], "keep");
    }

    #[tokio::test]
    async fn html_report_renders_document() {
        let res = app()
            .oneshot(post("/report/html", json!({"items": snapshot()})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Hammer"));
    }
}
