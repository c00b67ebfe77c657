// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use promptlab_auth::SessionValidator;
use promptlab_core::{PromptlabError, StorageAdapter};
use promptlab_dispatch::{CancelRegistry, MultiTestDispatcher, SingleTestDispatcher};
use promptlab_scoring::{AiAnalyzer, ScoreResolver, TechniqueEngine};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::credential_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub single: Arc<SingleTestDispatcher>,
    pub multi: Arc<MultiTestDispatcher>,
    pub storage: Arc<dyn StorageAdapter>,
    pub validator: Arc<SessionValidator>,
    pub resolver: Arc<ScoreResolver>,
    pub analyzer: Arc<AiAnalyzer>,
    pub engine: TechniqueEngine,
    /// One cancellation scope per caller subject.
    pub scopes: Arc<CancelRegistry>,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Gateway bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// All routes. `/health` is public; everything else requires a bearer credential.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/tests", post(handlers::post_test))
        .route("/v1/tests/batch", post(handlers::post_batch))
        .route("/v1/prompts/{id}/score", get(handlers::get_score))
        .route("/v1/prompts/{id}/analysis", post(handlers::post_quick_analysis))
        .route("/v1/prompts/{id}/analysis/ai", post(handlers::post_ai_analysis))
        .route("/v1/prompts/{id}/results", get(handlers::get_prompt_results))
        .route("/v1/batches/{id}", get(handlers::get_batch))
        .route("/v1/analyze", post(handlers::post_analyze))
        .route("/v1/models", get(handlers::get_models))
        .route_layer(axum_middleware::from_fn(credential_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until `shutdown` is cancelled.
///
/// In-flight single runs are cancelled when shutdown begins; their failed
/// rows are still written before the connections drain.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), PromptlabError> {
    let scopes = state.scopes.clone();
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PromptlabError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("gateway shutting down");
            scopes.cancel_all();
        })
        .await
        .map_err(|e| PromptlabError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use promptlab_core::types::{AnalysisType, TestStatus};
    use promptlab_scoring::content_hash;
    use promptlab_test_utils::{MockAuth, MockProvider, TestHarness, TokenBuilder};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn state_for(h: &TestHarness) -> GatewayState {
        GatewayState {
            single: h.single.clone(),
            multi: h.multi.clone(),
            storage: h.storage_dyn(),
            validator: h.validator.clone(),
            resolver: h.resolver.clone(),
            analyzer: h.analyzer.clone(),
            engine: TechniqueEngine::new(),
            scopes: Arc::new(CancelRegistry::new()),
            start_time: std::time::Instant::now(),
        }
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(bearer) = bearer {
            builder = builder.header("authorization", bearer);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_req(uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(bearer) = bearer {
            builder = builder.header("authorization", bearer);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let h = TestHarness::builder().build().await.unwrap();
        let (status, body) = call(build_router(state_for(&h)), get_req("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn missing_credential_is_authentication_failure_with_200() {
        let h = TestHarness::builder().build().await.unwrap();
        let (status, body) = call(
            build_router(state_for(&h)),
            post("/v1/tests", None, json!({"promptId": "p1", "testInput": "x", "modelName": "gpt-4o"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["errorType"], "authentication");
        assert_eq!(h.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn single_test_round_trip() {
        let h = TestHarness::builder()
            .with_provider(MockProvider::new().reply("gpt-4o-mini", "Bonjour"))
            .build()
            .await
            .unwrap();
        h.seed_prompt("p1", "Translate to French.").await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();

        let (_, body) = call(
            build_router(state_for(&h)),
            post(
                "/v1/tests",
                Some(&bearer),
                json!({"promptId": "p1", "testInput": "Hello", "modelName": "gpt-4o-mini", "temperature": 0.2}),
            ),
        )
        .await;
        assert_eq!(body["success"], true, "{body}");
        assert_eq!(body["output"], "Bonjour");
        assert_eq!(body["metadata"]["model"], "gpt-4o-mini");
        assert_eq!(body["metadata"]["version"], 1);
        assert!(body["metadata"]["tokensUsed"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn invalid_temperature_is_validation_failure() {
        let h = TestHarness::builder().build().await.unwrap();
        h.seed_prompt("p1", "Prompt").await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();
        let (_, body) = call(
            build_router(state_for(&h)),
            post(
                "/v1/tests",
                Some(&bearer),
                json!({"promptId": "p1", "testInput": "x", "modelName": "gpt-4o", "temperature": 5.0}),
            ),
        )
        .await;
        assert_eq!(body["errorType"], "validation");
        assert_eq!(h.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn undeserializable_bodies_are_validation_failures() {
        let h = TestHarness::builder().build().await.unwrap();
        h.seed_prompt("p1", "Prompt").await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();

        let cases = [
            ("/v1/tests", json!({"promptId": "p1", "testInput": "x"}), "modelName"),
            (
                "/v1/tests",
                json!({"promptId": "p1", "testInput": "x", "modelName": "gpt-4o", "maxTokens": -5}),
                "-5",
            ),
            (
                "/v1/tests",
                json!({"promptId": "p1", "testInput": "x", "modelName": "gpt-4o", "maxTokens": "lots"}),
                "lots",
            ),
            (
                "/v1/tests/batch",
                json!({"promptId": "p1", "testInput": "x", "modelNames": "gpt-4o"}),
                "modelNames",
            ),
        ];
        for (uri, payload, mention) in cases {
            let (status, body) =
                call(build_router(state_for(&h)), post(uri, Some(&bearer), payload)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], false);
            assert_eq!(body["errorType"], "validation");
            assert_eq!(body["errorCode"], "invalid_request");
            assert!(body["error"].as_str().unwrap().contains(mention), "{body}");
        }
        assert_eq!(h.provider.call_count(), 0);
        assert!(h.storage.list_results_for_prompt("p1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_validation_failure() {
        let h = TestHarness::builder().build().await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/analyze")
            .header("content-type", "application/json")
            .header("authorization", &bearer)
            .body(Body::from("{\"text\": "))
            .unwrap();
        let (status, body) = call(build_router(state_for(&h)), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errorType"], "validation");
    }

    #[tokio::test]
    async fn batch_reports_isolated_failure() {
        let h = TestHarness::builder()
            .with_provider(
                MockProvider::new()
                    .reply("gpt-4o", "a")
                    .fail("gpt-4o-mini", "API returned 503: unavailable")
                    .reply("claude-3-haiku", "c"),
            )
            .build()
            .await
            .unwrap();
        h.seed_prompt("p1", "Prompt").await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();

        let (_, body) = call(
            build_router(state_for(&h)),
            post(
                "/v1/tests/batch",
                Some(&bearer),
                json!({"promptId": "p1", "testInput": "x", "modelNames": ["gpt-4o", "gpt-4o-mini", "claude-3-haiku"]}),
            ),
        )
        .await;
        assert_eq!(body["totalTests"], 3);
        assert_eq!(body["successfulTests"], 2);
        assert_eq!(body["failedTests"], 1);
        assert_eq!(body["errors"][0]["model"], "gpt-4o-mini");

        let batch_id = body["batchId"].as_str().unwrap().to_string();
        let (_, history) = call(
            build_router(state_for(&h)),
            get_req(&format!("/v1/batches/{batch_id}"), Some(&bearer)),
        )
        .await;
        let rows = history["results"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().filter(|r| r["status"] == json!(TestStatus::Failed)).count(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_batch_is_database_failure() {
        let h = TestHarness::builder().build().await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();
        let (_, body) = call(
            build_router(state_for(&h)),
            get_req("/v1/batches/does-not-exist", Some(&bearer)),
        )
        .await;
        assert_eq!(body["errorType"], "database");
    }

    #[tokio::test]
    async fn quick_analysis_then_score_uses_quick_tier() {
        let h = TestHarness::builder().build().await.unwrap();
        h.seed_prompt("p1", "You are an expert reviewer. Step 1: read. Step 2: judge.")
            .await
            .unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();

        let (_, analysis) = call(
            build_router(state_for(&h)),
            post("/v1/prompts/p1/analysis", Some(&bearer), json!({})),
        )
        .await;
        assert_eq!(analysis["success"], true, "{analysis}");
        assert_eq!(analysis["techniques"].as_array().unwrap().len(), 11);

        let (_, score) = call(
            build_router(state_for(&h)),
            get_req("/v1/prompts/p1/score", Some(&bearer)),
        )
        .await;
        assert_eq!(score["source"], "quick");
        assert_eq!(score["score"], analysis["overallScore"]);
    }

    #[tokio::test]
    async fn ai_analysis_is_persisted_and_preferred() {
        let text = "Summarize the report.";
        let verdict = r#"```json
{"techniques": [{"id": "objective_statement", "present": true}, {"id": "output_format", "present": true}], "summary": "Clear goal."}
```"#;
        let h = TestHarness::builder()
            .with_provider(MockProvider::new().reply("gpt-4o-mini", verdict))
            .build()
            .await
            .unwrap();
        h.seed_prompt("p1", text).await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();

        let (_, analysis) = call(
            build_router(state_for(&h)),
            post("/v1/prompts/p1/analysis/ai", Some(&bearer), json!({})),
        )
        .await;
        assert_eq!(analysis["overallScore"], 2, "{analysis}");
        assert_eq!(analysis["contentHash"], content_hash(text));

        let (_, score) = call(
            build_router(state_for(&h)),
            get_req("/v1/prompts/p1/score", Some(&bearer)),
        )
        .await;
        assert_eq!(score["source"], "ai");
        assert_eq!(score["score"], 2);
        assert_eq!(score["summary"], "Clear goal.");

        let records = h.storage.list_analyses("p1").await.unwrap();
        assert_eq!(records[0].analysis_type, AnalysisType::Ai);
    }

    #[tokio::test]
    async fn stateless_analyze_persists_nothing() {
        let h = TestHarness::builder().build().await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();
        let (_, body) = call(
            build_router(state_for(&h)),
            post("/v1/analyze", Some(&bearer), json!({"text": "You are a chef."})),
        )
        .await;
        assert_eq!(body["success"], true);
        assert!(body.get("analysisId").is_none());
    }

    #[tokio::test]
    async fn score_requires_known_identity() {
        let h = TestHarness::builder()
            .with_auth(MockAuth::new().with_identity("intruder"))
            .build()
            .await
            .unwrap();
        h.seed_prompt("p1", "Prompt").await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();
        let (_, body) = call(
            build_router(state_for(&h)),
            get_req("/v1/prompts/p1/score", Some(&bearer)),
        )
        .await;
        assert_eq!(body["errorType"], "authentication");
        assert_eq!(body["errorCode"], "auth_mismatch");
    }

    #[tokio::test]
    async fn models_are_listed() {
        let h = TestHarness::builder().build().await.unwrap();
        let bearer = TokenBuilder::new("user-1").bearer();
        let (_, body) = call(build_router(state_for(&h)), get_req("/v1/models", Some(&bearer))).await;
        let ids: Vec<&str> = body["models"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"gpt-4o"));
        assert!(ids.contains(&"claude-3-haiku"));
    }
}
