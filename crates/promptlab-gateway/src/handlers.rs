// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use promptlab_core::PromptlabError;
use promptlab_core::types::{Credential, PromptVersion};
use promptlab_dispatch::{BatchRequest, TestRequest};
use promptlab_scoring::record_quick_analysis;
use tracing::debug;

use crate::dto::{
    AnalysisResponse, AnalyzeBody, BatchTestBody, BatchTestResponse, HealthResponse,
    ModelListResponse, ResultListResponse, ResultsQuery, RunTestBody, RunTestResponse,
    ScoreResponse,
};
use crate::error::{ApiError, ApiJson};
use crate::server::GatewayState;

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn current_version(
    state: &GatewayState,
    prompt_id: &str,
) -> Result<PromptVersion, PromptlabError> {
    state
        .storage
        .get_current_version(prompt_id)
        .await?
        .ok_or_else(|| PromptlabError::NotFound(format!("prompt `{prompt_id}` has no versions")))
}

/// POST /v1/tests
///
/// Supersedes any single run still in flight for the same authenticated caller.
pub async fn post_test(
    State(state): State<GatewayState>,
    Extension(credential): Extension<Credential>,
    ApiJson(body): ApiJson<RunTestBody>,
) -> ApiResult<RunTestResponse> {
    let request: TestRequest = body.into();
    let outcome = state.single.run(&credential, &request, &state.scopes).await?;
    Ok(Json(outcome.into()))
}

/// POST /v1/tests/batch
pub async fn post_batch(
    State(state): State<GatewayState>,
    Extension(credential): Extension<Credential>,
    ApiJson(body): ApiJson<BatchTestBody>,
) -> ApiResult<BatchTestResponse> {
    let request: BatchRequest = body.into();
    let outcome = state.multi.run(&credential, &request).await?;
    Ok(Json(outcome.into()))
}

/// GET /v1/prompts/{id}/score
pub async fn get_score(
    State(state): State<GatewayState>,
    Extension(credential): Extension<Credential>,
    Path(prompt_id): Path<String>,
) -> ApiResult<ScoreResponse> {
    state.validator.validate(&credential).await?;
    let version = current_version(&state, &prompt_id).await?;
    let score = state.resolver.resolve(&prompt_id, &version.content).await?;
    Ok(Json(score.into()))
}

/// POST /v1/prompts/{id}/analysis
pub async fn post_quick_analysis(
    State(state): State<GatewayState>,
    Extension(credential): Extension<Credential>,
    Path(prompt_id): Path<String>,
) -> ApiResult<AnalysisResponse> {
    state.validator.validate(&credential).await?;
    let version = current_version(&state, &prompt_id).await?;
    let (analysis, record) =
        record_quick_analysis(state.storage.as_ref(), &state.engine, &prompt_id, &version.content)
            .await?;
    let mut response = AnalysisResponse::from(analysis);
    response.analysis_id = Some(record.id);
    response.content_hash = Some(record.content_hash);
    Ok(Json(response))
}

/// POST /v1/prompts/{id}/analysis/ai
pub async fn post_ai_analysis(
    State(state): State<GatewayState>,
    Extension(credential): Extension<Credential>,
    Path(prompt_id): Path<String>,
) -> ApiResult<AnalysisResponse> {
    state.validator.validate(&credential).await?;
    let version = current_version(&state, &prompt_id).await?;
    let record = state.analyzer.analyze(&prompt_id, &version.content).await?;
    let score = record.result.presence_count();
    Ok(Json(AnalysisResponse::from_payload(
        record.id,
        record.content_hash,
        score,
        record.result,
    )))
}

/// POST /v1/analyze
///
/// Stateless engine run on the posted text. Nothing is persisted.
pub async fn post_analyze(
    State(state): State<GatewayState>,
    ApiJson(body): ApiJson<AnalyzeBody>,
) -> ApiResult<AnalysisResponse> {
    Ok(Json(state.engine.analyze(&body.text).into()))
}

/// GET /v1/prompts/{id}/results
pub async fn get_prompt_results(
    State(state): State<GatewayState>,
    Extension(credential): Extension<Credential>,
    Path(prompt_id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> ApiResult<ResultListResponse> {
    state.validator.validate(&credential).await?;
    if let Some(limit) = query.limit {
        if limit < 1 {
            return Err(PromptlabError::Validation("limit must be at least 1".into()).into());
        }
    }
    let results = state
        .storage
        .list_results_for_prompt(&prompt_id, query.limit)
        .await?;
    debug!(prompt_id = %prompt_id, count = results.len(), "listed results");
    Ok(Json(ResultListResponse {
        success: true,
        results: results.into_iter().map(Into::into).collect(),
    }))
}

/// GET /v1/batches/{id}
pub async fn get_batch(
    State(state): State<GatewayState>,
    Extension(credential): Extension<Credential>,
    Path(batch_id): Path<String>,
) -> ApiResult<ResultListResponse> {
    state.validator.validate(&credential).await?;
    let results = state.storage.list_results_for_batch(&batch_id).await?;
    if results.is_empty() {
        return Err(PromptlabError::NotFound(format!("batch `{batch_id}` not found")).into());
    }
    Ok(Json(ResultListResponse {
        success: true,
        results: results.into_iter().map(Into::into).collect(),
    }))
}

/// GET /v1/models
pub async fn get_models() -> Json<ModelListResponse> {
    Json(ModelListResponse {
        success: true,
        models: promptlab_cost::registry::all()
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

/// GET /health
///
/// Unauthenticated liveness check.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
