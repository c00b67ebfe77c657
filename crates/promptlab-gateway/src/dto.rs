// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies. All field names are camelCase on the wire.

use promptlab_core::types::{AnalysisPayload, TechniqueResult, TestResult, TestStatus};
use promptlab_cost::ModelSpec;
use promptlab_dispatch::{BatchOutcome, BatchRequest, SingleTestOutcome, TestRequest};
use promptlab_scoring::{ColorCode, PromptAnalysis, ResolvedScore, ScoreSource};
use serde::{Deserialize, Serialize};

// --- Test dispatch ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTestBody {
    pub prompt_id: String,
    pub test_input: String,
    pub model_name: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl From<RunTestBody> for TestRequest {
    fn from(body: RunTestBody) -> Self {
        TestRequest {
            prompt_id: body.prompt_id,
            input: body.test_input,
            model: body.model_name,
            temperature: body.temperature,
            max_tokens: body.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub response_time: u64,
    pub tokens_used: u32,
    pub cost_estimate: f64,
    pub model: String,
    pub version: i64,
}

#[derive(Debug, Serialize)]
pub struct RunTestResponse {
    pub success: bool,
    pub output: String,
    pub metadata: RunMetadata,
}

impl From<SingleTestOutcome> for RunTestResponse {
    fn from(outcome: SingleTestOutcome) -> Self {
        let result = outcome.result;
        Self {
            success: true,
            output: result.output_text.unwrap_or_default(),
            metadata: RunMetadata {
                response_time: result.response_time_ms,
                tokens_used: result.token_usage.total_tokens,
                cost_estimate: result.cost_estimate,
                model: result.model,
                version: outcome.version_number,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTestBody {
    pub prompt_id: String,
    pub test_input: String,
    pub model_names: Vec<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl From<BatchTestBody> for BatchRequest {
    fn from(body: BatchTestBody) -> Self {
        BatchRequest {
            prompt_id: body.prompt_id,
            input: body.test_input,
            models: body.model_names,
            temperature: body.temperature,
            max_tokens: body.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResultItem {
    pub model_name: String,
    pub output_text: String,
    pub response_time: u64,
    pub cost_estimate: f64,
    pub tokens_used: u32,
}

#[derive(Debug, Serialize)]
pub struct BatchErrorItem {
    pub model: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_cost: f64,
    pub average_response_time: f64,
    pub total_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTestResponse {
    pub success: bool,
    pub batch_id: String,
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub results: Vec<BatchResultItem>,
    pub errors: Vec<BatchErrorItem>,
    pub metadata: BatchSummary,
}

impl From<BatchOutcome> for BatchTestResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let total_tests = outcome.total();
        let results = outcome
            .successes
            .into_iter()
            .map(|r| BatchResultItem {
                model_name: r.model,
                output_text: r.output_text.unwrap_or_default(),
                response_time: r.response_time_ms,
                cost_estimate: r.cost_estimate,
                tokens_used: r.token_usage.total_tokens,
            })
            .collect::<Vec<_>>();
        let errors = outcome
            .failures
            .into_iter()
            .map(|f| BatchErrorItem {
                model: f.model,
                error: f.error,
            })
            .collect::<Vec<_>>();
        Self {
            success: true,
            batch_id: outcome.batch_id,
            total_tests,
            successful_tests: results.len(),
            failed_tests: errors.len(),
            results,
            errors,
            metadata: BatchSummary {
                total_cost: outcome.metadata.total_cost,
                average_response_time: outcome.metadata.mean_response_time_ms,
                total_tokens: outcome.metadata.total_tokens,
            },
        }
    }
}

// --- Scoring ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub success: bool,
    pub score: u32,
    pub color_code: ColorCode,
    pub summary: String,
    pub source: ScoreSource,
}

impl From<ResolvedScore> for ScoreResponse {
    fn from(score: ResolvedScore) -> Self {
        Self {
            success: true,
            score: score.score,
            color_code: score.color_code,
            summary: score.summary,
            source: score.source,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueView {
    pub technique_id: String,
    pub name: String,
    pub description: String,
    pub present: bool,
    pub score: f64,
    pub suggestions: Vec<String>,
    pub examples: Vec<String>,
}

impl From<TechniqueResult> for TechniqueView {
    fn from(t: TechniqueResult) -> Self {
        Self {
            technique_id: t.technique_id,
            name: t.name,
            description: t.description,
            present: t.present,
            score: t.score,
            suggestions: t.suggestions,
            examples: t.examples,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub overall_score: u32,
    pub color_code: ColorCode,
    pub summary: String,
    pub techniques: Vec<TechniqueView>,
    pub suggestions: Vec<String>,
}

impl From<PromptAnalysis> for AnalysisResponse {
    fn from(analysis: PromptAnalysis) -> Self {
        Self {
            success: true,
            analysis_id: None,
            content_hash: None,
            overall_score: analysis.overall_score,
            color_code: analysis.color_code,
            summary: analysis.summary,
            techniques: analysis.techniques.into_iter().map(Into::into).collect(),
            suggestions: analysis.suggestions,
        }
    }
}

impl AnalysisResponse {
    /// View of a persisted payload. `score` is the tier-appropriate count.
    pub fn from_payload(id: String, hash: String, score: u32, payload: AnalysisPayload) -> Self {
        let suggestions = payload
            .techniques
            .iter()
            .filter(|t| !t.present)
            .flat_map(|t| t.suggestions.iter().cloned())
            .collect();
        Self {
            success: true,
            analysis_id: Some(id),
            content_hash: Some(hash),
            overall_score: score,
            color_code: ColorCode::for_score(score),
            summary: payload.summary,
            techniques: payload.techniques.into_iter().map(Into::into).collect(),
            suggestions,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    pub text: String,
}

// --- History ---

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultView {
    pub id: String,
    pub prompt_id: String,
    pub prompt_version_id: String,
    pub user_id: String,
    pub input_text: String,
    pub output_text: Option<String>,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub response_time: u64,
    pub cost_estimate: f64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub status: TestStatus,
    pub error_message: Option<String>,
    pub batch_id: Option<String>,
    pub created_at: String,
}

impl From<TestResult> for TestResultView {
    fn from(r: TestResult) -> Self {
        Self {
            id: r.id,
            prompt_id: r.prompt_id,
            prompt_version_id: r.prompt_version_id,
            user_id: r.user_id,
            input_text: r.input_text,
            output_text: r.output_text,
            model_name: r.model,
            temperature: r.temperature,
            max_tokens: r.max_tokens,
            response_time: r.response_time_ms,
            cost_estimate: r.cost_estimate,
            prompt_tokens: r.token_usage.prompt_tokens,
            completion_tokens: r.token_usage.completion_tokens,
            total_tokens: r.token_usage.total_tokens,
            status: r.status,
            error_message: r.error_message,
            batch_id: r.batch_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultListResponse {
    pub success: bool,
    pub results: Vec<TestResultView>,
}

// --- Registry and health ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelView {
    pub id: String,
    pub provider: &'static str,
    pub cost_per_1k: f64,
}

impl From<ModelSpec> for ModelView {
    fn from(spec: ModelSpec) -> Self {
        Self {
            id: spec.id.to_string(),
            provider: spec.provider,
            cost_per_1k: spec.cost_per_1k,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub success: bool,
    pub models: Vec<ModelView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}
