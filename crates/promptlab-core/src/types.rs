// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Promptlab workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Current UTC time in the ISO 8601 millisecond format used by all stored records.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Auth,
}

// --- Auth types ---

/// A bearer token as presented by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(pub String);

impl AuthToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([redacted])")
    }
}

/// Claims decoded from a bearer token without verifying its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: i64,
    /// Expires-at, seconds since the Unix epoch.
    pub exp: i64,
}

/// A caller credential: bearer token, its decoded claims and an optional refresh token.
#[derive(Clone)]
pub struct Credential {
    pub token: AuthToken,
    pub claims: Claims,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("claims", &self.claims)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// An identity resolved by an auth adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens returned by a refresh exchange.
#[derive(Clone)]
pub struct RefreshedToken {
    pub access_token: AuthToken,
    pub refresh_token: Option<String>,
}

// --- Provider types ---

/// A single chat-style completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Model identifier, already validated against the model registry.
    pub model: String,
    /// Fully assembled prompt text, sent as one user message.
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// A completion returned by a provider, plus the cost inputs the caller needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub content: String,
    pub model: String,
    /// USD per 1000 tokens for `model`.
    pub cost_per_1k: f64,
}

/// Estimated token usage for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

// --- Prompt storage types ---

/// One stored version of a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    pub version_id: String,
    pub prompt_id: String,
    pub version_number: i64,
    pub title: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
}

// --- Test result types ---

/// Outcome of one model invocation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Completed,
    Failed,
}

/// Everything about an invocation that is known before the provider is called.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationContext {
    pub prompt_id: String,
    pub prompt_version_id: String,
    pub user_id: String,
    pub input_text: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub batch_id: Option<String>,
}

/// One persisted model invocation attempt.
///
/// Construct through [`TestResult::completed`] or [`TestResult::failed`] so that
/// `output_text` and `error_message` are always mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub prompt_id: String,
    pub prompt_version_id: String,
    pub user_id: String,
    pub input_text: String,
    pub output_text: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub response_time_ms: u64,
    pub cost_estimate: f64,
    pub token_usage: TokenUsage,
    pub status: TestStatus,
    pub error_message: Option<String>,
    pub batch_id: Option<String>,
    pub created_at: String,
}

impl TestResult {
    /// A successful invocation.
    pub fn completed(
        ctx: &InvocationContext,
        output: String,
        usage: TokenUsage,
        cost_estimate: f64,
        response_time_ms: u64,
    ) -> Self {
        Self::build(ctx, Some(output), None, usage, cost_estimate, response_time_ms)
    }

    /// A failed invocation. Usage and cost are zero because nothing was billed back.
    pub fn failed(ctx: &InvocationContext, error: String, response_time_ms: u64) -> Self {
        Self::build(
            ctx,
            None,
            Some(error),
            TokenUsage::default(),
            0.0,
            response_time_ms,
        )
    }

    fn build(
        ctx: &InvocationContext,
        output_text: Option<String>,
        error_message: Option<String>,
        token_usage: TokenUsage,
        cost_estimate: f64,
        response_time_ms: u64,
    ) -> Self {
        let status = if output_text.is_some() {
            TestStatus::Completed
        } else {
            TestStatus::Failed
        };
        Self {
            id: uuid_v4(),
            prompt_id: ctx.prompt_id.clone(),
            prompt_version_id: ctx.prompt_version_id.clone(),
            user_id: ctx.user_id.clone(),
            input_text: ctx.input_text.clone(),
            output_text,
            model: ctx.model.clone(),
            temperature: ctx.temperature,
            max_tokens: ctx.max_tokens,
            response_time_ms,
            cost_estimate,
            token_usage,
            status,
            error_message,
            batch_id: ctx.batch_id.clone(),
            created_at: now_timestamp(),
        }
    }
}

// --- Analysis types ---

/// Which engine produced an analysis record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Deterministic technique engine.
    Quick,
    /// Delegated model evaluation.
    Ai,
}

/// Verdict for one technique of the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueResult {
    pub technique_id: String,
    pub name: String,
    pub description: String,
    pub present: bool,
    /// Confidence in [0, 1].
    pub score: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Stored body of an analysis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub techniques: Vec<TechniqueResult>,
    pub overall_score: u32,
    pub summary: String,
}

impl AnalysisPayload {
    /// Number of techniques marked present.
    pub fn presence_count(&self) -> u32 {
        self.techniques.iter().filter(|t| t.present).count() as u32
    }
}

/// One stored analysis of a prompt's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub prompt_id: String,
    /// SHA-256 hex digest of the analyzed text.
    pub content_hash: String,
    pub analysis_type: AnalysisType,
    pub result: AnalysisPayload,
    pub created_at: String,
}

impl AnalysisRecord {
    pub fn new(
        prompt_id: String,
        content_hash: String,
        analysis_type: AnalysisType,
        result: AnalysisPayload,
    ) -> Self {
        Self {
            id: uuid_v4(),
            prompt_id,
            content_hash,
            analysis_type,
            result,
            created_at: now_timestamp(),
        }
    }
}

fn uuid_v4() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> InvocationContext {
        InvocationContext {
            prompt_id: "p1".into(),
            prompt_version_id: "v1".into(),
            user_id: "u1".into(),
            input_text: "hello".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 500,
            batch_id: Some("b1".into()),
        }
    }

    #[test]
    fn completed_result_has_output_and_no_error() {
        let r = TestResult::completed(&ctx(), "out".into(), TokenUsage::new(3, 4), 0.01, 12);
        assert_eq!(r.status, TestStatus::Completed);
        assert_eq!(r.output_text.as_deref(), Some("out"));
        assert!(r.error_message.is_none());
        assert_eq!(r.token_usage.total_tokens, 7);
        assert_eq!(r.batch_id.as_deref(), Some("b1"));
    }

    #[test]
    fn failed_result_has_error_and_no_output() {
        let r = TestResult::failed(&ctx(), "boom".into(), 40);
        assert_eq!(r.status, TestStatus::Failed);
        assert!(r.output_text.is_none());
        assert_eq!(r.error_message.as_deref(), Some("boom"));
        assert_eq!(r.response_time_ms, 40);
        assert_eq!(r.cost_estimate, 0.0);
    }

    #[test]
    fn status_and_analysis_type_round_trip_as_lowercase() {
        use std::str::FromStr;
        assert_eq!(TestStatus::Completed.to_string(), "completed");
        assert_eq!(TestStatus::from_str("failed").unwrap(), TestStatus::Failed);
        assert_eq!(AnalysisType::Ai.to_string(), "ai");
        assert_eq!(AnalysisType::from_str("quick").unwrap(), AnalysisType::Quick);
    }

    #[test]
    fn presence_count_ignores_absent_techniques() {
        let technique = |present| TechniqueResult {
            technique_id: "t".into(),
            name: "T".into(),
            description: String::new(),
            present,
            score: if present { 1.0 } else { 0.0 },
            suggestions: vec![],
            examples: vec![],
        };
        let payload = AnalysisPayload {
            techniques: vec![technique(true), technique(false), technique(true)],
            overall_score: 0,
            summary: String::new(),
        };
        assert_eq!(payload.presence_count(), 2);
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let cred = Credential {
            token: AuthToken("secret.jwt.value".into()),
            claims: Claims {
                sub: "u1".into(),
                iat: 0,
                exp: 10,
            },
            refresh_token: Some("refresh-secret".into()),
        };
        let debug = format!("{cred:?} {:?}", cred.token);
        assert!(!debug.contains("secret.jwt.value"));
        assert!(!debug.contains("refresh-secret"));
    }
}
