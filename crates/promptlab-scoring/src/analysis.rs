// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted analyses: deterministic "quick" runs and delegated AI runs.

use std::fmt::Write as _;
use std::sync::Arc;

use promptlab_core::types::{
    AnalysisPayload, AnalysisRecord, AnalysisType, ProviderRequest, TechniqueResult,
};
use promptlab_core::{PromptlabError, ProviderAdapter, StorageAdapter};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::engine::{PRESENCE_THRESHOLD, PromptAnalysis, TechniqueEngine};
use crate::hash::content_hash;
use crate::techniques::{TAXONOMY, Technique};

/// Run the engine over `text` and persist the result as a quick record.
pub async fn record_quick_analysis(
    storage: &dyn StorageAdapter,
    engine: &TechniqueEngine,
    prompt_id: &str,
    text: &str,
) -> Result<(PromptAnalysis, AnalysisRecord), PromptlabError> {
    let analysis = engine.analyze(text);
    let record = AnalysisRecord::new(
        prompt_id.to_string(),
        content_hash(text),
        AnalysisType::Quick,
        analysis.to_payload(),
    );
    storage.insert_analysis(&record).await?;
    info!(
        prompt_id,
        score = analysis.overall_score,
        color = %analysis.color_code,
        "quick analysis recorded"
    );
    Ok((analysis, record))
}

const EVALUATOR_PROMPT: &str = r#"You are a prompt-engineering reviewer. Evaluate the prompt below against each technique in this list:

{techniques}
For every technique decide whether the prompt clearly uses it. Respond with a single JSON object and nothing else, in this shape:
{"techniques": [{"id": "<technique id>", "present": true, "score": 0.0, "suggestions": ["..."], "examples": ["..."]}], "summary": "<one or two sentences>"}

"score" is your confidence from 0 to 1. "examples" quotes the prompt where the technique appears. "suggestions" says how to add or improve the technique.

Prompt to evaluate:
<prompt>
{prompt}
</prompt>"#;

#[derive(Debug, Deserialize)]
struct Verdict {
    #[serde(default)]
    techniques: Vec<TechniqueVerdict>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct TechniqueVerdict {
    id: String,
    #[serde(default)]
    present: Option<bool>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    examples: Vec<String>,
}

/// Delegates technique evaluation to a chat model.
pub struct AiAnalyzer {
    provider: Arc<dyn ProviderAdapter>,
    storage: Arc<dyn StorageAdapter>,
    model: String,
    max_tokens: u32,
}

impl AiAnalyzer {
    /// Fails with a validation error if `model` is not in the registry.
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        storage: Arc<dyn StorageAdapter>,
        model: &str,
        max_tokens: u32,
    ) -> Result<Self, PromptlabError> {
        promptlab_cost::lookup(model)?;
        Ok(Self {
            provider,
            storage,
            model: model.to_string(),
            max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Evaluate `text` and persist an `ai` record keyed by its content hash.
    pub async fn analyze(
        &self,
        prompt_id: &str,
        text: &str,
    ) -> Result<AnalysisRecord, PromptlabError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            prompt: build_evaluator_prompt(text),
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };
        let response = self.provider.complete(request).await?;
        let payload = parse_verdict(&response.content)?;

        let record = AnalysisRecord::new(
            prompt_id.to_string(),
            content_hash(text),
            AnalysisType::Ai,
            payload,
        );
        self.storage.insert_analysis(&record).await?;
        info!(
            prompt_id,
            model = %self.model,
            score = record.result.overall_score,
            "ai analysis recorded"
        );
        Ok(record)
    }
}

fn build_evaluator_prompt(text: &str) -> String {
    let mut listing = String::new();
    for technique in &TAXONOMY {
        let _ = writeln!(
            listing,
            "- {} ({}): {}",
            technique.id, technique.name, technique.description
        );
    }
    EVALUATOR_PROMPT
        .replace("{techniques}", &listing)
        .replace("{prompt}", text)
}

/// Parse the model's reply onto the full taxonomy.
///
/// Tolerates markdown code fences and surrounding prose. Techniques the model
/// omits are recorded as absent; unknown ids are ignored.
pub fn parse_verdict(response: &str) -> Result<AnalysisPayload, PromptlabError> {
    let trimmed = response.trim();
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    let json_str = match (start, end) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => {
            debug!(response, "evaluator reply has no JSON object");
            return Err(PromptlabError::provider(
                "analysis model returned no JSON object",
            ));
        }
    };

    let verdict: Verdict = serde_json::from_str(json_str).map_err(|e| {
        warn!(error = %e, "failed to parse evaluator reply");
        PromptlabError::Provider {
            message: format!("analysis model returned malformed JSON: {e}"),
            source: Some(Box::new(e)),
        }
    })?;

    let techniques: Vec<TechniqueResult> = TAXONOMY
        .iter()
        .map(|technique| {
            let found = verdict.techniques.iter().find(|v| v.id == technique.id);
            map_verdict(technique, found)
        })
        .collect();
    let overall_score = techniques.iter().filter(|t| t.present).count() as u32;

    Ok(AnalysisPayload {
        techniques,
        overall_score,
        summary: verdict.summary,
    })
}

fn map_verdict(technique: &Technique, verdict: Option<&TechniqueVerdict>) -> TechniqueResult {
    let (present, score, suggestions, examples) = match verdict {
        Some(v) => {
            let score = v
                .score
                .map(|s| s.clamp(0.0, 1.0))
                .unwrap_or(if v.present == Some(true) { 1.0 } else { 0.0 });
            let present = v.present.unwrap_or(score > PRESENCE_THRESHOLD);
            (present, score, v.suggestions.clone(), v.examples.clone())
        }
        None => (false, 0.0, Vec::new(), Vec::new()),
    };

    let suggestions = if !present && suggestions.is_empty() {
        technique.suggestions.iter().map(|s| s.to_string()).collect()
    } else {
        suggestions
    };

    TechniqueResult {
        technique_id: technique.id.to_string(),
        name: technique.name.to_string(),
        description: technique.description.to_string(),
        present,
        score,
        suggestions,
        examples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlab_storage::SqliteStorage;
    use promptlab_test_utils::{MockProvider, test_storage_config};
    use tempfile::TempDir;

    async fn storage(dir: &TempDir) -> Arc<SqliteStorage> {
        let storage = SqliteStorage::new(test_storage_config(dir.path()));
        storage.initialize().await.unwrap();
        Arc::new(storage)
    }

    #[test]
    fn parse_plain_json() {
        let reply = r#"{"techniques": [
            {"id": "role_assignment", "present": true, "score": 0.9, "examples": ["You are"]},
            {"id": "delimiters", "present": false, "score": 0.1}
        ], "summary": "Has a role."}"#;
        let payload = parse_verdict(reply).unwrap();
        assert_eq!(payload.techniques.len(), TAXONOMY.len());
        assert_eq!(payload.overall_score, 1);
        assert_eq!(payload.summary, "Has a role.");
        let role = &payload.techniques[0];
        assert!(role.present);
        assert_eq!(role.examples, vec!["You are".to_string()]);
    }

    #[test]
    fn parse_strips_code_fences() {
        let reply = "```json\n{\"techniques\": [{\"id\": \"step_by_step\", \"present\": true}], \"summary\": \"ok\"}\n```";
        let payload = parse_verdict(reply).unwrap();
        assert_eq!(payload.presence_count(), 1);
        let step = payload
            .techniques
            .iter()
            .find(|t| t.technique_id == "step_by_step")
            .unwrap();
        assert!((step.score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn omitted_techniques_are_absent_with_suggestions() {
        let payload = parse_verdict(r#"{"techniques": [], "summary": ""}"#).unwrap();
        assert_eq!(payload.overall_score, 0);
        assert!(payload.techniques.iter().all(|t| !t.present));
        assert!(payload.techniques.iter().all(|t| !t.suggestions.is_empty()));
    }

    #[test]
    fn unknown_ids_are_ignored_and_scores_clamped() {
        let reply = r#"{"techniques": [
            {"id": "telepathy", "present": true},
            {"id": "escape_hatch", "score": 7.5}
        ]}"#;
        let payload = parse_verdict(reply).unwrap();
        assert_eq!(payload.overall_score, 1);
        let hatch = payload
            .techniques
            .iter()
            .find(|t| t.technique_id == "escape_hatch")
            .unwrap();
        assert!(hatch.present);
        assert!((hatch.score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_json_reply_is_a_provider_error() {
        let err = parse_verdict("I think this prompt is great!").unwrap_err();
        assert!(matches!(err, PromptlabError::Provider { .. }));
        let err = parse_verdict("{not json}").unwrap_err();
        assert!(matches!(err, PromptlabError::Provider { .. }));
    }

    #[test]
    fn evaluator_prompt_lists_every_technique() {
        let prompt = build_evaluator_prompt("Summarize the text.");
        for technique in &TAXONOMY {
            assert!(prompt.contains(technique.id), "missing {}", technique.id);
        }
        assert!(prompt.contains("<prompt>\nSummarize the text.\n</prompt>"));
    }

    #[test]
    fn unknown_analysis_model_is_rejected() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(SqliteStorage::new(test_storage_config(dir.path())));
        let result = AiAnalyzer::new(Arc::new(MockProvider::new()), storage, "gpt-5-ultra", 2000);
        assert!(matches!(result, Err(PromptlabError::Validation(_))));
    }

    #[tokio::test]
    async fn quick_analysis_is_persisted_with_hash() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let text = "You are an expert reviewer. Step 1: read. Step 2: judge.";

        let (analysis, record) =
            record_quick_analysis(storage.as_ref(), &TechniqueEngine::new(), "p1", text)
                .await
                .unwrap();
        assert_eq!(record.analysis_type, AnalysisType::Quick);
        assert_eq!(record.content_hash, content_hash(text));
        assert_eq!(record.result.overall_score, analysis.overall_score);

        let stored = storage.list_analyses("p1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, record.id);
    }

    #[tokio::test]
    async fn ai_analysis_is_persisted_and_sent_at_zero_temperature() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let provider = Arc::new(MockProvider::new().reply(
            "gpt-4o-mini",
            r#"{"techniques": [{"id": "role_assignment", "present": true}, {"id": "output_format", "present": true}], "summary": "Two techniques."}"#,
        ));
        let analyzer =
            AiAnalyzer::new(provider.clone(), storage.clone(), "gpt-4o-mini", 2000).unwrap();

        let text = "You are a poet. Answer in JSON.";
        let record = analyzer.analyze("p1", text).await.unwrap();
        assert_eq!(record.analysis_type, AnalysisType::Ai);
        assert_eq!(record.content_hash, content_hash(text));
        assert_eq!(record.result.presence_count(), 2);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(requests[0].max_tokens, 2000);
        assert!(requests[0].prompt.contains(text));

        assert_eq!(storage.list_analyses("p1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_ai_analysis_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let provider = Arc::new(MockProvider::new().reply("gpt-4o-mini", "no verdict here"));
        let analyzer = AiAnalyzer::new(provider, storage.clone(), "gpt-4o-mini", 500).unwrap();

        assert!(analyzer.analyze("p1", "text").await.is_err());
        assert!(storage.list_analyses("p1").await.unwrap().is_empty());
    }
}
