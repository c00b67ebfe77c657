// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authoritative score resolution over competing analysis records.
//!
//! Tiers are tried in order and the first that produces a score wins:
//! 1. the newest `ai` record whose content hash matches the current text;
//! 2. the newest `quick` record, whatever its hash;
//! 3. a live evaluation of the current text.

use std::sync::Arc;

use promptlab_core::types::{AnalysisRecord, AnalysisType};
use promptlab_core::{PromptlabError, StorageAdapter};
use serde::Serialize;
use strum::Display;
use tracing::debug;

use crate::engine::{ColorCode, TechniqueEngine};
use crate::hash::content_hash;

/// Which tier produced a resolved score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Ai,
    Quick,
    Live,
}

/// Normalized score shape shared by every tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedScore {
    pub score: u32,
    pub color_code: ColorCode,
    pub summary: String,
    pub source: ScoreSource,
}

/// Inputs every tier sees.
pub struct ScoreQuery<'a> {
    /// Newest first.
    pub records: &'a [AnalysisRecord],
    pub text: &'a str,
    pub hash: &'a str,
}

/// One step of the resolution chain.
pub trait ScoreTier: Send + Sync {
    fn source(&self) -> ScoreSource;

    fn resolve(&self, query: &ScoreQuery<'_>) -> Option<ResolvedScore>;
}

/// Trusts an AI verdict only for the exact text it analyzed.
pub struct AiAnalysisTier;

impl ScoreTier for AiAnalysisTier {
    fn source(&self) -> ScoreSource {
        ScoreSource::Ai
    }

    fn resolve(&self, query: &ScoreQuery<'_>) -> Option<ResolvedScore> {
        let record = query
            .records
            .iter()
            .find(|r| r.analysis_type == AnalysisType::Ai && r.content_hash == query.hash)?;
        let score = record.result.presence_count();
        Some(ResolvedScore {
            score,
            color_code: ColorCode::for_score(score),
            summary: record.result.summary.clone(),
            source: ScoreSource::Ai,
        })
    }
}

/// Uses the newest quick analysis even if the text has since changed.
pub struct QuickAnalysisTier;

impl ScoreTier for QuickAnalysisTier {
    fn source(&self) -> ScoreSource {
        ScoreSource::Quick
    }

    fn resolve(&self, query: &ScoreQuery<'_>) -> Option<ResolvedScore> {
        let record = query
            .records
            .iter()
            .find(|r| r.analysis_type == AnalysisType::Quick)?;
        let score = record.result.overall_score;
        Some(ResolvedScore {
            score,
            color_code: ColorCode::for_score(score),
            summary: record.result.summary.clone(),
            source: ScoreSource::Quick,
        })
    }
}

/// Scores the current text directly. Always produces a result.
pub struct LiveAnalysisTier {
    engine: TechniqueEngine,
}

impl LiveAnalysisTier {
    pub fn new(engine: TechniqueEngine) -> Self {
        Self { engine }
    }
}

impl ScoreTier for LiveAnalysisTier {
    fn source(&self) -> ScoreSource {
        ScoreSource::Live
    }

    fn resolve(&self, query: &ScoreQuery<'_>) -> Option<ResolvedScore> {
        let analysis = self.engine.analyze(query.text);
        Some(ResolvedScore {
            score: analysis.overall_score,
            color_code: analysis.color_code,
            summary: analysis.summary,
            source: ScoreSource::Live,
        })
    }
}

/// Ordered chain of tiers, first match wins.
pub struct ScoreResolver {
    storage: Arc<dyn StorageAdapter>,
    tiers: Vec<Box<dyn ScoreTier>>,
}

impl ScoreResolver {
    /// The standard AI → quick → live chain.
    pub fn new(storage: Arc<dyn StorageAdapter>, engine: TechniqueEngine) -> Self {
        Self::with_tiers(
            storage,
            vec![
                Box::new(AiAnalysisTier),
                Box::new(QuickAnalysisTier),
                Box::new(LiveAnalysisTier::new(engine)),
            ],
        )
    }

    pub fn with_tiers(storage: Arc<dyn StorageAdapter>, tiers: Vec<Box<dyn ScoreTier>>) -> Self {
        Self { storage, tiers }
    }

    /// Resolve the score for `prompt_id` given its current `text`.
    pub async fn resolve(&self, prompt_id: &str, text: &str) -> Result<ResolvedScore, PromptlabError> {
        let records = self.storage.list_analyses(prompt_id).await?;
        let resolved = resolve_records(&self.tiers, &records, text).ok_or_else(|| {
            PromptlabError::Internal("no scoring tier produced a result".to_string())
        })?;
        debug!(
            prompt_id,
            source = %resolved.source,
            score = resolved.score,
            records = records.len(),
            "score resolved"
        );
        Ok(resolved)
    }
}

/// Run `tiers` over already-loaded `records` (newest first).
pub fn resolve_records(
    tiers: &[Box<dyn ScoreTier>],
    records: &[AnalysisRecord],
    text: &str,
) -> Option<ResolvedScore> {
    let hash = content_hash(text);
    let query = ScoreQuery {
        records,
        text,
        hash: &hash,
    };
    tiers.iter().find_map(|tier| tier.resolve(&query))
}
