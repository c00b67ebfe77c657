// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic technique scoring.
//!
//! Pure function of the input text: no clock, no randomness, no I/O.

use promptlab_core::types::{AnalysisPayload, TechniqueResult};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::techniques::{COMPILED, TAXONOMY, TECHNIQUE_COUNT, Technique};

/// A technique counts as present strictly above this score.
pub const PRESENCE_THRESHOLD: f64 = 0.5;

/// How many matched snippets are kept as evidence per technique.
const MAX_EXAMPLES: usize = 3;

/// Banding of the overall score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ColorCode {
    Green,
    Yellow,
    Orange,
    Red,
}

impl ColorCode {
    /// `>= 9` green, `>= 7` yellow, `>= 4` orange, otherwise red.
    pub fn for_score(score: u32) -> Self {
        match score {
            9.. => ColorCode::Green,
            7..=8 => ColorCode::Yellow,
            4..=6 => ColorCode::Orange,
            _ => ColorCode::Red,
        }
    }
}

/// Full result of one deterministic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAnalysis {
    /// Count of present techniques, `0..=11`.
    pub overall_score: u32,
    pub color_code: ColorCode,
    pub techniques: Vec<TechniqueResult>,
    pub summary: String,
    pub suggestions: Vec<String>,
}

impl PromptAnalysis {
    /// The persisted form of this analysis.
    pub fn to_payload(&self) -> AnalysisPayload {
        AnalysisPayload {
            techniques: self.techniques.clone(),
            overall_score: self.overall_score,
            summary: self.summary.clone(),
        }
    }
}

/// Technique scoring engine over the static taxonomy.
#[derive(Debug, Default, Clone, Copy)]
pub struct TechniqueEngine;

impl TechniqueEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> PromptAnalysis {
        let lower = text.to_lowercase();
        let techniques: Vec<TechniqueResult> = TAXONOMY
            .iter()
            .zip(COMPILED.iter())
            .map(|(technique, patterns)| score_technique(technique, patterns, text, &lower))
            .collect();

        let overall_score = techniques.iter().filter(|t| t.present).count() as u32;
        let color_code = ColorCode::for_score(overall_score);
        let suggestions = techniques
            .iter()
            .filter(|t| !t.present)
            .flat_map(|t| t.suggestions.iter().cloned())
            .collect();
        let summary = summarize(&techniques, overall_score, color_code);

        PromptAnalysis {
            overall_score,
            color_code,
            techniques,
            summary,
            suggestions,
        }
    }
}

fn score_technique(
    technique: &Technique,
    patterns: &[regex::Regex],
    text: &str,
    lower: &str,
) -> TechniqueResult {
    let mut raw = 0.0;
    let mut examples = Vec::new();

    for pattern in patterns {
        let mut count = 0usize;
        for m in pattern.find_iter(text) {
            count += 1;
            if examples.len() < MAX_EXAMPLES {
                examples.push(m.as_str().trim().to_string());
            }
        }
        raw += (count as f64 / 2.0).min(1.0);
    }

    raw += technique
        .keywords
        .iter()
        .filter(|k| lower.contains(*k))
        .count() as f64
        * 0.5;

    let score = (raw.min(technique.max_possible) / technique.max_possible).clamp(0.0, 1.0);
    let present = score > PRESENCE_THRESHOLD;

    TechniqueResult {
        technique_id: technique.id.to_string(),
        name: technique.name.to_string(),
        description: technique.description.to_string(),
        present,
        score,
        suggestions: if present {
            Vec::new()
        } else {
            technique.suggestions.iter().map(|s| s.to_string()).collect()
        },
        examples,
    }
}

fn summarize(techniques: &[TechniqueResult], score: u32, color: ColorCode) -> String {
    if score == 0 {
        return format!("No prompt-engineering techniques detected ({color}).");
    }
    let names: Vec<&str> = techniques
        .iter()
        .filter(|t| t.present)
        .map(|t| t.name.as_str())
        .collect();
    format!(
        "{score} of {TECHNIQUE_COUNT} techniques present ({color}): {}.",
        names.join(", ")
    )
}
