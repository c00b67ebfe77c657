// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt quality scoring for Promptlab.
//!
//! - [`engine::TechniqueEngine`] scores text against a fixed taxonomy of
//!   prompt-engineering techniques using patterns and keywords.
//! - [`analysis`] persists quick (deterministic) and AI (delegated) analyses.
//! - [`resolver::ScoreResolver`] picks the authoritative score for a prompt.

pub mod analysis;
pub mod engine;
pub mod hash;
pub mod resolver;
pub mod techniques;

pub use analysis::{AiAnalyzer, record_quick_analysis};
pub use engine::{ColorCode, PromptAnalysis, TechniqueEngine};
pub use hash::content_hash;
pub use resolver::{ResolvedScore, ScoreResolver, ScoreSource};
