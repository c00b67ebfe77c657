// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed taxonomy of prompt-engineering techniques.
//!
//! Each technique is detected by regular-expression patterns (each pattern
//! contributes `min(matches / 2, 1)`) and lowercase keyword substrings (each
//! contributes `0.5` when present). The sum is capped at `max_possible`.

use std::sync::LazyLock;

use regex::Regex;

/// Static definition of one technique.
#[derive(Debug)]
pub struct Technique {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub patterns: &'static [&'static str],
    /// Matched against the lowercased text.
    pub keywords: &'static [&'static str],
    pub max_possible: f64,
    /// Offered when the technique is absent.
    pub suggestions: &'static [&'static str],
}

pub const TECHNIQUE_COUNT: usize = 11;

pub static TAXONOMY: [Technique; TECHNIQUE_COUNT] = [
    Technique {
        id: "role_assignment",
        name: "Role Assignment",
        description: "Gives the model a persona or expertise to adopt.",
        patterns: &[
            r"(?i)\byou are (?:an?|the)\s+\w+",
            r"(?i)\bact as\b",
            r"(?i)\b(?:as an?|in the role of)\s+(?:expert|senior|experienced|professional|specialist)\b",
        ],
        keywords: &["you are", "act as", "role", "persona", "expert"],
        max_possible: 2.0,
        suggestions: &["Open with a role, e.g. \"You are an experienced data analyst.\""],
    },
    Technique {
        id: "step_by_step",
        name: "Step-by-Step Structure",
        description: "Breaks the task into ordered steps.",
        patterns: &[
            r"(?i)\bstep\s*\d+",
            r"(?m)^\s*\d+[.)]\s+\S",
            r"(?i)\b(?:first|then|next|finally)\b",
        ],
        keywords: &["step by step", "step-by-step", "steps"],
        max_possible: 1.5,
        suggestions: &["Number the steps the model should follow (Step 1, Step 2, ...)."],
    },
    Technique {
        id: "explicit_constraints",
        name: "Explicit Constraints",
        description: "States hard requirements and limits on the answer.",
        patterns: &[
            r"(?i)\b(?:must|must not|do not|don't|never|always|only)\b",
            r"(?i)\b(?:no more than|at most|at least|maximum|minimum|limit)\b",
            r"(?i)\b\d+\s*(?:words|sentences|characters|bullet points|items|paragraphs)\b",
        ],
        keywords: &["constraint", "requirement", "do not", "must"],
        max_possible: 2.0,
        suggestions: &["State limits explicitly, e.g. \"Answer in at most 100 words.\""],
    },
    Technique {
        id: "few_shot_examples",
        name: "Few-Shot Examples",
        description: "Shows worked input/output examples.",
        patterns: &[
            r"(?i)\bexamples?\s*\d*\s*:",
            r"(?i)\b(?:input|question|q)\s*:[^\n]*\n\s*(?:output|answer|a)\s*:",
            r"(?i)\bfor (?:example|instance)\b",
            r"(?i)\binput\b[^\n]{0,40}(?:->|→|=>)",
        ],
        keywords: &["example", "e.g.", "for instance", "sample"],
        max_possible: 1.5,
        suggestions: &["Add one or two examples pairing an input with the expected output."],
    },
    Technique {
        id: "escape_hatch",
        name: "Escape Hatch",
        description: "Tells the model what to do when it cannot answer.",
        patterns: &[
            r"(?i)\bif you (?:are|'re) (?:not sure|unsure|uncertain)\b",
            r"(?i)\bif you (?:don't|do not) know\b",
            r#"(?i)\b(?:say|respond with|reply with|answer)\s+["']?(?:i don't know|unknown|n/a|not sure)"#,
            r"(?i)\bif (?:the )?(?:information|answer|question) is (?:not available|unavailable|unclear|ambiguous|missing)\b",
        ],
        keywords: &["i don't know", "not sure", "uncertain", "if unclear", "insufficient information"],
        max_possible: 1.5,
        suggestions: &["Say what to do when unsure, e.g. \"If the answer is not in the text, say 'I don't know'.\""],
    },
    Technique {
        id: "reasoning_trace",
        name: "Reasoning Trace",
        description: "Asks the model to think or explain its reasoning.",
        patterns: &[
            r"(?i)\bthink (?:step by step|through|carefully|aloud)\b",
            r"(?i)\b(?:explain|show|describe) your (?:reasoning|work|thinking|thought process)\b",
            r"(?i)\bchain[- ]of[- ]thought\b",
        ],
        keywords: &["reasoning", "think", "rationale", "justify"],
        max_possible: 1.5,
        suggestions: &["Ask the model to reason before answering, e.g. \"Think through the problem first.\""],
    },
    Technique {
        id: "validation_criteria",
        name: "Validation Criteria",
        description: "Defines how the answer should be checked.",
        patterns: &[
            r"(?i)\b(?:verify|validate|double[- ]check|check) (?:that|your|the|each|whether)\b",
            r"(?i)\b(?:success|acceptance|evaluation) criteria\b",
            r"(?i)\bbefore (?:answering|responding|submitting|finalizing)\b",
        ],
        keywords: &["verify", "validate", "criteria", "checklist"],
        max_possible: 1.5,
        suggestions: &["List criteria the answer must satisfy and ask the model to check them."],
    },
    Technique {
        id: "output_format",
        name: "Output Format",
        description: "Specifies the structure of the response.",
        patterns: &[
            r"(?i)\b(?:format|respond|output|return|answer)\b[^.\n]{0,40}\b(?:json|markdown|table|list|bullets?|csv|xml|yaml)\b",
            r"(?i)\b(?:in|as) (?:a |an )?(?:json|markdown|table|numbered list|bulleted list|bullet points)\b",
            r"```",
        ],
        keywords: &["format", "json", "bullet", "table", "heading"],
        max_possible: 2.0,
        suggestions: &["Describe the exact output shape, e.g. \"Return a JSON object with keys ...\"."],
    },
    Technique {
        id: "context_grounding",
        name: "Context Grounding",
        description: "Anchors the answer to supplied material.",
        patterns: &[
            r"(?i)\b(?:based on|using only|according to|refer to) (?:the )?(?:provided|given|following|above|below|attached)\b",
            r"(?i)\b(?:context|background|document|passage)\s*:",
            r"(?i)\bgiven the following\b",
        ],
        keywords: &["context", "background", "provided", "based on"],
        max_possible: 1.5,
        suggestions: &["Supply background and say to answer only from it."],
    },
    Technique {
        id: "delimiters",
        name: "Delimiters",
        description: "Separates instructions from data with clear markers.",
        patterns: &[
            r"(?m)^#{1,6}\s+\S",
            r#""""|'''|```"#,
            r"</?[A-Za-z_][\w-]*>",
            r"(?m)^\s*-{3,}\s*$",
        ],
        keywords: &["###", "\"\"\"", "---", "delimit"],
        max_possible: 1.5,
        suggestions: &["Wrap inputs in delimiters such as ### or <input></input> tags."],
    },
    Technique {
        id: "objective_statement",
        name: "Objective Statement",
        description: "States the goal of the task plainly.",
        patterns: &[
            r"(?i)\byour (?:task|goal|objective|job|mission) is\b",
            r"(?i)\b(?:the )?(?:goal|objective|purpose) (?:is|of this)\b",
            r"(?im)^\s*(?:task|goal|objective)\s*:",
        ],
        keywords: &["goal", "objective", "task", "purpose"],
        max_possible: 1.5,
        suggestions: &["State the objective in one sentence, e.g. \"Your task is to ...\"."],
    },
];

/// Compiled patterns, index-aligned with [`TAXONOMY`].
pub(crate) static COMPILED: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    TAXONOMY
        .iter()
        .map(|t| {
            t.patterns
                .iter()
                .map(|p| Regex::new(p).expect("technique patterns are valid regexes"))
                .collect()
        })
        .collect()
});

/// Looks up a technique by id.
pub fn find(id: &str) -> Option<&'static Technique> {
    TAXONOMY.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_patterns_compile() {
        assert_eq!(COMPILED.len(), TECHNIQUE_COUNT);
        for (compiled, technique) in COMPILED.iter().zip(TAXONOMY.iter()) {
            assert_eq!(compiled.len(), technique.patterns.len(), "{}", technique.id);
        }
    }

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = TAXONOMY.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), TECHNIQUE_COUNT);
    }

    #[test]
    fn keywords_are_lowercase() {
        for t in &TAXONOMY {
            for k in t.keywords {
                assert_eq!(*k, k.to_lowercase(), "{}", t.id);
            }
        }
    }

    #[test]
    fn every_technique_can_be_present() {
        // A single technique must be reachable past the 0.5 threshold.
        for t in &TAXONOMY {
            let reachable = t.patterns.len() as f64 + 0.5 * t.keywords.len() as f64;
            assert!(reachable.min(t.max_possible) / t.max_possible > 0.5, "{}", t.id);
        }
    }

    #[test]
    fn find_by_id() {
        assert_eq!(find("delimiters").map(|t| t.name), Some("Delimiters"));
        assert!(find("unknown").is_none());
    }
}
