// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Character-based token and cost estimation.

use promptlab_core::TokenUsage;

const CHARS_PER_TOKEN: usize = 4;

/// Estimated tokens for `text`: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    let tokens = chars.div_ceil(CHARS_PER_TOKEN);
    u32::try_from(tokens).unwrap_or(u32::MAX)
}

/// Usage for one exchange, estimated from the full prompt and the completion.
pub fn estimate_usage(full_prompt: &str, output: &str) -> TokenUsage {
    TokenUsage::new(estimate_tokens(full_prompt), estimate_tokens(output))
}

/// `total_tokens / 1000 * cost_per_1k`.
pub fn estimate_cost(usage: &TokenUsage, cost_per_1k: f64) -> f64 {
    f64::from(usage.total_tokens) / 1000.0 * cost_per_1k
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tokens_round_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn tokens_count_characters_not_bytes() {
        // Four multi-byte characters are one token.
        assert_eq!(estimate_tokens("→→→→"), 1);
    }

    #[test]
    fn usage_sums_both_sides() {
        let usage = estimate_usage("12345678", "123");
        assert_eq!(usage.prompt_tokens, 2);
        assert_eq!(usage.completion_tokens, 1);
        assert_eq!(usage.total_tokens, 3);
    }

    #[test]
    fn cost_formula() {
        let usage = TokenUsage::new(1500, 500);
        let cost = estimate_cost(&usage, 0.005);
        assert!((cost - 0.01).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn cost_strictly_monotonic_in_tokens(
            total in 0u32..1_000_000,
            extra in 1u32..10_000,
            rate in 0.0001f64..1.0,
        ) {
            let lower = estimate_cost(&TokenUsage::new(total, 0), rate);
            let higher = estimate_cost(&TokenUsage::new(total + extra, 0), rate);
            prop_assert!(higher > lower);
        }
    }
}
