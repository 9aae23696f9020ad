//! Per-call metrics and token estimation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Metrics collected across one extraction call's retry loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    /// Attempts consumed (successful calls report the winning attempt's
    /// number, exhausted calls the full budget).
    pub attempts: usize,
    /// Wall-clock time for the whole call.
    pub wall_time: Duration,
    /// Estimated tokens sent across all attempts (system + user prompts).
    pub estimated_prompt_tokens: usize,
    /// Estimated tokens received across all attempts.
    pub estimated_response_tokens: usize,
    /// Silent enumeration repairs: default-category substitutions and
    /// colon truncations. Zero means the shaped result is exactly what the
    /// model produced.
    pub coercions: usize,
}

/// Estimates a token count with the 4-characters-per-token heuristic.
///
/// Counts characters rather than bytes so multi-byte text is not
/// overestimated; rounds up so short text is not estimated at zero.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_round_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn estimates_count_characters_not_bytes() {
        // Four characters, twelve bytes.
        assert_eq!(estimate_tokens("日本語文"), 1);
    }
}
