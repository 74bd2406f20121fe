//! Token-usage estimation fallbacks.
//!
//! Exact usage from the backend is always preferred. When a backend reports
//! none, counts are approximated: book-style inputs with a known page count
//! use the average-tokens-per-page constant, everything else divides
//! character length by four, rounding up. Approximations, not exact.

use lectern_core::defaults::{AVG_TOKENS_PER_PAGE, EST_CHARS_PER_TOKEN};
use lectern_core::TokenUsage;

/// Estimate token count from character length (`ceil(chars / 4)`).
pub fn estimate_tokens(chars: usize) -> i64 {
    (chars as i64 + EST_CHARS_PER_TOKEN - 1) / EST_CHARS_PER_TOKEN
}

/// Estimate prompt-side tokens. A positive page count takes precedence over
/// the character heuristic.
pub fn estimate_prompt_tokens(page_count: Option<i32>, prompt_chars: usize) -> i64 {
    match page_count {
        Some(pages) if pages > 0 => pages as i64 * AVG_TOKENS_PER_PAGE,
        _ => estimate_tokens(prompt_chars),
    }
}

/// Use the backend's reported usage verbatim when present, otherwise
/// estimate both sides. Exact and estimated counts are never mixed within
/// one attempt.
pub fn usage_or_estimate(
    reported: Option<TokenUsage>,
    page_count: Option<i32>,
    prompt_chars: usize,
    output_chars: usize,
) -> TokenUsage {
    reported.unwrap_or_else(|| {
        TokenUsage::new(
            estimate_prompt_tokens(page_count, prompt_chars),
            estimate_tokens(output_chars),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(1), 1);
        assert_eq!(estimate_tokens(4), 1);
        assert_eq!(estimate_tokens(5), 2);
        assert_eq!(estimate_tokens(400), 100);
    }

    #[test]
    fn test_estimate_prompt_tokens_prefers_page_count() {
        assert_eq!(estimate_prompt_tokens(Some(10), 9999), 2580);
    }

    #[test]
    fn test_estimate_prompt_tokens_falls_back_to_chars() {
        assert_eq!(estimate_prompt_tokens(None, 400), 100);
        assert_eq!(estimate_prompt_tokens(Some(0), 400), 100);
        assert_eq!(estimate_prompt_tokens(Some(-3), 400), 100);
    }

    #[test]
    fn test_usage_or_estimate_uses_reported_verbatim() {
        let reported = TokenUsage::new(777, 111);
        let usage = usage_or_estimate(Some(reported), Some(10), 400, 400);
        assert_eq!(usage, reported);
    }

    #[test]
    fn test_usage_or_estimate_estimates_both_sides() {
        let usage = usage_or_estimate(None, Some(2), 9999, 401);
        assert_eq!(usage.prompt_tokens, 2 * 258);
        assert_eq!(usage.output_tokens, 101);
        assert_eq!(usage.total_tokens, 2 * 258 + 101);
    }
}
