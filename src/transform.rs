//! Text post-processing applied to generated prompts before display.
//!
//! These are plain string functions with no network or UI dependencies.

use crate::api::GenerationResponse;

pub const UNEXPECTED_ERROR: &str = "❌ Unexpected error";

/// Marker that starts the trailing review section some providers append
const REVIEW_MARKER: &str = "Review";

/// Pick the text to show for a generation response: prompt, then error, then a fallback.
/// Empty strings are treated as missing.
pub fn select_output(response: &GenerationResponse) -> String {
    response
        .prompt
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| response.error.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or(UNEXPECTED_ERROR)
        .to_string()
}

/// Drop everything from the first case-sensitive "Review" onward and trim the
/// trailing whitespace of what is left.
pub fn strip_review_section(text: &str) -> String {
    match text.find(REVIEW_MARKER) {
        Some(idx) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(prompt: Option<&str>, error: Option<&str>) -> GenerationResponse {
        GenerationResponse {
            prompt: prompt.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_select_output_prefers_prompt() {
        assert_eq!(select_output(&response(Some("p"), Some("e"))), "p");
    }

    #[test]
    fn test_select_output_error_verbatim() {
        let err = "Please provide a 'task'";
        assert_eq!(select_output(&response(None, Some(err))), err);
    }

    #[test]
    fn test_select_output_falls_back() {
        assert_eq!(select_output(&response(None, None)), UNEXPECTED_ERROR);
        assert_eq!(select_output(&response(Some(""), Some(""))), UNEXPECTED_ERROR);
    }

    #[test]
    fn test_strip_review_section() {
        let text = "A poem.\n\nReview and Optimization: ...";
        assert_eq!(strip_review_section(text), "A poem.");
    }

    #[test]
    fn test_strip_review_keeps_text_without_marker() {
        let text = "Nothing to see here.\n";
        assert_eq!(strip_review_section(text), text);
    }

    #[test]
    fn test_strip_review_is_case_sensitive() {
        let text = "Please review this. Then Review it again";
        assert_eq!(strip_review_section(text), "Please review this. Then");
    }

    #[test]
    fn test_strip_review_at_start_yields_empty() {
        assert_eq!(strip_review_section("Review everything"), "");
    }

    #[test]
    fn test_strip_review_matches_inside_words() {
        // "Reviewer" still starts with the marker
        assert_eq!(strip_review_section("Draft  Reviewer notes"), "Draft");
    }
}
