//! Oracle response interpretation.
//!
//! The oracle replies with free text that usually wraps one JSON object
//! ("Sure! Here you go: {...} Let me know..."). Interpretation recovers
//! the first-`{`-to-last-`}` span, parses it, and digs out the
//! `prerequisites.<subject>` array. The result is an explicit outcome
//! type: payloads that parse but lack the expected keys are an empty
//! suggestion list, while output with no recoverable JSON is `Malformed`
//! and carries the raw text for logging.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One prerequisite suggestion as the oracle claims it.
///
/// Only `number` is ever trusted; identity comes from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedChapter {
    /// Claimed chapter number in the previous year's book
    #[serde(default)]
    pub number: Option<u32>,
    /// Claimed chapter name (often paraphrased; never trusted)
    #[serde(default)]
    pub chapter: String,
    /// Why the oracle considers it a prerequisite
    #[serde(default)]
    pub reason: String,
    /// The later-year chapter it supports
    #[serde(rename = "for", default)]
    pub prerequisite_for: Option<String>,
}

/// Outcome of interpreting one oracle response.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionOutcome {
    /// A prerequisites payload was recovered (possibly empty)
    Parsed(Vec<SuggestedChapter>),
    /// No JSON object could be recovered from the output
    Malformed { raw: String },
}

/// The first-`{`-to-last-`}` span of `raw`, if it has one.
pub fn extract_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Interpret a raw oracle response for one subject.
pub fn parse_suggestions(raw: &str, subject: &str) -> SuggestionOutcome {
    let Some(span) = extract_json_span(raw) else {
        return SuggestionOutcome::Malformed {
            raw: raw.to_string(),
        };
    };

    let payload: Value = match serde_json::from_str(span) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "Recovered span is not valid JSON");
            return SuggestionOutcome::Malformed {
                raw: raw.to_string(),
            };
        }
    };

    let entries = payload
        .get("prerequisites")
        .and_then(|p| p.get(subject))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let suggestions = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<SuggestedChapter>(entry) {
            Ok(suggestion) => Some(suggestion),
            Err(e) => {
                debug!(error = %e, "Skipping undecodable suggestion entry");
                None
            }
        })
        .collect();

    SuggestionOutcome::Parsed(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_extraction() {
        assert_eq!(extract_json_span("{\"a\": 1}"), Some("{\"a\": 1}"));
        assert_eq!(
            extract_json_span("prefix {\"a\": {\"b\": 2}} suffix"),
            Some("{\"a\": {\"b\": 2}}")
        );
        assert_eq!(extract_json_span("no braces here"), None);
        assert_eq!(extract_json_span("} reversed {"), None);
    }

    #[test]
    fn test_parse_tolerates_chatty_wrapper() {
        let raw = concat!(
            "Sure! Here you go: ",
            "{\"prerequisites\": {\"Maths\": [",
            "{\"number\": 2, \"chapter\": \"Polynomials\", ",
            "\"reason\": \"Factoring is reused\", \"for\": \"Quadratic Equations\"}",
            "]}} Thanks!"
        );

        let outcome = parse_suggestions(raw, "Maths");
        let SuggestionOutcome::Parsed(suggestions) = outcome else {
            panic!("expected parsed outcome");
        };
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].number, Some(2));
        assert_eq!(
            suggestions[0].prerequisite_for.as_deref(),
            Some("Quadratic Equations")
        );
    }

    #[test]
    fn test_parse_flags_unrecoverable_output() {
        let outcome = parse_suggestions("I am not sure about this one.", "Maths");
        assert_eq!(
            outcome,
            SuggestionOutcome::Malformed {
                raw: "I am not sure about this one.".to_string()
            }
        );
    }

    #[test]
    fn test_parse_flags_invalid_span() {
        let outcome = parse_suggestions("result: {not json at all}", "Maths");
        assert!(matches!(outcome, SuggestionOutcome::Malformed { .. }));
    }

    #[test]
    fn test_missing_keys_mean_zero_suggestions() {
        let raw = "{\"prerequisites\": {\"Science\": [{\"number\": 1}]}}";
        // Payload parses, but there is nothing under the queried subject.
        assert_eq!(
            parse_suggestions(raw, "Maths"),
            SuggestionOutcome::Parsed(Vec::new())
        );
        assert_eq!(
            parse_suggestions("{\"unexpected\": true}", "Maths"),
            SuggestionOutcome::Parsed(Vec::new())
        );
    }

    #[test]
    fn test_undecodable_entries_are_skipped() {
        let raw = "{\"prerequisites\": {\"Maths\": [\"oops\", {\"number\": 3}]}}";
        let SuggestionOutcome::Parsed(suggestions) = parse_suggestions(raw, "Maths") else {
            panic!("expected parsed outcome");
        };
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].number, Some(3));
        assert!(suggestions[0].chapter.is_empty());
    }
}
