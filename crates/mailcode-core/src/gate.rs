//! Keyword gate: a cheap veto run before any pattern matching.

/// Returns true if any keyword occurs in the lowercased text.
///
/// `keywords` must already be lowercase.
#[must_use]
pub fn looks_like_otp_email(keywords: &[String], text: &str) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::patterns::{PatternTables, lowercase_all};
    use proptest::prelude::*;

    fn keywords() -> Vec<String> {
        lowercase_all(&PatternTables::default().otp_keywords)
    }

    #[test]
    fn test_gate_is_case_insensitive() {
        assert!(looks_like_otp_email(&keywords(), "Your VERIFICATION Code"));
    }

    #[test]
    fn test_gate_rejects_plain_invoice() {
        assert!(!looks_like_otp_email(
            &keywords(),
            "Invoice #482913 due Please pay by 5/1/2024"
        ));
    }

    #[test]
    fn test_gate_empty_text() {
        assert!(!looks_like_otp_email(&keywords(), ""));
    }

    proptest! {
        #[test]
        fn prop_digits_and_punctuation_never_pass(text in "[0-9 ./:#-]{0,64}") {
            prop_assert!(!looks_like_otp_email(&keywords(), &text));
        }
    }
}
