//! Candidate extraction: every match of every code pattern, in table order.

use tracing::trace;

use crate::model::Candidate;
use crate::patterns::CompiledCodePattern;

/// Runs each pattern over the whole text and collects unscored candidates.
///
/// Candidates carry the index of the pattern that produced them as their
/// rank. Duplicates are kept; the ranker merges them.
pub(crate) fn extract_candidates(patterns: &[CompiledCodePattern], text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (rank, pattern) in patterns.iter().enumerate() {
        let group = usize::from(pattern.has_group());

        for caps in pattern.regex.captures_iter(text) {
            let Some(m) = caps.get(group) else {
                continue;
            };
            let candidate = Candidate::new(m.as_str(), rank);

            // A code needs at least one digit.
            if !candidate.has_digit() {
                continue;
            }
            if pattern.requires_letter_and_digit && !has_letter(&candidate.cleaned_code) {
                continue;
            }

            trace!(pattern = %pattern.name, rank, raw = %candidate.raw_match, "candidate");
            candidates.push(candidate);
        }
    }

    candidates
}

fn has_letter(code: &str) -> bool {
    code.bytes().any(|b| b.is_ascii_alphabetic())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::patterns::{PatternTables, compile_code_patterns};

    fn patterns() -> Vec<CompiledCodePattern> {
        compile_code_patterns(&PatternTables::default().code_patterns).unwrap()
    }

    fn codes(text: &str) -> Vec<(String, usize)> {
        extract_candidates(&patterns(), text)
            .into_iter()
            .map(|c| (c.cleaned_code, c.pattern_rank))
            .collect()
    }

    #[test]
    fn test_labeled_code_uses_capture_group() {
        let found = codes("Your code is: ab12cd");
        assert_eq!(found[0], ("AB12CD".to_string(), 0));
        assert_eq!(extract_candidates(&patterns(), "code: ab12cd")[0].raw_match, "ab12cd");
    }

    #[test]
    fn test_numeric_lengths_map_to_ranks() {
        assert!(codes("x 482913 x").contains(&("482913".to_string(), 1)));
        assert!(codes("x 4821 x").contains(&("4821".to_string(), 2)));
        assert!(codes("x 48291337 x").contains(&("48291337".to_string(), 3)));
        assert!(codes("x 48213 x").contains(&("48213".to_string(), 4)));
        assert!(codes("x 4821337 x").contains(&("4821337".to_string(), 5)));
    }

    #[test]
    fn test_alnum_requires_letter_and_digit() {
        assert!(codes("token A1B2C3 here").contains(&("A1B2C3".to_string(), 6)));
        assert!(!codes("letters ABCDEFG only").iter().any(|(_, r)| *r == 6));
    }

    #[test]
    fn test_separated_digits_are_normalized() {
        assert!(codes("use 482-913 now").contains(&("482913".to_string(), 7)));
        assert!(codes("use 482 913 now").contains(&("482913".to_string(), 8)));
    }

    #[test]
    fn test_letter_only_label_capture_dropped() {
        // "code is valid" captures "valid", which has no digit.
        assert!(codes("This code is valid for ten minutes").is_empty());
    }

    #[test]
    fn test_all_occurrences_kept() {
        let found = codes("482913 and again 482913");
        assert_eq!(found.iter().filter(|(c, _)| c == "482913").count(), 2);
    }

    #[test]
    fn test_empty_text() {
        assert!(codes("").is_empty());
    }
}
