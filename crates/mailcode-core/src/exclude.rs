//! Exclusion filter for numeric look-alikes.

use tracing::trace;

use crate::model::normalize;
use crate::patterns::CompiledExcludePattern;

/// Exclusion matches found in one text.
///
/// Built once per extraction so every candidate is checked against the same
/// set of matches.
#[derive(Debug, Clone, Default)]
pub(crate) struct Exclusions {
    /// Every exclusion match, uppercased, plus its normalized form when
    /// that differs (so `555-301-7788` also covers `555301`).
    matches: Vec<String>,
}

impl Exclusions {
    /// Collects the matches of every exclusion pattern in `text`.
    pub(crate) fn find(patterns: &[CompiledExcludePattern], text: &str) -> Self {
        let mut matches = Vec::new();
        for pattern in patterns {
            for m in pattern.regex.find_iter(text) {
                trace!(pattern = %pattern.name, matched = m.as_str(), "exclusion match");
                let upper = m.as_str().to_uppercase();
                let cleaned = normalize(&upper);
                if cleaned != upper {
                    matches.push(cleaned);
                }
                matches.push(upper);
            }
        }
        Self { matches }
    }

    /// Whether a cleaned code is excluded.
    pub(crate) fn excludes(&self, cleaned_code: &str) -> bool {
        if self.matches.iter().any(|m| m.contains(cleaned_code)) {
            return true;
        }
        is_all_digits(cleaned_code) && is_trivial_digit_run(cleaned_code)
    }
}

fn is_all_digits(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

/// Whether a digit string is one repeated digit or a consecutive run
/// (`000000`, `123456`, `654321`).
///
/// A single digit counts as a run.
#[must_use]
pub fn is_trivial_digit_run(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    let pairs = || bytes.windows(2);

    let repeated = pairs().all(|w| w[0] == w[1]);
    let ascending = pairs().all(|w| w[1] == w[0].wrapping_add(1));
    let descending = pairs().all(|w| w[1].wrapping_add(1) == w[0]);

    repeated || ascending || descending
}
