//! The extractor: compiled pattern tables plus the pipeline that uses them.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::candidate;
use crate::context::{ContextIndex, ContextKeywords};
use crate::error::Result;
use crate::exclude::Exclusions;
use crate::gate;
use crate::model::{Candidate, CodeMatch, ContextScore, EmailMessage};
use crate::patterns::{
    CompiledCodePattern, CompiledExcludePattern, PatternTables, compile_code_patterns,
    compile_exclude_patterns, lowercase_all,
};
use crate::rank::{self, Ranking};

/// Stateless verification-code extractor.
///
/// Holds compiled, read-only tables. Every method takes `&self` and touches
/// nothing but its arguments, so one extractor can serve any number of
/// threads.
#[derive(Debug, Clone)]
pub struct Extractor {
    otp_keywords: Vec<String>,
    strong_keywords: Vec<String>,
    weak_keywords: Vec<String>,
    code_patterns: Vec<CompiledCodePattern>,
    exclude_patterns: Vec<CompiledExcludePattern>,
    context_window: usize,
    accept_min_score: u32,
}

impl Extractor {
    /// Compiles the given tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile or the code pattern
    /// list is empty.
    pub fn new(tables: &PatternTables) -> Result<Self> {
        Ok(Self {
            otp_keywords: lowercase_all(&tables.otp_keywords),
            strong_keywords: lowercase_all(&tables.strong_context_keywords),
            weak_keywords: lowercase_all(&tables.weak_context_keywords),
            code_patterns: compile_code_patterns(&tables.code_patterns)?,
            exclude_patterns: compile_exclude_patterns(&tables.exclude_patterns)?,
            context_window: tables.context_window,
            accept_min_score: tables.accept_min_score,
        })
    }

    /// Compiles the built-in tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn with_default_tables() -> Result<Self> {
        Self::new(&PatternTables::default())
    }

    /// Returns the accepted verification code in `message`, or `None` to abstain.
    #[must_use]
    pub fn extract(&self, message: &EmailMessage) -> Option<CodeMatch> {
        self.rank(message).into_accepted()
    }

    /// Runs the whole pipeline and keeps every ranked candidate.
    #[must_use]
    pub fn rank(&self, message: &EmailMessage) -> Ranking {
        let text = message.text();

        if !self.looks_like_otp_email(&text) {
            debug!(id = %message.id, "no verification keywords, skipping");
            return Ranking::gate_closed();
        }

        let exclusions = Exclusions::find(&self.exclude_patterns, &text);
        let mut excluded: HashMap<String, bool> = HashMap::new();
        let candidates: Vec<Candidate> = self
            .extract_candidates(&text)
            .into_iter()
            .filter(|c| {
                let is_excluded = *excluded
                    .entry(c.cleaned_code.clone())
                    .or_insert_with(|| exclusions.excludes(&c.cleaned_code));
                if is_excluded {
                    trace!(code = %c.cleaned_code, "excluded");
                }
                !is_excluded
            })
            .collect();

        // Context depends only on the raw text of a candidate, so each
        // distinct one is scored once.
        let lower = text.to_lowercase();
        let mut needles: Vec<String> = Vec::new();
        let mut needle_index: HashMap<String, usize> = HashMap::new();
        for c in &candidates {
            let needle = c.raw_match.to_lowercase();
            if !needle_index.contains_key(&needle) {
                needle_index.insert(needle.clone(), needles.len());
                needles.push(needle);
            }
        }
        let contexts = ContextIndex::new(&lower, &self.context_keywords()).score_all(&needles);

        let subject_lower = message.subject.to_lowercase();
        let labeled = self
            .code_patterns
            .first()
            .map(|label| rank::labeled_codes(label, &text))
            .unwrap_or_default();

        let scored = candidates.into_iter().map(|mut c| {
            c.context_score = needle_index
                .get(&c.raw_match.to_lowercase())
                .map_or(ContextScore::None, |&i| contexts[i]);
            c.total_score = rank::total_score(&c, &subject_lower, &labeled);
            trace!(
                code = %c.cleaned_code,
                rank = c.pattern_rank,
                context = ?c.context_score,
                score = c.total_score,
                "scored"
            );
            c
        });

        let ranking = Ranking::from_scored(scored, self.accept_min_score);

        match (ranking.accepted(), ranking.best()) {
            (Some(code), Some(best)) => {
                debug!(id = %message.id, code = %code.code, score = best.total_score, "accepted");
            }
            (None, Some(best)) => {
                debug!(id = %message.id, code = %best.cleaned_code, score = best.total_score, "best candidate below threshold");
            }
            _ => debug!(id = %message.id, "no candidates"),
        }

        ranking
    }

    /// Whether the text mentions a one-time code at all.
    #[must_use]
    pub fn looks_like_otp_email(&self, text: &str) -> bool {
        gate::looks_like_otp_email(&self.otp_keywords, text)
    }

    /// All unscored candidates in `text`, in pattern order.
    #[must_use]
    pub fn extract_candidates(&self, text: &str) -> Vec<Candidate> {
        candidate::extract_candidates(&self.code_patterns, text)
    }

    /// Whether a cleaned code is a known look-alike in `text`.
    #[must_use]
    pub fn is_excluded(&self, text: &str, cleaned_code: &str) -> bool {
        Exclusions::find(&self.exclude_patterns, text).excludes(cleaned_code)
    }

    /// Keyword evidence in front of the occurrences of `raw_match` in `text`.
    #[must_use]
    pub fn score_context(&self, text: &str, raw_match: &str) -> ContextScore {
        let lower = text.to_lowercase();
        ContextIndex::new(&lower, &self.context_keywords()).score_needle(&raw_match.to_lowercase())
    }

    const fn context_keywords(&self) -> ContextKeywords<'_> {
        ContextKeywords {
            strong: self.strong_keywords.as_slice(),
            weak: self.weak_keywords.as_slice(),
            window: self.context_window,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::patterns::CodePattern;

    fn extractor() -> Extractor {
        Extractor::with_default_tables().unwrap()
    }

    #[test]
    fn test_extractor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();
    }

    #[test]
    fn test_gate_closed_skips_candidates() {
        let ranking = extractor().rank(&EmailMessage::new("Invoice", "Amount 482913"));
        assert!(!ranking.gate_passed());
        assert!(ranking.candidates().is_empty());
    }

    #[test]
    fn test_excluded_candidates_never_ranked() {
        let message = EmailMessage::new("Your code", "Your code is below. Order 482913 shipped.");
        let ranking = extractor().rank(&message);
        assert!(ranking.candidates().iter().all(|c| c.cleaned_code != "482913"));
    }

    #[test]
    fn test_score_context_method() {
        let ex = extractor();
        assert_eq!(ex.score_context("Your code is 4821", "4821"), ContextScore::Strong);
        assert_eq!(ex.score_context("Meeting in room 4821", "4821"), ContextScore::None);
    }

    #[test]
    fn test_is_excluded_method() {
        let ex = extractor();
        assert!(ex.is_excluded("Call 555-482-9137", "9137"));
        assert!(ex.is_excluded("code 123456", "123456"));
        assert!(!ex.is_excluded("code 482913", "482913"));
    }

    #[test]
    fn test_custom_tables() {
        let tables = PatternTables {
            code_patterns: vec![CodePattern {
                name: "ticket".to_string(),
                regex: r"\bT-([0-9]{5})\b".to_string(),
                requires_letter_and_digit: false,
            }],
            ..PatternTables::default()
        };
        let ex = Extractor::new(&tables).unwrap();
        let found = ex.extract(&EmailMessage::new("Your code", "code: T-48213"));
        assert_eq!(found.unwrap().code, "48213");
    }

    #[test]
    fn test_invalid_tables_rejected() {
        let tables = PatternTables {
            code_patterns: Vec::new(),
            ..PatternTables::default()
        };
        assert!(Extractor::new(&tables).is_err());
    }
}
