//! Ranking: scoring, deduplication by cleaned code, and the accept decision.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{Candidate, CodeMatch, ContextScore, normalize};
use crate::patterns::CompiledCodePattern;

/// Points per context level.
pub const CONTEXT_WEIGHT: u32 = 10;
/// Bonus for candidates found by the explicit-label pattern.
pub const LABEL_PATTERN_BONUS: u32 = 15;
/// Bonus for exactly six digits, the most common code shape.
pub const SIX_DIGIT_BONUS: u32 = 3;
/// Bonus when the candidate also appears in the subject.
pub const SUBJECT_BONUS: u32 = 5;
/// Bonus when the text labels this exact code ("code is: X") anywhere.
pub const RELABEL_BONUS: u32 = 20;


/// Outcome of ranking one message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ranking {
    gate_passed: bool,
    candidates: Vec<Candidate>,
    accepted: Option<CodeMatch>,
}

impl Ranking {
    /// A ranking for a message rejected by the keyword gate.
    #[must_use]
    pub fn gate_closed() -> Self {
        Self::default()
    }

    /// Ranks scored candidates and applies the acceptance threshold.
    #[must_use]
    pub fn from_scored(scored: impl IntoIterator<Item = Candidate>, accept_min_score: u32) -> Self {
        let candidates = dedup_best(scored);
        let accepted = candidates
            .first()
            .filter(|best| is_confident(best, accept_min_score))
            .map(|best| CodeMatch {
                code: best.cleaned_code.clone(),
            });

        Self {
            gate_passed: true,
            candidates,
            accepted,
        }
    }

    /// Whether the keyword gate let the message through.
    #[must_use]
    pub const fn gate_passed(&self) -> bool {
        self.gate_passed
    }

    /// Unique candidates, best first.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// The top candidate, accepted or not.
    #[must_use]
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// The accepted code, if any.
    #[must_use]
    pub const fn accepted(&self) -> Option<&CodeMatch> {
        self.accepted.as_ref()
    }

    /// Consumes the ranking, returning the accepted code.
    #[must_use]
    pub fn into_accepted(self) -> Option<CodeMatch> {
        self.accepted
    }
}

/// Combined score for one candidate occurrence.
///
/// `subject_lower` is the lowercased subject; `labeled` holds the codes an
/// explicit label names anywhere in the text (see [`labeled_codes`]).
pub(crate) fn total_score(
    candidate: &Candidate,
    subject_lower: &str,
    labeled: &HashSet<String>,
) -> u32 {
    let mut score = candidate.context_score.value() * CONTEXT_WEIGHT;

    if candidate.pattern_rank == 0 {
        score += LABEL_PATTERN_BONUS;
    }
    if is_six_digits(&candidate.cleaned_code) {
        score += SIX_DIGIT_BONUS;
    }
    if subject_lower.contains(&candidate.raw_match.to_lowercase()) {
        score += SUBJECT_BONUS;
    }
    if labeled.contains(&candidate.cleaned_code) {
        score += RELABEL_BONUS;
    }

    score
}

fn is_six_digits(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

/// Normalized codes captured by the explicit-label pattern anywhere in `text`.
///
/// Searching resumes at each captured code rather than after it, so in
/// "code: code: 482913" both labels are seen. A label pattern without a
/// capture group names nothing.
pub(crate) fn labeled_codes(label: &CompiledCodePattern, text: &str) -> HashSet<String> {
    let mut codes = HashSet::new();
    if !label.has_group() {
        return codes;
    }

    let mut at = 0;
    while let Some(caps) = label.regex.captures_at(text, at) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        codes.insert(normalize(code.as_str()));
        at = if code.start() > whole.start() {
            code.start()
        } else {
            // Step one character past the match start.
            match text[whole.start()..].chars().next() {
                Some(c) => whole.start() + c.len_utf8(),
                None => break,
            }
        };
    }

    codes
}

/// Keeps the highest-scoring candidate per cleaned code, then sorts best first.
///
/// Ties keep the candidate seen first, both within a code and in the order.
fn dedup_best(scored: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Candidate> = Vec::new();

    for candidate in scored {
        if let Some(&i) = index.get(&candidate.cleaned_code) {
            if candidate.total_score > unique[i].total_score {
                unique[i] = candidate;
            }
        } else {
            index.insert(candidate.cleaned_code.clone(), unique.len());
            unique.push(candidate);
        }
    }

    unique.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    unique
}

fn is_confident(best: &Candidate, accept_min_score: u32) -> bool {
    best.context_score >= ContextScore::Weak || best.total_score >= accept_min_score
}
