//! Data models shared across the extraction pipeline.

use serde::{Deserialize, Serialize};

/// One email handed to the extractor.
///
/// The body is plain text; markup is expected to be stripped upstream.
/// Every field defaults, so records missing `subject` or `body` read as
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailMessage {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Sender address.
    pub from: String,
    /// Received time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Opaque identifier assigned by the mail source.
    pub id: String,
}

impl EmailMessage {
    /// Creates a message from a subject and body, leaving the rest empty.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Sets the received time.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the sender.
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Subject and body joined by a single space, the text all patterns run on.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }
}

/// Strength of the keyword evidence found in front of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextScore {
    /// No keyword near any occurrence.
    #[default]
    None,
    /// A weak keyword near at least one occurrence.
    Weak,
    /// A strong keyword near at least one occurrence.
    Strong,
}

impl ContextScore {
    /// Numeric weight (0, 1 or 2).
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Weak => 1,
            Self::Strong => 2,
        }
    }
}

/// A token that might be the verification code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Text as matched, before normalization.
    pub raw_match: String,
    /// Normalized form: hyphens and spaces removed, uppercased.
    pub cleaned_code: String,
    /// Index of the pattern that produced this candidate; lower is more specific.
    pub pattern_rank: usize,
    /// Keyword evidence around the candidate's occurrences.
    pub context_score: ContextScore,
    /// Combined ranking score.
    pub total_score: u32,
}

impl Candidate {
    /// Creates an unscored candidate from a raw match.
    #[must_use]
    pub fn new(raw_match: impl Into<String>, pattern_rank: usize) -> Self {
        let raw_match = raw_match.into();
        let cleaned_code = normalize(&raw_match);
        Self {
            raw_match,
            cleaned_code,
            pattern_rank,
            context_score: ContextScore::None,
            total_score: 0,
        }
    }

    /// Whether the cleaned code contains at least one digit.
    #[must_use]
    pub fn has_digit(&self) -> bool {
        self.cleaned_code.bytes().any(|b| b.is_ascii_digit())
    }
}

/// An accepted verification code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMatch {
    /// The normalized code.
    pub code: String,
}

/// Strips hyphens and spaces and uppercases.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .flat_map(char::to_uppercase)
        .collect()
}
