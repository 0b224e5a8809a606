//! Pattern tables: keyword sets and regular expressions driving extraction.
//!
//! Tables are plain configuration. They can be loaded from JSON (any table
//! left out keeps its built-in value) and are compiled once into an
//! [`Extractor`](crate::Extractor).

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Characters of text inspected in front of each candidate occurrence.
pub const DEFAULT_CONTEXT_WINDOW: usize = 80;

/// Score at which a candidate is accepted without any context keyword.
pub const DEFAULT_ACCEPT_MIN_SCORE: u32 = 15;

/// A code-extraction pattern.
///
/// If the regex has a capture group, group 1 is the candidate; otherwise the
/// whole match is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePattern {
    /// Short name used in logs and explanations.
    pub name: String,
    /// Regular expression, matched case-insensitively.
    pub regex: String,
    /// Keep only matches with at least one letter and one digit.
    #[serde(default)]
    pub requires_letter_and_digit: bool,
}

impl CodePattern {
    fn new(name: &str, regex: &str) -> Self {
        Self {
            name: name.to_string(),
            regex: regex.to_string(),
            requires_letter_and_digit: false,
        }
    }

    fn mixed(name: &str, regex: &str) -> Self {
        Self {
            requires_letter_and_digit: true,
            ..Self::new(name, regex)
        }
    }
}

/// A pattern describing text that looks numeric but is not a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludePattern {
    /// Short name used in logs.
    pub name: String,
    /// Regular expression, matched case-insensitively.
    pub regex: String,
}

impl ExcludePattern {
    fn new(name: &str, regex: &str) -> Self {
        Self {
            name: name.to_string(),
            regex: regex.to_string(),
        }
    }
}

/// All configuration the extractor needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTables {
    /// Phrases licensing any analysis at all.
    pub otp_keywords: Vec<String>,
    /// Phrases that are strong evidence when found before a candidate.
    pub strong_context_keywords: Vec<String>,
    /// Phrases that are weak evidence when found before a candidate.
    pub weak_context_keywords: Vec<String>,
    /// Ordered extraction patterns, most specific first.
    ///
    /// The first entry is the explicit-label pattern ("code is: X"). Its
    /// candidates earn the label bonus, and the codes its capture group
    /// finds anywhere in the text earn the relabel bonus for every pattern.
    pub code_patterns: Vec<CodePattern>,
    /// Known false-positive shapes.
    pub exclude_patterns: Vec<ExcludePattern>,
    /// Characters inspected before each occurrence.
    pub context_window: usize,
    /// Minimum score accepted without context evidence.
    pub accept_min_score: u32,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl Default for PatternTables {
    fn default() -> Self {
        Self {
            otp_keywords: strings(&[
                "verification code",
                "verification",
                "verify",
                "one-time",
                "one time",
                "otp",
                "passcode",
                "security code",
                "login code",
                "log in code",
                "sign-in code",
                "sign in code",
                "authentication code",
                "auth code",
                "confirmation code",
                "access code",
                "2fa",
                "two-factor",
                "two factor",
                "your code",
                "code is",
                "code:",
                "pin code",
                "your pin",
                "pin:",
                "pin is",
            ]),
            strong_context_keywords: strings(&[
                "verification code",
                "one-time code",
                "one-time password",
                "one time code",
                "one time password",
                "otp",
                "passcode",
                "security code",
                "login code",
                "sign-in code",
                "sign in code",
                "authentication code",
                "confirmation code",
                "access code",
                "2fa code",
                "code is",
                "code:",
                "enter this code",
                "use this code",
                "pin code",
                "your pin",
            ]),
            weak_context_keywords: strings(&[
                "code",
                "verify",
                "verification",
                "confirm",
                "login",
                "log in",
                "sign in",
                "sign-in",
                "authenticate",
                "token",
                "password",
                "security",
            ]),
            code_patterns: vec![
                CodePattern::new(
                    "labeled",
                    r"\b(?:code|otp|pin|passcode)\s*(?:is|:)\s*:?\s*([A-Z0-9]{4,8})\b",
                ),
                CodePattern::new("digits6", r"\b[0-9]{6}\b"),
                CodePattern::new("digits4", r"\b[0-9]{4}\b"),
                CodePattern::new("digits8", r"\b[0-9]{8}\b"),
                CodePattern::new("digits5", r"\b[0-9]{5}\b"),
                CodePattern::new("digits7", r"\b[0-9]{7}\b"),
                CodePattern::mixed("alnum", r"\b[A-Z0-9]{6,8}\b"),
                CodePattern::new("dashed", r"\b[0-9]{3}-[0-9]{3}\b"),
                CodePattern::new("spaced", r"\b[0-9]{3} [0-9]{3}\b"),
            ],
            exclude_patterns: vec![
                ExcludePattern::new(
                    "phone",
                    r"(?:\+?[0-9]{1,3}[-.\s]?)?\(?[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b",
                ),
                ExcludePattern::new("phone_intl", r"\+[0-9]{8,15}\b"),
                ExcludePattern::new(
                    "date",
                    r"\b[0-9]{1,2}[/.-][0-9]{1,2}[/.-][0-9]{2,4}\b",
                ),
                ExcludePattern::new("date_iso", r"\b[0-9]{4}-[0-9]{2}-[0-9]{2}\b"),
                ExcludePattern::new(
                    "date_text",
                    r"\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+[0-9]{1,2}(?:st|nd|rd|th)?(?:,?\s+[0-9]{4})?\b",
                ),
                ExcludePattern::new(
                    "date_text_day_first",
                    r"\b[0-9]{1,2}(?:st|nd|rd|th)?\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?(?:,?\s+[0-9]{4})?\b",
                ),
                ExcludePattern::new(
                    "time",
                    r"\b[0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?(?:\s*(?:am|pm)\b)?",
                ),
                ExcludePattern::new("year", r"\b(?:19|20)[0-9]{2}\b"),
                ExcludePattern::new(
                    "reference",
                    r"\b(?:order|ref|reference|tracking|invoice)\b\s*(?:#|no\.?|num(?:ber)?|id)?\s*[:#]?\s*[A-Z0-9-]*[0-9][A-Z0-9-]*",
                ),
                ExcludePattern::new("zip_plus4", r"\b[0-9]{5}-[0-9]{4}\b"),
                ExcludePattern::new(
                    "postal",
                    concat!(
                        r"(?-i:\b(?:AL|AK|AZ|AR|CA|CO|CT|DC|DE|FL|GA|HI|IA|ID|IL|IN|KS|KY|LA|MA|MD|ME|",
                        r"MI|MN|MO|MS|MT|NC|ND|NE|NH|NJ|NM|NV|NY|OH|OK|OR|PA|PR|RI|SC|SD|TN|TX|UT|",
                        r"VA|VT|WA|WI|WV|WY)\b)\s+[0-9]{5}(?:-[0-9]{4})?\b",
                    ),
                ),
                ExcludePattern::new(
                    "currency",
                    r"[$€£¥]\s?[0-9][0-9,]*(?:\.[0-9]{1,2})?",
                ),
                ExcludePattern::new(
                    "currency_suffix",
                    r"\b[0-9][0-9,]*(?:\.[0-9]{2})?\s?(?:usd|eur|gbp|dollars|euros)\b",
                ),
                ExcludePattern::new("long_number", r"[0-9]{9,}"),
                ExcludePattern::new(
                    "css_length",
                    r"\b[0-9]+(?:\.[0-9]+)?(?:px|pt|em|rem|vh|vw|%)",
                ),
                ExcludePattern::new("hex_color", r"#(?:[0-9a-f]{6}|[0-9a-f]{3})\b"),
            ],
            context_window: DEFAULT_CONTEXT_WINDOW,
            accept_min_score: DEFAULT_ACCEPT_MIN_SCORE,
        }
    }
}

impl PatternTables {
    /// Parses tables from JSON. Tables missing from the document keep their
    /// built-in values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Serializes the tables as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// A compiled code pattern.
#[derive(Debug, Clone)]
pub(crate) struct CompiledCodePattern {
    pub(crate) name: String,
    pub(crate) regex: Regex,
    pub(crate) requires_letter_and_digit: bool,
}

impl CompiledCodePattern {
    /// Whether the regex declares a capture group to take the code from.
    pub(crate) fn has_group(&self) -> bool {
        self.regex.captures_len() > 1
    }
}

/// A compiled exclusion pattern.
#[derive(Debug, Clone)]
pub(crate) struct CompiledExcludePattern {
    pub(crate) name: String,
    pub(crate) regex: Regex,
}

pub(crate) fn compile(name: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::InvalidPattern {
            name: name.to_string(),
            source,
        })
}

pub(crate) fn compile_code_patterns(patterns: &[CodePattern]) -> Result<Vec<CompiledCodePattern>> {
    if patterns.is_empty() {
        return Err(Error::EmptyTable("code_patterns"));
    }
    patterns
        .iter()
        .map(|p| {
            Ok(CompiledCodePattern {
                name: p.name.clone(),
                regex: compile(&p.name, &p.regex)?,
                requires_letter_and_digit: p.requires_letter_and_digit,
            })
        })
        .collect()
}

pub(crate) fn compile_exclude_patterns(
    patterns: &[ExcludePattern],
) -> Result<Vec<CompiledExcludePattern>> {
    patterns
        .iter()
        .map(|p| {
            Ok(CompiledExcludePattern {
                name: p.name.clone(),
                regex: compile(&p.name, &p.regex)?,
            })
        })
        .collect()
}

/// Lowercases a keyword list once so matching can use plain substring search.
///
/// Empty entries are dropped; they would otherwise match everywhere.
pub(crate) fn lowercase_all(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_compile() {
        let tables = PatternTables::default();
        let code = compile_code_patterns(&tables.code_patterns).unwrap();
        assert_eq!(code.len(), 9);
        compile_exclude_patterns(&tables.exclude_patterns).unwrap();
    }

    #[test]
    fn test_group_declarations() {
        let tables = PatternTables::default();
        let code = compile_code_patterns(&tables.code_patterns).unwrap();
        assert!(code[0].has_group());
        assert!(code[1..].iter().all(|p| !p.has_group()));
    }

    #[test]
    fn test_invalid_pattern_reports_name() {
        let bad = vec![CodePattern::new("broken", r"([0-9]")];
        let err = compile_code_patterns(&bad).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_empty_code_patterns_rejected() {
        assert!(matches!(
            compile_code_patterns(&[]),
            Err(Error::EmptyTable("code_patterns"))
        ));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tables = PatternTables::from_json(r#"{"context_window": 40}"#).unwrap();
        assert_eq!(tables.context_window, 40);
        assert_eq!(tables.code_patterns, PatternTables::default().code_patterns);
    }

    #[test]
    fn test_json_roundtrip() {
        let tables = PatternTables::default();
        let json = tables.to_json().unwrap();
        assert_eq!(PatternTables::from_json(&json).unwrap(), tables);
    }

    #[test]
    fn test_postal_requires_uppercase_state() {
        let tables = PatternTables::default();
        let postal = tables
            .exclude_patterns
            .iter()
            .find(|p| p.name == "postal")
            .unwrap();
        let regex = compile(&postal.name, &postal.regex).unwrap();
        assert!(regex.is_match("Springfield, IL 62704"));
        assert!(regex.is_match("Austin TX 78701-1234"));
        assert!(!regex.is_match("your code is 62704"));
        assert!(!regex.is_match("YOUR CODE IS 62704"));
        assert!(!regex.is_match("ENTER 62704"));
    }
}
