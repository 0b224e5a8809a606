//! Output formatting for scan results and ranking explanations.

use std::fmt::Write;

use mailcode_core::{CodeMatch, ContextScore, EmailMessage, Ranking};
use serde::Serialize;

/// Machine-readable scan result.
#[derive(Debug, Serialize)]
pub struct Found<'a> {
    pub code: &'a str,
    pub id: &'a str,
    pub from: &'a str,
    pub subject: &'a str,
    pub timestamp: i64,
}

impl<'a> Found<'a> {
    pub fn new(message: &'a EmailMessage, code: &'a CodeMatch) -> Self {
        Self {
            code: &code.code,
            id: &message.id,
            from: &message.from,
            subject: &message.subject,
            timestamp: message.timestamp,
        }
    }
}

/// Machine-readable ranking of one message.
#[derive(Debug, Serialize)]
pub struct Explained<'a> {
    pub id: &'a str,
    pub subject: &'a str,
    #[serde(flatten)]
    pub ranking: &'a Ranking,
}

/// Renders a ranking for a terminal.
pub fn explain_text(message: &EmailMessage, ranking: &Ranking) -> String {
    let mut out = String::new();
    let id = if message.id.is_empty() { "-" } else { &message.id };
    let _ = writeln!(out, "{id}  {:?}", message.subject);

    if !ranking.gate_passed() {
        out.push_str("  gate: closed\n");
        return out;
    }
    out.push_str("  gate: open\n");

    for (i, candidate) in ranking.candidates().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<10} pattern {}  context {:<6}  score {}",
            i + 1,
            candidate.cleaned_code,
            candidate.pattern_rank,
            context_label(candidate.context_score),
            candidate.total_score,
        );
    }

    match ranking.accepted() {
        Some(code) => {
            let _ = writeln!(out, "  accepted: {}", code.code);
        }
        None if ranking.candidates().is_empty() => out.push_str("  abstained: no candidates\n"),
        None => out.push_str("  abstained: best candidate not confident\n"),
    }

    out
}

const fn context_label(score: ContextScore) -> &'static str {
    match score {
        ContextScore::None => "none",
        ContextScore::Weak => "weak",
        ContextScore::Strong => "strong",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailcode_core::Extractor;

    #[test]
    fn test_explain_gate_closed() {
        let extractor = Extractor::with_default_tables().unwrap();
        let message = EmailMessage::new("Lunch", "See you at 12").with_id("m1");
        let text = explain_text(&message, &extractor.rank(&message));
        assert_eq!(text, "m1  \"Lunch\"\n  gate: closed\n");
    }

    #[test]
    fn test_explain_accepted() {
        let extractor = Extractor::with_default_tables().unwrap();
        let message = EmailMessage::new("Your verification code is 482913", "");
        let text = explain_text(&message, &extractor.rank(&message));
        assert!(text.starts_with("-  "));
        assert!(text.contains("gate: open"));
        assert!(text.contains("482913"));
        assert!(text.contains("context strong"));
        assert!(text.ends_with("accepted: 482913\n"));
    }

    #[test]
    fn test_explain_abstained() {
        let extractor = Extractor::with_default_tables().unwrap();
        let message = EmailMessage::new("", "123456 verify");
        let text = explain_text(&message, &extractor.rank(&message));
        assert!(text.ends_with("abstained: no candidates\n"));
    }

    #[test]
    fn test_explained_json_flattens_ranking() {
        let extractor = Extractor::with_default_tables().unwrap();
        let message = EmailMessage::new("Your verification code is 482913", "").with_id("m2");
        let ranking = extractor.rank(&message);
        let json = serde_json::to_value(Explained {
            id: &message.id,
            subject: &message.subject,
            ranking: &ranking,
        })
        .unwrap();
        assert_eq!(json["id"], "m2");
        assert_eq!(json["gate_passed"], true);
        assert_eq!(json["accepted"]["code"], "482913");
        assert_eq!(json["candidates"][0]["context_score"], "strong");
    }
}
