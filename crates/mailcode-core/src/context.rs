//! Context scoring: keyword evidence in the text preceding a candidate.

use aho_corasick::AhoCorasick;

use crate::model::ContextScore;

/// Keyword lists and window size used when scoring.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContextKeywords<'a> {
    pub(crate) strong: &'a [String],
    pub(crate) weak: &'a [String],
    pub(crate) window: usize,
}

/// Keyword positions of one lowercased text, built once per extraction.
///
/// `strong[i]` is the latest start of a strong keyword that ends at or
/// before byte `i` (likewise `weak`). A keyword lies inside the window
/// before an occurrence at `i` exactly when that start is not before the
/// window start, so each occurrence is judged without rescanning the text.
pub(crate) struct ContextIndex<'t> {
    text: &'t str,
    window: usize,
    strong: Vec<Option<usize>>,
    weak: Vec<Option<usize>>,
}

impl<'t> ContextIndex<'t> {
    /// Indexes `text`, which must already be lowercase.
    pub(crate) fn new(text: &'t str, keywords: &ContextKeywords<'_>) -> Self {
        Self {
            text,
            window: keywords.window,
            strong: latest_starts(text, keywords.strong),
            weak: latest_starts(text, keywords.weak),
        }
    }

    /// Scores occurrences given by their start offsets, in text order.
    ///
    /// Stops at the first occurrence with a strong keyword. A weak keyword
    /// only raises the running best, so later occurrences still get a
    /// chance at strong evidence.
    pub(crate) fn score(&self, occurrences: impl IntoIterator<Item = usize>) -> ContextScore {
        let mut best = ContextScore::None;

        for index in occurrences {
            let start = window_start(self.text, index, self.window);
            let visible = |latest: &[Option<usize>]| latest[index].is_some_and(|s| s >= start);

            if visible(&self.strong) {
                return ContextScore::Strong;
            }
            if visible(&self.weak) {
                best = ContextScore::Weak;
            }
        }

        best
    }

    /// Scores every occurrence of one lowercase `needle`.
    pub(crate) fn score_needle(&self, needle: &str) -> ContextScore {
        self.score(Occurrences::new(self.text, needle))
    }

    /// Scores many distinct lowercase needles with a single pass over the
    /// text. Output order matches `needles`.
    pub(crate) fn score_all(&self, needles: &[String]) -> Vec<ContextScore> {
        let Ok(automaton) = AhoCorasick::new(needles) else {
            return needles.iter().map(|n| self.score_needle(n)).collect();
        };

        let mut positions = vec![Vec::new(); needles.len()];
        for m in automaton.find_overlapping_iter(self.text) {
            positions[m.pattern().as_usize()].push(m.start());
        }

        positions.into_iter().map(|p| self.score(p)).collect()
    }
}

/// Latest keyword start visible from each byte offset of `text`.
fn latest_starts(text: &str, keywords: &[String]) -> Vec<Option<usize>> {
    let mut latest = vec![None; text.len() + 1];

    for keyword in keywords {
        for start in Occurrences::new(text, keyword) {
            let end = start + keyword.len();
            latest[end] = latest[end].max(Some(start));
        }
    }

    // A keyword ending before `i` is as visible from `i` as one ending at it.
    let mut carried = None;
    for slot in &mut latest {
        carried = carried.max(*slot);
        *slot = carried;
    }

    latest
}

/// Start offsets of every occurrence of `needle`, overlapping ones included.
struct Occurrences<'a> {
    haystack: &'a str,
    needle: &'a str,
    cursor: usize,
}

impl<'a> Occurrences<'a> {
    const fn new(haystack: &'a str, needle: &'a str) -> Self {
        Self {
            haystack,
            needle,
            cursor: 0,
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let first = self.needle.chars().next()?;
        let found = self.cursor + self.haystack.get(self.cursor..)?.find(self.needle)?;
        self.cursor = found + first.len_utf8();
        Some(found)
    }
}

/// Byte offset `chars` characters before `end`, or 0.
fn window_start(text: &str, end: usize, chars: usize) -> usize {
    if chars == 0 {
        return end;
    }
    text[..end]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map_or(0, |(i, _)| i)
}
