//! HTML to plain text conversion for HTML-only messages.

/// Converts HTML to plain text.
///
/// - Strips tags and drops `<style>`, `<script>` and `<head>` contents
/// - Converts block elements to line breaks
/// - Decodes common named and numeric entities
/// - Collapses runs of whitespace
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut last_was_block = false;
    let mut skip_until: Option<&'static str> = None;
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => {
                let Some(end) = tag_end(rest) else {
                    // Not markup: "a < b", or a tag that never closes.
                    if skip_until.is_none() {
                        result.push(c);
                        last_was_block = false;
                    }
                    rest = &rest[1..];
                    continue;
                };
                let tag = tag_name(&rest[1..end]);
                rest = &rest[end + 1..];

                if let Some(closing) = skip_until {
                    if tag == closing {
                        skip_until = None;
                    }
                    continue;
                }

                match tag.as_str() {
                    "style" => skip_until = Some("/style"),
                    "script" => skip_until = Some("/script"),
                    "head" => skip_until = Some("/head"),
                    "br" | "/p" | "/div" | "/tr" | "/li" | "/h1" | "/h2" | "/h3" | "/h4"
                    | "/h5" | "/h6" | "/blockquote" | "/table" => {
                        if !last_was_block {
                            push_newline(&mut result);
                            last_was_block = true;
                        }
                    }
                    "p" | "div" | "tr" | "li" | "table" => {
                        if !result.is_empty() && !last_was_block {
                            push_newline(&mut result);
                            last_was_block = true;
                        }
                    }
                    // Adjacent cells stay on one line but must not fuse.
                    "td" | "th" => push_space(&mut result),
                    _ => {}
                }
            }
            _ if skip_until.is_some() => {
                rest = &rest[c.len_utf8()..];
            }
            '&' => {
                let (decoded, consumed) = decode_entity(rest);
                result.push_str(&decoded);
                last_was_block = false;
                rest = &rest[consumed..];
            }
            _ if c.is_whitespace() => {
                push_space(&mut result);
                rest = &rest[c.len_utf8()..];
            }
            _ => {
                result.push(c);
                last_was_block = false;
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    // Clean up: at most one blank line in a row
    let mut cleaned = String::with_capacity(result.len());
    let mut prev_newlines = 0;

    for c in result.chars() {
        if c == '\n' {
            prev_newlines += 1;
            if prev_newlines <= 2 {
                cleaned.push(c);
            }
        } else {
            prev_newlines = 0;
            cleaned.push(c);
        }
    }

    cleaned.trim().to_string()
}

/// Offset of the `>` ending the tag that opens `s`, or `None` when the
/// leading `<` does not start one.
fn tag_end(s: &str) -> Option<usize> {
    let next = s[1..].chars().next()?;
    if !(next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')) {
        return None;
    }
    s.find('>')
}

/// Lowercased tag name with a leading `/` for closing tags.
fn tag_name(inner: &str) -> String {
    let inner = inner.trim_start();
    let (prefix, name) = inner
        .strip_prefix('/')
        .map_or(("", inner), |name| ("/", name));
    let name: String = name
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    format!("{prefix}{}", name.to_ascii_lowercase())
}

fn push_space(out: &mut String) {
    if !out.is_empty() && !out.ends_with(' ') && !out.ends_with('\n') {
        out.push(' ');
    }
}

fn push_newline(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('\n');
}

/// Decodes the entity at the start of `s` (which begins with `&`).
///
/// Returns the replacement and the number of bytes consumed. Anything that
/// is not a recognizable entity yields a literal `&`.
fn decode_entity(s: &str) -> (String, usize) {
    let literal = ("&".to_string(), 1);
    let Some(end) = s[1..].find(';').map(|i| i + 1) else {
        return literal;
    };
    let entity = &s[1..end];
    if entity.is_empty() || entity.len() > 10 || entity.contains(char::is_whitespace) {
        return literal;
    }

    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "trade" => "\u{2122}",
        _ => {
            let code = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#')?.parse::<u32>().ok());
            return match code.and_then(char::from_u32) {
                Some(ch) => (ch.to_string(), end + 1),
                None => literal,
            };
        }
    };

    (decoded.to_string(), end + 1)
}
