//! MIME message structure and handling.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::html::html_to_text;
use mailcode_core::EmailMessage;
use std::fmt;
use tracing::{debug, warn};

/// Deepest multipart nesting accepted by the parser.
pub const MAX_DEPTH: usize = 16;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A leaf MIME part.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw bytes, still transfer-encoded).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Gets the content type, falling back to `text/plain` when the header
    /// is missing or unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        content_type_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Whether the part is marked as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|d| d.trim_start().to_ascii_lowercase().starts_with("attachment"))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the decoded body as a string in the part's charset.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        let content_type = self.content_type();
        Ok(decode_charset(
            &decoded,
            content_type.charset().unwrap_or("utf-8"),
        ))
    }
}

/// A parsed MIME message: top-level headers plus its leaf parts in
/// document order.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Leaf parts. A single-part message has exactly one, carrying the
    /// message headers.
    pub parts: Vec<Part>,
}

impl Message {
    /// Parses a raw RFC 5322 message, walking nested multipart bodies.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart body has no boundary or nesting
    /// exceeds [`MAX_DEPTH`].
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (head, _) = split_head_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(head));
        let mut parts = Vec::new();
        collect_parts(raw, 0, &mut parts)?;
        debug!(parts = parts.len(), "parsed message");
        Ok(Self { headers, parts })
    }

    /// Gets the content type.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        content_type_of(&self.headers)
    }

    /// Gets the decoded From header.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.headers.get_decoded("from")
    }

    /// Gets the decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers.get_decoded("subject")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Gets the Message-ID header without angle brackets.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers
            .get("message-id")
            .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>'))
            .filter(|id| !id.is_empty())
    }

    /// The Date header as milliseconds since the Unix epoch.
    #[must_use]
    pub fn timestamp_millis(&self) -> Option<i64> {
        let date = self.date()?;
        // Trailing comments such as "(UTC)" are not part of the grammar chrono parses.
        let date = date.split_once('(').map_or(date, |(d, _)| d).trim();
        chrono::DateTime::parse_from_rfc2822(date)
            .map(|d| d.timestamp_millis())
            .ok()
    }

    /// Decoded text of the first inline part of type `text/<sub_type>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the part's transfer decoding fails.
    pub fn text_part(&self, sub_type: &str) -> Result<Option<String>> {
        self.parts
            .iter()
            .find(|p| !p.is_attachment() && p.content_type().is("text", sub_type))
            .map(Part::body_text)
            .transpose()
    }

    /// The best plain-text rendering of the body.
    ///
    /// Prefers a `text/plain` part, then a `text/html` part converted to
    /// text, then the empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen part's transfer decoding fails.
    pub fn plain_text(&self) -> Result<String> {
        if let Some(text) = self.text_part("plain")? {
            return Ok(text);
        }
        if let Some(html) = self.text_part("html")? {
            return Ok(html_to_text(&html));
        }
        Ok(String::new())
    }

    /// Converts the message into the extractor's input record.
    ///
    /// Missing headers become empty strings; a missing or unparseable Date
    /// becomes 0. `fallback_id` is used when there is no Message-ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be decoded.
    pub fn to_email(&self, fallback_id: &str) -> Result<EmailMessage> {
        Ok(EmailMessage {
            subject: self.subject().unwrap_or_default(),
            body: self.plain_text()?,
            from: self.from().unwrap_or_default(),
            timestamp: self.timestamp_millis().unwrap_or(0),
            id: self
                .message_id()
                .map_or_else(|| fallback_id.to_string(), ToString::to_string),
        })
    }
}

fn content_type_of(headers: &Headers) -> ContentType {
    headers.get("content-type").map_or_else(ContentType::text_plain, |raw| {
        ContentType::parse(raw).unwrap_or_else(|e| {
            warn!(error = %e, "unparseable content type, assuming text/plain");
            ContentType::text_plain()
        })
    })
}

/// Recursively collects the leaf parts of one MIME entity.
fn collect_parts(raw: &[u8], depth: usize, out: &mut Vec<Part>) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::TooDeep(MAX_DEPTH));
    }

    let (head, body) = split_head_body(raw);
    let headers = Headers::parse(&String::from_utf8_lossy(head));
    let content_type = content_type_of(&headers);

    if !content_type.is_multipart() {
        out.push(Part::new(headers, body.to_vec()));
        return Ok(());
    }

    let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
    for section in split_multipart(body, boundary) {
        collect_parts(section, depth + 1, out)?;
    }
    Ok(())
}

/// Splits an entity at the first blank line.
fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    // No headers at all: the entity starts with the blank line.
    if let Some(body) = raw.strip_prefix(b"\r\n") {
        return (&[], body);
    }
    if let Some(body) = raw.strip_prefix(b"\n") {
        return (&[], body);
    }

    let crlf = find_bytes(raw, b"\r\n\r\n").map(|i| (i, 4));
    let lf = find_bytes(raw, b"\n\n").map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    split.map_or((raw, &[][..]), |(i, len)| (&raw[..i], &raw[i + len..]))
}

/// Returns the body sections between `--boundary` delimiter lines.
///
/// The preamble and epilogue are dropped; the line break before each
/// delimiter belongs to the delimiter.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    let mut sections = Vec::new();
    let mut section_start: Option<usize> = None;
    let mut line_start = 0;

    while line_start < body.len() {
        let line_end = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| line_start + i);
        let line = trim_end_ascii(&body[line_start..line_end]);

        if let Some(rest) = line.strip_prefix(delimiter) {
            let closing = rest.starts_with(b"--");
            if closing || rest.is_empty() {
                if let Some(start) = section_start.take() {
                    sections.push(strip_line_break(&body[start..line_start]));
                }
                if closing {
                    break;
                }
                section_start = Some((line_end + 1).min(body.len()));
            }
        }

        line_start = line_end + 1;
    }

    // Unterminated final section
    if let Some(start) = section_start {
        sections.push(&body[start..]);
    }

    sections
}

fn trim_end_ascii(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}

fn strip_line_break(section: &[u8]) -> &[u8] {
    section
        .strip_suffix(b"\r\n")
        .or_else(|| section.strip_suffix(b"\n"))
        .unwrap_or(section)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
