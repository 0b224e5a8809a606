//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header words.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::Encoding;
use tracing::debug;

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable bytes (RFC 2045).
///
/// Decoding is lenient, as RFC 2045 section 6.7 asks: whitespace between `=`
/// and the line break is tolerated, hex digits may be lowercase, and an `=`
/// that starts no valid escape (such as `?a=b` in an unencoded URL) is kept
/// literally.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        if let Some(len) = soft_break_len(&data[i + 1..]) {
            i += 1 + len;
            continue;
        }

        match data.get(i + 1..i + 3) {
            Some(&[hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                result.push((hex_value(hi) << 4) | hex_value(lo));
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

/// Length of a soft line break following `=`: optional transport padding,
/// then CRLF, LF or the end of the data.
fn soft_break_len(rest: &[u8]) -> Option<usize> {
    let padding = rest
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    match &rest[padding..] {
        [] => Some(padding),
        [b'\r', b'\n', ..] => Some(padding + 2),
        [b'\n', ..] => Some(padding + 1),
        _ => None,
    }
}

const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// Converts bytes in the given charset to a string.
///
/// Labels are resolved the way browsers do (`latin1` and `us-ascii` mean
/// windows-1252, for instance). Unknown labels fall back to lossy UTF-8.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    match Encoding::for_label(charset.trim().as_bytes()) {
        Some(encoding) => encoding.decode(bytes).0.into_owned(),
        None => {
            debug!(charset, "unknown charset, decoding as UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`. Whitespace between two
/// adjacent encoded words is dropped; other text passes through unchanged.
///
/// # Errors
///
/// Returns an error if an encoded word uses an unknown encoding or its
/// payload cannot be decoded.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = String::new();
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let Some((word, len)) = split_encoded_word(&rest[start..]) else {
            // Not an encoded word; emit through the marker and keep going.
            result.push_str(&pending_space);
            pending_space.clear();
            result.push_str(&rest[..start + 2]);
            rest = &rest[start + 2..];
            after_word = false;
            continue;
        };

        let between = &rest[..start];
        if !(after_word && between.trim().is_empty()) {
            result.push_str(&pending_space);
            result.push_str(between);
        }
        pending_space.clear();

        result.push_str(&decode_word(word)?);
        rest = &rest[start + len..];

        // Hold trailing whitespace until we know whether another word follows.
        let trimmed = rest.trim_start();
        pending_space.push_str(&rest[..rest.len() - trimmed.len()]);
        rest = trimmed;
        after_word = true;
    }

    result.push_str(&pending_space);
    result.push_str(rest);
    Ok(result)
}

/// Splits `=?charset?enc?text?=` off the front of `s`, returning the inner
/// `charset?enc?text` and the total length consumed.
fn split_encoded_word(s: &str) -> Option<(&str, usize)> {
    let inner = s.strip_prefix("=?")?;
    let charset_end = inner.find('?')?;
    let enc_end = charset_end + 1 + inner[charset_end + 1..].find('?')?;
    let text_end = enc_end + 1 + inner[enc_end + 1..].find("?=")?;
    let word = &inner[..text_end];
    if word.contains(char::is_whitespace) {
        return None;
    }
    Some((word, text_end + 4))
}

fn decode_word(word: &str) -> Result<String> {
    let mut parts = word.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(encoded_text)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    // RFC 2231 language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(encoded_text)?,
        // Quoted-Printable with underscore for space
        "Q" => decode_quoted_printable(encoded_text.replace('_', " ").as_bytes()),
        other => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {other}"
            )));
        }
    };

    Ok(decode_charset(&bytes, charset))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_decode() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!"), b"Hello, World!");
        let decoded = decode_quoted_printable(b"H=C3=A9llo");
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
        assert_eq!(decode_quoted_printable(b"a=3db"), b"a=b");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello="), b"Hello");
    }

    #[test]
    fn test_quoted_printable_padded_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=  \r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=\t\nWorld"), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_keeps_raw_utf8() {
        let decoded = decode_quoted_printable("Code é 4821".as_bytes());
        assert_eq!(String::from_utf8(decoded).unwrap(), "Code é 4821");
    }

    #[test]
    fn test_quoted_printable_stray_equals_kept() {
        let body = b"Your code is 482913.\r\nManage at https://x.com/?a=b&c=zz";
        assert_eq!(decode_quoted_printable(body), body.to_vec());
        assert_eq!(decode_quoted_printable(b"abc=4"), b"abc=4");
        assert_eq!(decode_quoted_printable(b"x = y"), b"x = y");
    }

    #[test]
    fn test_decode_charset_latin1() {
        assert_eq!(decode_charset(&[0x48, 0xE9], "ISO-8859-1"), "Hé");
        assert_eq!(decode_charset("Hé".as_bytes(), "utf-8"), "Hé");
    }

    #[test]
    fn test_decode_charset_windows_1252_punctuation() {
        let bytes = [0x93, b'h', b'i', 0x94, b' ', 0x96];
        assert_eq!(decode_charset(&bytes, "windows-1252"), "\u{201C}hi\u{201D} \u{2013}");
    }

    #[test]
    fn test_decode_charset_other_legacy_charsets() {
        assert_eq!(decode_charset(&[0xB1], "ISO-8859-2"), "\u{105}");
        assert_eq!(decode_charset(&[0xC1, 0xC2], "koi8-r"), "\u{430}\u{431}");
    }

    #[test]
    fn test_decode_charset_unknown_label_is_utf8() {
        assert_eq!(decode_charset("Hé".as_bytes(), "x-made-up"), "Hé");
    }

    #[test]
    fn test_rfc2047_plain_passthrough() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
    }

    #[test]
    fn test_rfc2047_base64() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
    }

    #[test]
    fn test_rfc2047_quoted_printable() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo?=").unwrap(), "Héllo");
        assert_eq!(decode_rfc2047("=?utf-8?q?your_code?=").unwrap(), "your code");
    }

    #[test]
    fn test_rfc2047_mixed_text() {
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?Q?caf=C3=A9?= menu").unwrap(),
            "Re: café menu"
        );
    }

    #[test]
    fn test_rfc2047_adjacent_words_joined() {
        assert_eq!(
            decode_rfc2047("=?utf-8?Q?Your_?= =?utf-8?Q?code?=").unwrap(),
            "Your code"
        );
    }

    #[test]
    fn test_rfc2047_unknown_encoding() {
        assert!(decode_rfc2047("=?utf-8?X?abc?=").is_err());
    }

    #[test]
    fn test_rfc2047_stray_marker() {
        assert_eq!(decode_rfc2047("a =? b").unwrap(), "a =? b");
    }
}
