//! MIME header handling: header blocks with folding, parameters, RFC 2047
//! encoded-words and date parsing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::codec::base64;
use crate::error::{MhtmlError, Result};
use crate::model::ArchiveHeaders;

/// Headers of one block, in order, with lower-cased names.
#[derive(Debug, Clone, Default)]
pub struct HeaderBlock {
    entries: Vec<(String, String)>,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one raw header line.
    ///
    /// Lines starting with a space or tab continue the previous header, as
    /// does any line without a colon. A continuation with nothing to continue
    /// is a parse error at `line`.
    pub fn push_line(&mut self, raw: &str, line: usize) -> Result<()> {
        let folded = raw.starts_with(' ') || raw.starts_with('\t');
        let colon = raw.find(':');

        match (folded, colon) {
            (false, Some(colon_pos)) => {
                let name = raw[..colon_pos].trim().to_ascii_lowercase();
                let value = raw[colon_pos + 1..].trim().to_string();
                self.entries.push((name, value));
                Ok(())
            }
            _ => match self.entries.last_mut() {
                Some(last) => {
                    let continuation = raw.trim();
                    if !continuation.is_empty() {
                        if !last.1.is_empty() {
                            last.1.push(' ');
                        }
                        last.1.push_str(continuation);
                    }
                    Ok(())
                }
                None => Err(MhtmlError::parse("Missing MHTML headers", line)),
            },
        }
    }

    /// First value for a header name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The multipart boundary, from the `boundary` parameter of
    /// `Content-Type` or from a bare `boundary` header.
    pub fn boundary(&self) -> Option<String> {
        self.get("content-type")
            .and_then(|ct| parameter(ct, "boundary"))
            .or_else(|| self.get("boundary").map(unquote))
            .filter(|b| !b.is_empty())
    }

    /// Media type of `Content-Type`, lower-cased and without parameters.
    pub fn media_type(&self) -> Option<String> {
        self.get("content-type").map(media_type)
    }

    /// Summarize the document-level headers.
    pub fn to_archive_headers(&self, boundary: String) -> ArchiveHeaders {
        ArchiveHeaders {
            subject: self.get("subject").map(decode_encoded_words),
            from: self.get("from").map(decode_encoded_words),
            date: self.get("date").and_then(parse_date),
            snapshot_location: self.get("snapshot-content-location").map(String::from),
            content_type: self.media_type(),
            boundary,
        }
    }
}

/// A line that ends a header block: empty or whitespace only.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// `text/HTML; charset=utf-8` → `text/html`.
pub fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Value of a `name=value` parameter in a structured header, unquoted.
pub fn parameter(value: &str, name: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| unquote(val))
    })
}

fn unquote(value: &str) -> String {
    value.trim().replace('"', "")
}

/// Strip surrounding angle brackets from a `Content-ID` value.
pub fn strip_angle_brackets(value: &str) -> String {
    let trimmed = value.trim();
    trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// If decoding fails for any token, the original text is preserved.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two encoded words is dropped (RFC 2047 §6.2)
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];

        if let Some(decoded) = try_decode_one_word(after_start) {
            result.push_str(&decoded.text);
            remaining = &remaining[start + 2 + decoded.consumed..];
            last_was_encoded = true;
        } else {
            result.push_str("=?");
            remaining = after_start;
            last_was_encoded = false;
        }
    }

    result.push_str(remaining);
    result
}

struct DecodedWord {
    text: String,
    consumed: usize, // bytes consumed after the initial "=?"
}

fn try_decode_one_word(s: &str) -> Option<DecodedWord> {
    // charset?encoding?encoded_text?=
    let first_q = s.find('?')?;
    let charset = &s[..first_q];

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let rest2 = &rest[second_q + 1..];
    let end = rest2.find("?=")?;
    let encoded_text = &rest2[..end];

    let consumed = first_q + 1 + second_q + 1 + end + 2;

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => base64::decode(encoded_text).ok()?,
        "Q" => decode_q_encoding(encoded_text),
        _ => return None,
    };

    Some(DecodedWord {
        text: decode_charset(charset, &bytes),
        consumed,
    })
}

/// Q-encoding (RFC 2047): underscores become spaces, `=XX` a byte.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                match std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                {
                    Some(byte) => {
                        result.push(byte);
                        i += 3;
                    }
                    None => {
                        result.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

/// Decode bytes using a named charset.
fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    if charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8") {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    match encoding_rs::Encoding::for_label(charset.as_bytes()) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        None => {
            warn!(charset, "Unknown charset, falling back to UTF-8 lossy");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Parse a `Date` header.
///
/// Supports RFC 2822, RFC 3339 and a few common broken variants.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let no_dow = strip_day_of_week(trimmed);
    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
    ];

    for candidate in [no_dow.clone(), replace_named_tz(&no_dow)] {
        for fmt in &formats {
            if let Ok(dt) = DateTime::parse_from_str(&candidate, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(&candidate, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Strip a leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in DAYS {
        if let Some(rest) = s.strip_prefix(day) {
            if rest.starts_with(',') || rest.starts_with(' ') {
                return rest.trim_start_matches(',').trim().to_string();
            }
        }
    }
    s.to_string()
}

/// Replace well-known timezone abbreviations with numeric offsets.
fn replace_named_tz(s: &str) -> String {
    const TZS: [(&str, &str); 10] = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
    ];
    let mut result = s.to_string();
    for (name, offset) in TZS {
        if result.ends_with(name) {
            let pos = result.len() - name.len();
            result.replace_range(pos.., offset);
            return result;
        }
    }
    result
}
