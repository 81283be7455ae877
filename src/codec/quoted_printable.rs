//! Quoted-Printable transfer encoding (RFC 2045 §6.7).
//!
//! Decoding works on whole lines as they come out of the MHTML cursor, so a
//! soft line break (`=` right before the line terminator) swallows the
//! terminator and the next line continues the same logical line.

use std::fmt::Write as _;

use crate::error::{MhtmlError, Result};

/// Number of content columns per encoded line, leaving room for the `=` of a
/// soft line break.
const LINE_LENGTH: usize = 75;

/// Decode quoted-printable text into raw bytes.
///
/// - trailing spaces and tabs before a line break are dropped
/// - `=` followed by a line break (or the end of input) is a soft break and
///   produces nothing
/// - `=XX` (hex, either case) produces the byte `0xXX`
/// - anything else, including a malformed escape, is copied through
pub fn decode(input: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());

    for segment in input.split_inclusive('\n') {
        let (content, terminator) = split_terminator(segment);
        let content = content.trim_end_matches([' ', '\t']);

        match content.strip_suffix('=') {
            Some(rest) => decode_escapes(rest, &mut out),
            None => {
                decode_escapes(content, &mut out);
                out.extend_from_slice(terminator.as_bytes());
            }
        }
    }

    out
}

/// Encode text as quoted-printable.
///
/// Every character must fit in a single byte (U+0000..=U+00FF); callers are
/// expected to have converted their payload to such a form beforehand.
/// Control characters (tab excepted), `=`, and bytes above 0x7E are escaped
/// as `=XX`. Lines are wrapped at 75 columns with `=\r\n` soft breaks, and a
/// trailing space or tab is escaped so it survives transport.
pub fn encode(input: &str) -> Result<String> {
    let mut escaped = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        let code = u32::from(ch);
        let Ok(byte) = u8::try_from(code) else {
            return Err(MhtmlError::Encode(format!(
                "code point U+{code:04X} cannot be quoted-printable encoded"
            )));
        };
        let literal = matches!(byte, b'\t' | b' '..=b'<' | b'>'..=b'~');
        let trailing_blank = matches!(byte, b'\t' | b' ') && chars.peek().is_none();
        if literal && !trailing_blank {
            escaped.push(ch);
        } else {
            let _ = write!(escaped, "={byte:02X}");
        }
    }

    let mut lines: Vec<&str> = Vec::new();
    let mut rest = escaped.as_str();
    while !rest.is_empty() {
        let mut take = rest.len().min(LINE_LENGTH);
        if take < rest.len() {
            // Never split an `=XX` escape across a soft break.
            let chunk = &rest.as_bytes()[..take];
            if chunk.ends_with(b"=") {
                take -= 1;
            } else if take >= 2 && chunk[take - 2] == b'=' {
                take -= 2;
            }
        }
        lines.push(&rest[..take]);
        rest = &rest[take..];
    }

    Ok(lines.join("=\r\n"))
}

/// Split a line into its content and its `\n` / `\r\n` terminator.
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

fn decode_escapes(text: &str, out: &mut Vec<u8>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).and_then(|b| hex_value(*b)),
                bytes.get(i + 2).and_then(|b| hex_value(*b)),
            ) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
