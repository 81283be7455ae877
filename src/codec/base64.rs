//! Base64 capability used when re-embedding payloads as `data:` URIs.
//!
//! The converter takes any [`Base64Encode`] implementation, so callers can
//! swap the alphabet or engine without touching the inliner. Every
//! `base64::Engine` qualifies.

use ::base64::engine::general_purpose::STANDARD;
use ::base64::Engine;

use crate::error::{MhtmlError, Result};

/// Something that turns raw bytes into base64 text.
pub trait Base64Encode {
    /// Encode `bytes` as base64.
    fn encode_bytes(&self, bytes: &[u8]) -> String;
}

impl<E: Engine> Base64Encode for E {
    fn encode_bytes(&self, bytes: &[u8]) -> String {
        self.encode(bytes)
    }
}

/// The default encoder: standard alphabet with padding.
pub fn standard() -> Box<dyn Base64Encode> {
    Box::new(STANDARD)
}

/// Decode standard base64, ignoring embedded whitespace.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| MhtmlError::Encode(format!("invalid base64: {e}")))
}

/// Map text whose characters are all in U+0000..=U+00FF back to one byte per
/// character.
///
/// This is the inverse of reading an arbitrary byte string as ISO-8859-1 and
/// fails on anything wider.
pub fn latin1_bytes(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|ch| {
            u8::try_from(u32::from(ch)).map_err(|_| {
                MhtmlError::Encode(format!(
                    "character U+{:04X} is outside the encodable range",
                    u32::from(ch)
                ))
            })
        })
        .collect()
}
