//! A single decoded MIME part of an archive.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::fmt;

use serde::Serialize;

use crate::codec::base64;
use crate::error::Result;

/// `Content-Transfer-Encoding` of a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferEncoding {
    QuotedPrintable,
    Base64,
    /// `7bit`, `8bit`, `binary` or anything unrecognised; the body is taken
    /// verbatim.
    Identity(String),
}

impl TransferEncoding {
    /// Interpret a header value (case-insensitive).
    pub fn from_header(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("quoted-printable") {
            Self::QuotedPrintable
        } else if value.eq_ignore_ascii_case("base64") {
            Self::Base64
        } else {
            Self::Identity(value.to_ascii_lowercase())
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotedPrintable => f.write_str("quoted-printable"),
            Self::Base64 => f.write_str("base64"),
            Self::Identity(name) => f.write_str(name),
        }
    }
}

/// How [`Asset::data`] relates to the bytes that were transfer-decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyText {
    /// The body was valid UTF-8 and `data` is that text.
    Utf8,
    /// The body was not valid UTF-8; every byte became one character in
    /// U+0000..=U+00FF.
    Latin1,
}

/// One MIME part's decoded payload.
///
/// Immutable once parsing completes, apart from the stylesheet cache: the
/// first time a `text/css` asset is inlined its `url(...)` references are
/// rewritten once and the result is kept in [`Asset::resolved_css`] for the
/// rest of the archive's lifetime.
#[derive(Debug, Clone)]
pub struct Asset {
    /// `Content-ID` without the surrounding angle brackets.
    pub content_id: Option<String>,
    /// `Content-Location`, the URL this part was captured from.
    pub content_location: Option<String>,
    /// Lower-cased media type without parameters (e.g. `text/html`).
    pub mime_type: String,
    pub encoding: TransferEncoding,
    /// Transfer-decoded body. For base64 parts this is the base64 text itself
    /// with line breaks removed.
    pub data: String,
    pub body_text: BodyText,
    resolved_css: OnceCell<String>,
}

impl Asset {
    /// Create an asset with an empty body.
    pub fn new(mime_type: impl Into<String>, encoding: TransferEncoding) -> Self {
        Self {
            content_id: None,
            content_location: None,
            mime_type: mime_type.into(),
            encoding,
            data: String::new(),
            body_text: BodyText::Utf8,
            resolved_css: OnceCell::new(),
        }
    }

    /// Builder-style setter for the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.content_location = Some(location.into());
        self
    }

    /// Builder-style setter for the content id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.content_id = Some(id.into());
        self
    }

    /// Builder-style setter for a UTF-8 body.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self.body_text = BodyText::Utf8;
        self
    }

    /// Store a transfer-decoded body, falling back to one character per byte
    /// when it is not valid UTF-8. Returns `false` on fallback.
    pub fn set_body(&mut self, bytes: Vec<u8>) -> bool {
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.data = text;
                self.body_text = BodyText::Utf8;
                true
            }
            Err(e) => {
                self.data = e.into_bytes().into_iter().map(char::from).collect();
                self.body_text = BodyText::Latin1;
                false
            }
        }
    }

    pub fn is_html(&self) -> bool {
        self.mime_type == "text/html"
    }

    pub fn is_css(&self) -> bool {
        self.mime_type == "text/css"
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.contains("image")
    }

    /// The body as bytes at transfer level: UTF-8 text as-is, a Latin-1
    /// fallback body mapped back to its original bytes.
    ///
    /// Fails when a Latin-1 body holds a character wider than one byte.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self.body_text {
            BodyText::Utf8 => Ok(Cow::Borrowed(self.data.as_bytes())),
            BodyText::Latin1 => base64::latin1_bytes(&self.data).map(Cow::Owned),
        }
    }

    /// The original payload bytes, undoing base64 where needed.
    pub fn decoded_bytes(&self) -> Result<Vec<u8>> {
        match self.encoding {
            TransferEncoding::Base64 => base64::decode(&self.data),
            _ => self.bytes().map(Cow::into_owned),
        }
    }

    /// The body as text. Base64 bodies are decoded and read as UTF-8; a
    /// body that is not valid base64 is returned as stored.
    pub fn text(&self) -> Cow<'_, str> {
        match self.encoding {
            TransferEncoding::Base64 => match base64::decode(&self.data) {
                Ok(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
                Err(_) => Cow::Borrowed(&self.data),
            },
            _ => Cow::Borrowed(&self.data),
        }
    }

    /// Size of the decoded payload in bytes, best effort.
    pub fn size(&self) -> usize {
        match self.encoding {
            TransferEncoding::Base64 => self.data.len() / 4 * 3,
            _ => self.data.len(),
        }
    }

    /// The rewritten stylesheet, computing it on first use.
    pub fn resolved_css(&self, rewrite: impl FnOnce(&str) -> String) -> &str {
        self.resolved_css.get_or_init(|| rewrite(&self.text()))
    }

    /// Whether the stylesheet rewrite has already been cached.
    pub fn is_css_resolved(&self) -> bool {
        self.resolved_css.get().is_some()
    }

    /// Either the location or the id, for logs and listings.
    pub fn key(&self) -> &str {
        self.content_location
            .as_deref()
            .or(self.content_id.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_from_header() {
        assert_eq!(
            TransferEncoding::from_header("Quoted-Printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::from_header(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::from_header("8Bit"),
            TransferEncoding::Identity("8bit".to_string())
        );
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_set_body_utf8() {
        let mut asset = Asset::new("text/html", TransferEncoding::QuotedPrintable);
        assert!(asset.set_body("héllo".as_bytes().to_vec()));
        assert_eq!(asset.data, "héllo");
        assert_eq!(asset.body_text, BodyText::Utf8);
    }

    #[test]
    fn test_set_body_latin1_fallback_roundtrips_bytes() {
        let raw = vec![0x89, b'P', b'N', b'G', 0xff, 0x00];
        let mut asset = Asset::new("image/png", TransferEncoding::Identity("binary".into()));
        assert!(!asset.set_body(raw.clone()));
        assert_eq!(asset.body_text, BodyText::Latin1);
        assert_eq!(asset.bytes().unwrap().as_ref(), raw.as_slice());
    }

    #[test]
    fn test_decoded_bytes_base64() {
        let asset = Asset::new("image/png", TransferEncoding::Base64).with_data("Zm9v");
        assert_eq!(asset.decoded_bytes().unwrap(), b"foo");
        assert_eq!(asset.size(), 3);
    }

    #[test]
    fn test_text_decodes_base64_bodies() {
        let html = Asset::new("text/html", TransferEncoding::Base64).with_data("PHA+aGk8L3A+");
        assert_eq!(html.text(), "<p>hi</p>");

        let broken = Asset::new("text/html", TransferEncoding::Base64).with_data("<p>");
        assert_eq!(broken.text(), "<p>");

        let plain = Asset::new("text/css", TransferEncoding::QuotedPrintable).with_data("a{}");
        assert!(matches!(plain.text(), Cow::Borrowed("a{}")));
    }

    #[test]
    fn test_resolved_css_is_computed_once() {
        let asset = Asset::new("text/css", TransferEncoding::QuotedPrintable)
            .with_data("a { color: red }");
        assert!(!asset.is_css_resolved());
        let first = asset.resolved_css(|css| css.to_uppercase()).to_string();
        let second = asset.resolved_css(|_| unreachable!("cached"));
        assert_eq!(first, "A { COLOR: RED }");
        assert_eq!(second, first);
        assert!(asset.is_css_resolved());
    }

    #[test]
    fn test_media_type_predicates() {
        let asset = Asset::new("image/svg+xml", TransferEncoding::QuotedPrintable);
        assert!(asset.is_image());
        assert!(!asset.is_css());
        assert!(!asset.is_html());
    }
}
