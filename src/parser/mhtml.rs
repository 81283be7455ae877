//! MHTML archive parser.
//!
//! A four-state machine (`Headers → Content → Data → End`) driven over a
//! [`LineCursor`]. The whole archive is held in memory; the parser never
//! backtracks past the current line.
//!
//! Every structural violation is fatal and carries the line number at which
//! it was detected. Callers get either a complete [`Archive`] or an error.

use markup5ever_rcdom::RcDom;
use tracing::{debug, warn};

use super::cursor::LineCursor;
use super::header::{is_blank, strip_angle_brackets, HeaderBlock};
use crate::codec::quoted_printable;
use crate::error::{MhtmlError, Result};
use crate::inline::dom::HtmlParser;
use crate::model::archive::ArchiveBuilder;
use crate::model::{Archive, Asset, TransferEncoding};

/// Parser state. Header states own the block being accumulated, `Data` the
/// slot of the part whose body is being read.
#[derive(Debug)]
enum State {
    Headers(HeaderBlock),
    Content(HeaderBlock),
    Data(usize),
    End,
}

/// Streaming state machine over one archive.
pub struct MhtmlParser<'a> {
    cursor: LineCursor<'a>,
    state: State,
    boundary: String,
    builder: ArchiveBuilder,
}

impl<'a> MhtmlParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            cursor: LineCursor::new(text),
            state: State::Headers(HeaderBlock::new()),
            boundary: String::new(),
            builder: ArchiveBuilder::default(),
        }
    }

    /// Run to completion and return the archive.
    pub fn parse(mut self) -> Result<Archive> {
        while !matches!(self.state, State::End) {
            self.step()?;
        }
        self.builder.finish(self.cursor.line())
    }

    /// Run only until the root HTML part has been decoded and return it.
    pub fn parse_index(mut self) -> Result<Asset> {
        while !matches!(self.state, State::End) {
            if self.step()?.is_some() && self.builder.has_index() {
                break;
            }
        }
        let line = self.cursor.line();
        self.builder
            .into_index_asset()
            .ok_or_else(|| MhtmlError::parse("Index not found", line))
    }

    /// Advance the machine by one line (or one part body, in `Data`).
    ///
    /// Returns the slot of the part whose body was just completed, if any.
    fn step(&mut self) -> Result<Option<usize>> {
        match std::mem::replace(&mut self.state, State::End) {
            State::Headers(headers) => self.read_document_headers(headers).map(|_| None),
            State::Content(headers) => self.read_part_headers(headers).map(|_| None),
            State::Data(slot) => self.read_part_body(slot).map(Some),
            State::End => Ok(None),
        }
    }

    fn read_document_headers(&mut self, mut headers: HeaderBlock) -> Result<()> {
        let line = self.cursor.next_line()?;
        if !is_blank(line) {
            headers.push_line(line, self.cursor.line())?;
            self.state = State::Headers(headers);
            return Ok(());
        }

        let blank_line = self.cursor.line();
        let boundary = match headers.boundary() {
            Some(boundary) => boundary,
            None if headers.get("content-type").is_none() => {
                return Err(MhtmlError::parse("Missing document content type", blank_line));
            }
            None => {
                return Err(MhtmlError::parse(
                    "Missing boundary from document headers",
                    blank_line,
                ));
            }
        };

        self.cursor.skip_whitespace()?;
        let first = self.cursor.next_line()?;
        if !first.contains(boundary.as_str()) {
            return Err(MhtmlError::parse("Expected boundary", self.cursor.line()));
        }

        debug!(boundary = %boundary, line = self.cursor.line(), "Document headers read");
        self.builder = ArchiveBuilder::new(headers.to_archive_headers(boundary.clone()));
        self.boundary = boundary;
        self.state = State::Content(HeaderBlock::new());
        Ok(())
    }

    fn read_part_headers(&mut self, mut headers: HeaderBlock) -> Result<()> {
        let line = self.cursor.next_line()?;
        if !is_blank(line) {
            headers.push_line(line, self.cursor.line())?;
            self.state = State::Content(headers);
            return Ok(());
        }

        let line = self.cursor.line();
        let mime_type = headers.media_type();
        let encoding = headers.get("content-transfer-encoding");
        let id = headers
            .get("content-id")
            .map(strip_angle_brackets)
            .filter(|id| !id.is_empty());
        let location = headers
            .get("content-location")
            .filter(|location| !location.is_empty())
            .map(String::from);

        // The first part is the document itself.
        if !self.builder.has_index()
            && (location.is_none() || mime_type.as_deref() != Some("text/html"))
        {
            return Err(MhtmlError::parse("Index not found", line));
        }
        if id.is_none() && location.is_none() {
            return Err(MhtmlError::parse("ID or location header not provided", line));
        }
        let Some(encoding) = encoding else {
            return Err(MhtmlError::parse("Content-Transfer-Encoding not provided", line));
        };
        let Some(mime_type) = mime_type else {
            return Err(MhtmlError::parse("Content-Type not provided", line));
        };

        let mut asset = Asset::new(mime_type, TransferEncoding::from_header(encoding));
        asset.content_id = id;
        asset.content_location = location;
        let slot = self.builder.push(asset);

        self.cursor.skip_whitespace()?;
        self.state = State::Data(slot);
        Ok(())
    }

    fn read_part_body(&mut self, slot: usize) -> Result<usize> {
        let encoding = self.builder.asset_mut(slot).encoding.clone();
        let mut body: Vec<u8> = Vec::new();

        let delimiter = loop {
            let line = self.cursor.next_line()?;
            if line.contains(self.boundary.as_str()) {
                break line;
            }
            match encoding {
                TransferEncoding::QuotedPrintable => {
                    body.extend_from_slice(&quoted_printable::decode(line));
                }
                TransferEncoding::Base64 => body.extend_from_slice(line.trim().as_bytes()),
                TransferEncoding::Identity(_) => body.extend_from_slice(line.as_bytes()),
            }
        };

        let asset = self.builder.asset_mut(slot);
        if !asset.set_body(body) {
            warn!(
                part = asset.key(),
                line = self.cursor.line(),
                "Part body is not valid UTF-8, keeping raw bytes"
            );
        }

        let closing = delimiter.trim() == format!("--{}--", self.boundary);
        self.state = if closing || self.cursor.only_whitespace_left() {
            debug!(line = self.cursor.line(), "End of archive");
            State::End
        } else {
            State::Content(HeaderBlock::new())
        };
        Ok(slot)
    }
}

/// Parse a complete archive.
pub fn parse(text: &str) -> Result<Archive> {
    MhtmlParser::new(text).parse()
}

/// Parse only the root HTML part and return it as a document, skipping all
/// later parts. No resources are inlined.
pub fn parse_html_only(text: &str, html: &dyn HtmlParser) -> Result<RcDom> {
    let index = MhtmlParser::new(text).parse_index()?;
    Ok(html.parse_html(&index.text()))
}
