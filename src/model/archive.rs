//! The parsed archive: root document location plus every part, addressable
//! by `Content-Location` and by `Content-ID`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::asset::Asset;
use crate::error::{MhtmlError, Result};

/// Document-level headers of an MHTML file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchiveHeaders {
    /// `Subject`, RFC 2047 encoded-words decoded. Browsers store the page title here.
    pub subject: Option<String>,
    pub from: Option<String>,
    /// Parsed `Date` header.
    pub date: Option<DateTime<Utc>>,
    /// `Snapshot-Content-Location`, the page URL at capture time.
    pub snapshot_location: Option<String>,
    /// Media type of the whole document, normally `multipart/related`.
    pub content_type: Option<String>,
    /// Multipart boundary, unquoted.
    pub boundary: String,
}

/// A fully parsed MHTML archive.
///
/// Parts are stored once, in document order; `media` and `frames` index into
/// them. `media` keeps the first part seen for each location, `frames` every
/// part that declares an id.
#[derive(Debug, Clone)]
pub struct Archive {
    headers: ArchiveHeaders,
    index: String,
    index_part: usize,
    assets: Vec<Asset>,
    media: HashMap<String, usize>,
    frames: HashMap<String, usize>,
}

impl Archive {
    /// Content-location of the root HTML document.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The root HTML document.
    pub fn index_asset(&self) -> &Asset {
        &self.assets[self.index_part]
    }

    pub fn headers(&self) -> &ArchiveHeaders {
        &self.headers
    }

    /// Look up a part by `Content-Location`.
    pub fn media(&self, location: &str) -> Option<&Asset> {
        self.media.get(location).map(|&i| &self.assets[i])
    }

    /// Look up a part by `Content-ID`. Accepts the bare id, the id in angle
    /// brackets, or a `cid:` URL.
    pub fn frame(&self, id: &str) -> Option<&Asset> {
        let id = id.strip_prefix("cid:").unwrap_or(id);
        let id = id.trim().trim_start_matches('<').trim_end_matches('>');
        self.frames.get(id).map(|&i| &self.assets[i])
    }

    /// Every content id with a registered part.
    pub fn frame_ids(&self) -> impl Iterator<Item = &str> {
        self.frames.keys().map(String::as_str)
    }

    /// All parts in document order, including ones shadowed by an earlier
    /// part with the same location.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Number of parts, shadowed ones included.
    pub fn part_count(&self) -> usize {
        self.assets.len()
    }
}

/// Incrementally assembles an [`Archive`] while the parser walks the parts.
#[derive(Debug, Default)]
pub(crate) struct ArchiveBuilder {
    headers: ArchiveHeaders,
    index: Option<(String, usize)>,
    assets: Vec<Asset>,
    media: HashMap<String, usize>,
    frames: HashMap<String, usize>,
}

impl ArchiveBuilder {
    pub fn new(headers: ArchiveHeaders) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Register a finished part and return its slot.
    pub fn push(&mut self, asset: Asset) -> usize {
        let slot = self.assets.len();

        if let Some(id) = &asset.content_id {
            self.frames.insert(id.clone(), slot);
        }

        if let Some(location) = &asset.content_location {
            if self.media.contains_key(location) {
                warn!(location = %location, "Duplicate Content-Location, keeping the first part");
            } else {
                self.media.insert(location.clone(), slot);
            }
            if self.index.is_none() && asset.is_html() {
                self.index = Some((location.clone(), slot));
            }
        }

        debug!(
            slot,
            key = asset.key(),
            mime_type = %asset.mime_type,
            encoding = %asset.encoding,
            "Registered part"
        );
        self.assets.push(asset);
        slot
    }

    /// Mutable access to a registered part, used while its body is read.
    pub fn asset_mut(&mut self, slot: usize) -> &mut Asset {
        &mut self.assets[slot]
    }

    /// Hand out the root document part, consuming the builder.
    pub fn into_index_asset(mut self) -> Option<Asset> {
        let (_, slot) = self.index?;
        Some(self.assets.swap_remove(slot))
    }

    pub fn finish(self, line: usize) -> Result<Archive> {
        let Some((index, index_part)) = self.index else {
            return Err(MhtmlError::parse("Index not found", line));
        };
        Ok(Archive {
            headers: self.headers,
            index,
            index_part,
            assets: self.assets,
            media: self.media,
            frames: self.frames,
        })
    }
}

/// A loosely-typed archive assembled by a caller rather than by the parser.
///
/// Every field is optional so that incomplete values can be represented;
/// converting to an [`Archive`] validates the shape. `ArchiveShape::default()`
/// is the empty object.
#[derive(Debug, Clone, Default)]
pub struct ArchiveShape {
    pub frames: Option<HashMap<String, Asset>>,
    pub media: Option<HashMap<String, Asset>>,
    pub index: Option<String>,
    pub headers: Option<ArchiveHeaders>,
}

impl ArchiveShape {
    /// Build a shape from loose parts. The first HTML part with a location
    /// becomes the index and the first part per location wins, as in a
    /// parsed archive.
    pub fn from_parts(parts: Vec<Asset>) -> Self {
        let index = parts
            .iter()
            .find(|a| a.is_html())
            .and_then(|a| a.content_location.clone());
        let mut media = HashMap::new();
        let mut frames = HashMap::new();
        for part in parts {
            if let Some(id) = &part.content_id {
                frames.insert(id.clone(), part.clone());
            }
            if let Some(location) = &part.content_location {
                media.entry(location.clone()).or_insert(part);
            }
        }
        Self {
            frames: Some(frames),
            media: Some(media),
            index,
            headers: None,
        }
    }
}

impl TryFrom<ArchiveShape> for Archive {
    type Error = MhtmlError;

    fn try_from(shape: ArchiveShape) -> Result<Self> {
        let frames = shape.frames.ok_or(MhtmlError::InvalidArchive("frames"))?;
        let media = shape.media.ok_or(MhtmlError::InvalidArchive("media"))?;
        let index = shape.index.ok_or(MhtmlError::InvalidArchive("index"))?;
        if !media.get(&index).is_some_and(Asset::is_html) {
            return Err(MhtmlError::InvalidArchive("index"));
        }

        let mut assets = Vec::with_capacity(media.len() + frames.len());
        let mut media_slots = HashMap::with_capacity(media.len());
        let mut frame_slots = HashMap::with_capacity(frames.len());
        let mut index_part = 0;

        for (location, asset) in media {
            if location == index {
                index_part = assets.len();
            }
            media_slots.insert(location, assets.len());
            assets.push(asset);
        }
        for (id, asset) in frames {
            let id = id.trim_start_matches('<').trim_end_matches('>').to_string();
            frame_slots.insert(id, assets.len());
            assets.push(asset);
        }

        Ok(Archive {
            headers: shape.headers.unwrap_or_default(),
            index,
            index_part,
            assets,
            media: media_slots,
            frames: frame_slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::asset::TransferEncoding;

    fn html(location: &str, body: &str) -> Asset {
        Asset::new("text/html", TransferEncoding::QuotedPrintable)
            .with_location(location)
            .with_data(body)
    }

    #[test]
    fn test_builder_first_wins() {
        let mut builder = ArchiveBuilder::default();
        builder.push(html("http://a/", "first"));
        builder.push(html("http://a/", "second"));
        let archive = builder.finish(10).unwrap();
        assert_eq!(archive.part_count(), 2);
        assert_eq!(archive.media("http://a/").unwrap().data, "first");
        assert_eq!(archive.index(), "http://a/");
        assert_eq!(archive.index_asset().data, "first");
    }

    #[test]
    fn test_builder_without_index() {
        let err = ArchiveBuilder::default().finish(3).unwrap_err();
        assert_eq!(err.to_string(), "Index not found; Line 3");
    }

    #[test]
    fn test_frame_lookup_forms() {
        let mut builder = ArchiveBuilder::default();
        builder.push(html("http://a/", "root"));
        builder.push(
            Asset::new("text/html", TransferEncoding::QuotedPrintable)
                .with_id("frame-1@mhtml.blink")
                .with_data("inner"),
        );
        let archive = builder.finish(1).unwrap();
        assert!(archive.frame("frame-1@mhtml.blink").is_some());
        assert!(archive.frame("<frame-1@mhtml.blink>").is_some());
        assert!(archive.frame("cid:frame-1@mhtml.blink").is_some());
        assert!(archive.frame("cid:missing").is_none());
    }

    #[test]
    fn test_shape_empty_object() {
        let err = Archive::try_from(ArchiveShape::default()).unwrap_err();
        assert_eq!(err.to_string(), "MHTML error: invalid frames");
    }

    #[test]
    fn test_shape_missing_media_and_index() {
        let shape = ArchiveShape {
            frames: Some(HashMap::new()),
            ..ArchiveShape::default()
        };
        let err = Archive::try_from(shape.clone()).unwrap_err();
        assert_eq!(err.to_string(), "MHTML error: invalid media");

        let shape = ArchiveShape {
            media: Some(HashMap::new()),
            ..shape
        };
        let err = Archive::try_from(shape).unwrap_err();
        assert_eq!(err.to_string(), "MHTML error: invalid index");
    }

    #[test]
    fn test_shape_index_must_be_html() {
        let mut media = HashMap::new();
        media.insert(
            "http://a/style.css".to_string(),
            Asset::new("text/css", TransferEncoding::QuotedPrintable).with_data(""),
        );
        let shape = ArchiveShape {
            frames: Some(HashMap::new()),
            media: Some(media),
            index: Some("http://a/style.css".to_string()),
            headers: None,
        };
        let err = Archive::try_from(shape).unwrap_err();
        assert_eq!(err.to_string(), "MHTML error: invalid index");
    }

    #[test]
    fn test_shape_from_parts() {
        let shape = ArchiveShape::from_parts(vec![
            Asset::new("image/png", TransferEncoding::Base64)
                .with_location("http://a/x.png")
                .with_data("Zm9v"),
            html("http://a/", "first"),
            html("http://a/", "second"),
            html("http://a/frame", "inner").with_id("f1"),
        ]);
        assert_eq!(shape.index.as_deref(), Some("http://a/"));
        let archive = Archive::try_from(shape).unwrap();
        assert_eq!(archive.index_asset().data, "first");
        assert_eq!(archive.frame("cid:f1").unwrap().data, "inner");
        assert!(archive.media("http://a/x.png").unwrap().is_image());
    }

    #[test]
    fn test_shape_valid() {
        let mut media = HashMap::new();
        media.insert("http://a/".to_string(), html("http://a/", "<p>hi</p>"));
        let shape = ArchiveShape {
            frames: Some(HashMap::new()),
            media: Some(media),
            index: Some("http://a/".to_string()),
            headers: None,
        };
        let archive = Archive::try_from(shape).unwrap();
        assert_eq!(archive.index_asset().data, "<p>hi</p>");
    }
}
