//! Turn an archive into one self-contained HTML document.
//!
//! The root document is parsed into a DOM and walked breadth-first. Per
//! element: `integrity` is dropped, `<head>` gets a `<base target>`,
//! stylesheet `<link>`s become `<style>` blocks, image sources become
//! `data:` URIs, and every `url(...)` in `<style>` text or `style`
//! attributes is inlined. With `convert_iframes`, `cid:` frames are
//! converted recursively and embedded as HTML `data:` URIs.

use std::collections::VecDeque;

use markup5ever_rcdom::{Handle, RcDom};
use tracing::{debug, warn};

use super::dom::{self, Html5everParser, HtmlParser};
use super::{css, embed, resolver};
use crate::codec::base64::{self, Base64Encode};
use crate::error::Result;
use crate::model::{Archive, ArchiveShape, Asset};
use crate::parser;

/// Frames nested deeper than this are left as `cid:` references.
const MAX_FRAME_DEPTH: usize = 8;

/// Options recognized by the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Inline `cid:` frames as `data:text/html` URIs.
    pub convert_iframes: bool,
    /// Target of the `<base>` inserted into `<head>`; `None` inserts nothing.
    pub base_target: Option<String>,
    /// Drop `integrity` from every element.
    pub strip_integrity: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            convert_iframes: false,
            base_target: Some("_parent".to_string()),
            strip_integrity: true,
        }
    }
}

/// What [`Converter::convert`] accepts.
#[derive(Debug, Clone)]
pub enum MhtmlInput<'a> {
    /// Raw archive text, parsed on entry.
    Raw(&'a str),
    /// An archive returned by [`parser::parse`].
    Parsed(&'a Archive),
    /// A caller-assembled archive, validated on entry.
    Shape(ArchiveShape),
}

impl<'a> From<&'a str> for MhtmlInput<'a> {
    fn from(text: &'a str) -> Self {
        MhtmlInput::Raw(text)
    }
}

impl<'a> From<&'a String> for MhtmlInput<'a> {
    fn from(text: &'a String) -> Self {
        MhtmlInput::Raw(text)
    }
}

impl<'a> From<&'a Archive> for MhtmlInput<'a> {
    fn from(archive: &'a Archive) -> Self {
        MhtmlInput::Parsed(archive)
    }
}

impl From<ArchiveShape> for MhtmlInput<'_> {
    fn from(shape: ArchiveShape) -> Self {
        MhtmlInput::Shape(shape)
    }
}

/// Resource inliner with its HTML parsing and base64 capabilities injected.
pub struct Converter {
    options: ConvertOptions,
    parser: Box<dyn HtmlParser>,
    encoder: Box<dyn Base64Encode>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Converter {
    /// A converter using html5ever and the standard base64 alphabet.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            parser: Box::new(Html5everParser),
            encoder: base64::standard(),
        }
    }

    /// Swap the HTML parsing backend.
    pub fn with_parser(mut self, parser: impl HtmlParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Swap the base64 encoder.
    pub fn with_encoder(mut self, encoder: impl Base64Encode + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert raw text, a parsed archive, or an archive shape.
    pub fn convert<'a>(&self, input: impl Into<MhtmlInput<'a>>) -> Result<RcDom> {
        match input.into() {
            MhtmlInput::Raw(text) => self.convert_archive(&parser::parse(text)?),
            MhtmlInput::Parsed(archive) => self.convert_archive(archive),
            MhtmlInput::Shape(shape) => self.convert_archive(&Archive::try_from(shape)?),
        }
    }

    /// Convert a parsed archive's root document.
    pub fn convert_archive(&self, archive: &Archive) -> Result<RcDom> {
        debug!(index = archive.index(), parts = archive.part_count(), "Converting archive");
        self.convert_document(archive, archive.index_asset(), archive.index(), 0)
    }

    fn convert_document(
        &self,
        archive: &Archive,
        document: &Asset,
        base: &str,
        depth: usize,
    ) -> Result<RcDom> {
        let dom = self.parser.parse_html(&document.text());
        let mut queue = VecDeque::from([dom.document.clone()]);

        while let Some(parent) = queue.pop_front() {
            let children: Vec<Handle> = parent.children.borrow().clone();
            for child in children {
                let child = self.inline_node(archive, base, &parent, child, depth)?;
                queue.push_back(child);
            }
        }
        Ok(dom)
    }

    /// Apply every rewrite to one node. Returns the node that now occupies
    /// its position, which differs when a `<link>` was replaced.
    fn inline_node(
        &self,
        archive: &Archive,
        base: &str,
        parent: &Handle,
        node: Handle,
        depth: usize,
    ) -> Result<Handle> {
        let Some(name) = dom::node_name(&node).map(str::to_owned) else {
            return Ok(node);
        };
        if self.options.strip_integrity {
            dom::remove_attr(&node, "integrity");
        }

        match name.as_str() {
            "head" => self.insert_base(&node),
            "link" => {
                if let Some(style) = self.inline_stylesheet(archive, base, &node) {
                    dom::replace_child(parent, &node, style.clone());
                    return Ok(style);
                }
            }
            "style" => {
                let text = dom::text_content(&node);
                let rewritten = css::replace_references(archive, base, &text, &*self.encoder);
                if rewritten != text {
                    dom::set_text_content(&node, &rewritten);
                }
            }
            "iframe" | "frame" => {
                if self.options.convert_iframes {
                    self.inline_frame(archive, base, &node, depth)?;
                }
            }
            _ => self.inline_image(archive, base, &node),
        }

        self.inline_style_attribute(archive, base, &node);
        Ok(node)
    }

    fn insert_base(&self, head: &Handle) {
        if let Some(target) = self.options.base_target.as_deref() {
            dom::prepend_child(head, dom::create_element("base", &[("target", target)]));
        }
    }

    /// A `<style>` element carrying the linked stylesheet, if it is archived.
    fn inline_stylesheet(&self, archive: &Archive, base: &str, link: &Handle) -> Option<Handle> {
        let href = dom::get_attr(link, "href")?;
        let (location, asset) = resolver::lookup(archive, base, &href)?;
        if !asset.is_css() {
            return None;
        }

        let css = asset.resolved_css(|text| {
            debug!(stylesheet = %location, "Resolving stylesheet references");
            css::replace_references(archive, &location, text, &*self.encoder)
        });
        let style = dom::create_element("style", &[("type", "text/css")]);
        dom::set_text_content(&style, css);
        Some(style)
    }

    fn inline_image(&self, archive: &Archive, base: &str, node: &Handle) {
        let Some(src) = dom::get_attr(node, "src") else {
            return;
        };
        let Some((location, asset)) = resolver::lookup(archive, base, &src) else {
            return;
        };
        if !asset.is_image() {
            return;
        }
        match embed::image_uri(asset, &*self.encoder) {
            Ok(uri) => dom::set_attr(node, "src", &uri),
            Err(e) => warn!(src = %location, error = %e, "Could not embed image"),
        }
    }

    fn inline_frame(
        &self,
        archive: &Archive,
        base: &str,
        frame: &Handle,
        depth: usize,
    ) -> Result<()> {
        let Some(src) = dom::get_attr(frame, "src") else {
            return Ok(());
        };
        if !src.starts_with("cid:") {
            return Ok(());
        }
        let Some(asset) = archive.frame(&src).filter(|asset| asset.is_html()) else {
            debug!(src = %src, "Frame not found in archive");
            return Ok(());
        };
        if depth >= MAX_FRAME_DEPTH {
            warn!(src = %src, depth, "Frame nesting too deep, leaving reference");
            return Ok(());
        }

        let frame_base = asset.content_location.as_deref().unwrap_or(base);
        let document = self.convert_document(archive, asset, frame_base, depth + 1)?;
        let html = dom::serialize_node(&document.document)?;
        dom::set_attr(frame, "src", &embed::html_uri(&html));
        Ok(())
    }

    fn inline_style_attribute(&self, archive: &Archive, base: &str, node: &Handle) {
        let Some(style) = dom::get_attr(node, "style") else {
            return;
        };
        let rewritten = css::replace_references(archive, base, &style, &*self.encoder);
        if rewritten != style {
            dom::set_attr(node, "style", &rewritten);
        }
    }
}

/// Convert with default options.
pub fn convert<'a>(input: impl Into<MhtmlInput<'a>>) -> Result<RcDom> {
    Converter::default().convert(input)
}
