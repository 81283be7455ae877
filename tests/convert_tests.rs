//! Integration tests for archive parsing and resource inlining.

use std::collections::HashMap;
use std::path::Path;

use mhtml2html::export::html::to_html;
use mhtml2html::inline::dom::{find_elements, get_attr};
use mhtml2html::parser::read_archive;
use mhtml2html::{
    convert, parse, parse_html_only, ArchiveShape, ConvertOptions, Converter, MhtmlError,
};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> String {
    read_archive(fixture(name)).unwrap()
}

// ─── Test 1: Image inlined as base64 data URI ───────────────────────

#[test]
fn test_simple_image_inlined() {
    let dom = convert(load("simple.mhtml").as_str()).unwrap();
    let img = &find_elements(&dom.document, "img")[0];
    assert_eq!(
        get_attr(img, "src").as_deref(),
        Some("data:image/png;base64,Zm9v")
    );
}

// ─── Test 2: Document headers ───────────────────────────────────────

#[test]
fn test_simple_headers() {
    let archive = parse(&load("simple.mhtml")).unwrap();
    let headers = archive.headers();
    assert_eq!(headers.subject.as_deref(), Some("Example Domain"));
    assert_eq!(headers.from.as_deref(), Some("<Saved by Blink>"));
    assert_eq!(headers.snapshot_location.as_deref(), Some("http://example.com/"));
    assert_eq!(headers.content_type.as_deref(), Some("multipart/related"));
    assert_eq!(headers.boundary, "XYZ");
    let date = headers.date.unwrap();
    assert_eq!(date.to_rfc3339(), "2026-10-17T10:15:00+00:00");
}

// ─── Test 3: Index is the first HTML part ───────────────────────────

#[test]
fn test_index_is_first_html_part() {
    let archive = parse(&load("page.mhtml")).unwrap();
    assert_eq!(archive.index(), "https://blog.example.org/posts/hello.html");
    assert_eq!(archive.part_count(), 8);
    assert!(archive.media("https://blog.example.org/posts/second.html").is_some());
    assert!(archive.index_asset().data.contains("Hello caf\u{e9}"));
}

// ─── Test 4: First part wins for a shared location ──────────────────

#[test]
fn test_first_wins() {
    let archive = parse(&load("page.mhtml")).unwrap();
    let logo = archive.media("https://blog.example.org/img/logo.png").unwrap();
    assert_eq!(logo.data, "bG9nbzE=");
    assert_eq!(logo.decoded_bytes().unwrap(), b"logo1");
    // The shadowed part is still listed.
    assert!(archive.assets().iter().any(|a| a.data == "c2Vjb25k"));
}

// ─── Test 5: Frames indexed by Content-ID ───────────────────────────

#[test]
fn test_frames_by_content_id() {
    let archive = parse(&load("page.mhtml")).unwrap();
    let child = archive.frame("cid:frame-child@mhtml.blink").unwrap();
    assert!(child.is_html());
    assert_eq!(child.content_location, None);
    assert!(archive.frame("<frame-main@mhtml.blink>").is_some());
    assert_eq!(archive.frame_ids().count(), 2);
}

// ─── Test 6: Full page conversion ───────────────────────────────────

#[test]
fn test_page_conversion() {
    let dom = convert(load("page.mhtml").as_str()).unwrap();
    let html = to_html(&dom).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<head><base target=\"_parent\">"));
    assert!(!html.contains("integrity"));
    assert!(!html.contains("<link"));
    assert!(html.contains("<style type=\"text/css\">@charset \"utf-8\";"));
    assert!(html.contains("url('data:image/png;base64,iVBORw0KGgo=') repeat"));
    assert!(html.contains("style=\"background: url('data:image/png;base64,YmFubmVy')\""));
    assert!(html.contains("Hello caf\u{e9}"));

    let images = find_elements(&dom.document, "img");
    assert_eq!(
        get_attr(&images[0], "src").as_deref(),
        Some("data:image/png;base64,bG9nbzE=")
    );
    assert_eq!(
        get_attr(&images[1], "src").as_deref(),
        Some("https://cdn.example.net/remote.png")
    );
}

// ─── Test 7: Iframes ────────────────────────────────────────────────

#[test]
fn test_iframe_kept_as_cid_by_default() {
    let dom = convert(load("page.mhtml").as_str()).unwrap();
    let iframe = &find_elements(&dom.document, "iframe")[0];
    assert!(get_attr(iframe, "src").unwrap().starts_with("cid"));
}

#[test]
fn test_iframe_converted_when_enabled() {
    let converter = Converter::new(ConvertOptions {
        convert_iframes: true,
        ..ConvertOptions::default()
    });
    let archive = parse(&load("page.mhtml")).unwrap();
    let dom = converter.convert(&archive).unwrap();
    let iframe = &find_elements(&dom.document, "iframe")[0];
    let src = get_attr(iframe, "src").unwrap();
    assert!(src.starts_with("data:text/html;charset=utf-8,"));

    let inner = urlencoding::decode(&src["data:text/html;charset=utf-8,".len()..])
        .unwrap()
        .into_owned();
    assert!(inner.contains("<p>inner</p>"));
    assert!(inner.contains("data:image/png;base64,bG9nbzE="));
}

// ─── Test 8: Missing transfer encoding ──────────────────────────────

#[test]
fn test_missing_transfer_encoding() {
    let err = parse(&load("missing_encoding.mhtml")).unwrap_err();
    assert_eq!(err.to_string(), "Content-Transfer-Encoding not provided; Line 12");
    assert_eq!(err.line(), Some(12));

    let err = convert(load("missing_encoding.mhtml").as_str()).err().unwrap();
    assert!(matches!(err, MhtmlError::Parse { line: 12, .. }));
}

// ─── Test 9: Empty archive shape ────────────────────────────────────

#[test]
fn test_empty_shape_rejected() {
    let err = convert(ArchiveShape::default()).err().unwrap();
    assert_eq!(err.to_string(), "MHTML error: invalid frames");

    let err = convert(ArchiveShape {
        frames: Some(HashMap::new()),
        media: Some(HashMap::new()),
        index: Some("http://a/".to_string()),
        headers: None,
    })
    .err().unwrap();
    assert_eq!(err.to_string(), "MHTML error: invalid index");
}

// ─── Test 10: Boundary enforcement ──────────────────────────────────

#[test]
fn test_missing_boundary_line_number() {
    let text = "From: <Saved by Blink>\r\nSubject: x\r\nContent-Type: multipart/related;\r\n\ttype=\"text/html\"\r\n\r\n--XYZ\r\n";
    let err = parse(text).unwrap_err();
    assert_eq!(err.to_string(), "Missing boundary from document headers; Line 5");
}

// ─── Test 11: HTML-only mode ────────────────────────────────────────

#[test]
fn test_parse_html_only() {
    let truncated = load("page.mhtml")
        .split("Content-Location: https://blog.example.org/static/site.css")
        .next()
        .unwrap()
        .to_string();
    // Full parsing fails on the cut-off archive, HTML-only mode does not.
    assert!(parse(&truncated).is_err());

    let dom = parse_html_only(&truncated, &mhtml2html::inline::Html5everParser).unwrap();
    let html = to_html(&dom).unwrap();
    assert!(html.contains("href=\"../static/site.css\""));
    assert!(html.contains("integrity=\"sha384-deadbeef\""));
}

// ─── Test 12: Converting twice reuses the resolved stylesheet ───────

#[test]
fn test_stylesheet_memoized_per_archive() {
    let archive = parse(&load("page.mhtml")).unwrap();
    let css = archive.media("https://blog.example.org/static/site.css").unwrap();
    assert!(!css.is_css_resolved());

    let first = to_html(&convert(&archive).unwrap()).unwrap();
    assert!(css.is_css_resolved());
    let second = to_html(&convert(&archive).unwrap()).unwrap();
    assert_eq!(first, second);
    // The stored body itself is untouched.
    assert!(css.data.contains("url(\"../img/bg.png\")"));
}
