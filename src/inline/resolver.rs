//! Resolve references found in documents and stylesheets to archive keys.
//!
//! MHTML producers disagree on whether a `Content-Location` names a file or
//! a directory, so a path-relative reference is tried twice: first against
//! the base's parent directory, then against the base itself. Neither answer
//! is authoritative; the first one present in the archive wins.

use url::Url;

use crate::model::{Archive, Asset};

/// Resolve `reference` against `base`, treating the last segment of `base`
/// as a file name.
pub fn resolve(base: &str, reference: &str) -> String {
    resolve_with(base, reference, true)
}

/// Resolve `reference` against `base`, treating `base` itself as a directory.
pub fn resolve_as_directory(base: &str, reference: &str) -> String {
    resolve_with(base, reference, false)
}

/// Whether the reference carries a scheme (`http:`, `data:`, `cid:`, ...).
pub fn has_scheme(reference: &str) -> bool {
    let Some(colon) = reference.find(':') else {
        return false;
    };
    let scheme = &reference[..colon];
    let mut chars = scheme.chars();
    // Single letters are drive letters, not schemes.
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn resolve_with(base: &str, reference: &str, drop_last: bool) -> String {
    if has_scheme(reference) {
        return reference.to_string();
    }

    if let Some(rest) = reference.strip_prefix("//") {
        return match scheme_of(base) {
            Some(scheme) => format!("{scheme}://{rest}"),
            None => reference.to_string(),
        };
    }

    if reference.starts_with('/') {
        return format!("{}{}", origin_of(base), reference);
    }

    join_segments(strip_query(base), reference, drop_last)
}

fn scheme_of(base: &str) -> Option<&str> {
    base.find("://").map(|i| &base[..i])
}

/// `scheme://host[:port]` of the base, or an empty string for bare paths.
fn origin_of(base: &str) -> String {
    if let Ok(url) = Url::parse(base) {
        let origin = url.origin();
        if origin.is_tuple() {
            return origin.ascii_serialization();
        }
    }
    // Opaque origins (file:, custom schemes) keep everything up to the path.
    match base.find("://") {
        Some(i) => {
            let after = i + 3;
            match base[after..].find('/') {
                Some(slash) => base[..after + slash].to_string(),
                None => base.to_string(),
            }
        }
        None => String::new(),
    }
}

fn strip_query(base: &str) -> &str {
    let end = base.find(['?', '#']).unwrap_or(base.len());
    &base[..end]
}

fn join_segments(base: &str, reference: &str, drop_last: bool) -> String {
    let mut segments: Vec<&str> = base.split('/').collect();
    // `scheme:`, ``, `host` are never popped.
    let floor = if base.contains("://") { 3 } else { 0 };

    if (drop_last || segments.last() == Some(&"")) && segments.len() > floor {
        segments.pop();
    }

    let parts: Vec<&str> = reference.split('/').collect();
    let last = parts.len() - 1;
    for (i, part) in parts.into_iter().enumerate() {
        match part {
            "." => {}
            "" if i != last => {}
            ".." => {
                if segments.len() > floor {
                    segments.pop();
                }
            }
            _ => segments.push(part),
        }
    }

    segments.join("/")
}

/// Find the asset a reference points at.
///
/// Tries, in order: the reference as an exact key, `cid:` frames, the
/// resolved location, and the directory-style fallback. Fragments are
/// ignored. Returns the matched key along with the asset.
pub fn lookup<'a>(archive: &'a Archive, base: &str, reference: &str) -> Option<(String, &'a Asset)> {
    let reference = reference.trim();
    let reference = match reference.find('#') {
        Some(i) => &reference[..i],
        None => reference,
    };
    if reference.is_empty() {
        return None;
    }

    if let Some(asset) = archive.media(reference) {
        return Some((reference.to_string(), asset));
    }
    if reference.starts_with("cid:") {
        return archive.frame(reference).map(|a| (reference.to_string(), a));
    }
    if has_scheme(reference) {
        return None;
    }

    let resolved = resolve(base, reference);
    if let Some(asset) = archive.media(&resolved) {
        return Some((resolved, asset));
    }
    let fallback = resolve_as_directory(base, reference);
    archive.media(&fallback).map(|asset| (fallback, asset))
}
