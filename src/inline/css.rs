//! Inline `url(...)` references in CSS text.

use tracing::warn;

use super::{embed, resolver};
use crate::codec::base64::Base64Encode;
use crate::model::Archive;

const URL_RULE: &str = "url(";

/// Rewrite every `url(...)` in `css` that resolves to an archived part into a
/// base64 `data:` URI, resolving against `base`.
///
/// Unresolved references are left untouched. A part that cannot be
/// re-encoded is logged and also left untouched. The scan is a single
/// forward pass; replaced spans are never rescanned.
pub fn replace_references(
    archive: &Archive,
    base: &str,
    css: &str,
    encoder: &dyn Base64Encode,
) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;

    while let Some(start) = rest.find(URL_RULE) {
        let arg_start = start + URL_RULE.len();
        out.push_str(&rest[..arg_start]);
        rest = &rest[arg_start..];

        let Some(end) = rest.find(')') else {
            break;
        };
        let argument = &rest[..end];
        match inline_argument(archive, base, argument, encoder) {
            Some(uri) => {
                out.push('\'');
                out.push_str(&uri);
                out.push('\'');
            }
            None => out.push_str(argument),
        }
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

fn inline_argument(
    archive: &Archive,
    base: &str,
    argument: &str,
    encoder: &dyn Base64Encode,
) -> Option<String> {
    let reference = argument.trim().trim_matches(|c| c == '"' || c == '\'');
    if reference.starts_with("data:") {
        return None;
    }
    let (key, asset) = resolver::lookup(archive, base, reference)?;
    match embed::base64_uri(asset, encoder) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!(reference = %key, error = %e, "Could not embed stylesheet reference");
            None
        }
    }
}
