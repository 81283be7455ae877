//! `data:` URI construction for inlined parts.

use crate::codec::base64::Base64Encode;
use crate::error::Result;
use crate::model::{Asset, TransferEncoding};

/// The part's payload as base64, reusing the stored text for base64 parts.
pub fn base64_payload(asset: &Asset, encoder: &dyn Base64Encode) -> Result<String> {
    match asset.encoding {
        TransferEncoding::Base64 => Ok(asset.data.clone()),
        _ => Ok(encoder.encode_bytes(&asset.bytes()?)),
    }
}

/// `data:<type>;base64,<payload>`, as used inside stylesheets.
pub fn base64_uri(asset: &Asset, encoder: &dyn Base64Encode) -> Result<String> {
    Ok(format!(
        "data:{};base64,{}",
        asset.mime_type,
        base64_payload(asset, encoder)?
    ))
}

/// URI for an image `src`.
///
/// Quoted-printable bodies are already decoded text and go in as
/// `data:<type>;utf8,<text>`. Everything else is base64.
pub fn image_uri(asset: &Asset, encoder: &dyn Base64Encode) -> Result<String> {
    match asset.encoding {
        TransferEncoding::QuotedPrintable => {
            Ok(format!("data:{};utf8,{}", asset.mime_type, asset.data))
        }
        _ => base64_uri(asset, encoder),
    }
}

/// `data:text/html;charset=utf-8,<percent-encoded html>` for a nested frame.
pub fn html_uri(html: &str) -> String {
    format!("data:text/html;charset=utf-8,{}", urlencoding::encode(html))
}
