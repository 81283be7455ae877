//! Serialize converted documents and write them out.

use std::io::Write;
use std::path::Path;

use markup5ever_rcdom::RcDom;

use crate::error::{MhtmlError, Result};
use crate::inline::dom::serialize_node;

/// The whole document as HTML text, with a doctype when the source had one.
pub fn to_html(dom: &RcDom) -> Result<String> {
    serialize_node(&dom.document)
}

/// Write the document to `output`, or to standard output when `None`.
pub fn write_html(dom: &RcDom, output: Option<&Path>) -> Result<()> {
    let html = to_html(dom)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| MhtmlError::io(parent, e))?;
            }
            std::fs::write(path, html).map_err(|e| MhtmlError::io(path, e))?;
            tracing::info!(path = %path.display(), "Wrote HTML");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
