//! Reading archive files from disk.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{MhtmlError, Result};

/// Read an archive file as text.
///
/// Archives are 7-bit in practice, but 8bit parts occasionally carry
/// legacy bytes. Invalid UTF-8 is decoded as Windows-1252 instead of failing.
pub fn read_archive(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MhtmlError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| MhtmlError::io(path, e))?;
    debug!(path = %path.display(), size = bytes.len(), "Read archive");
    Ok(decode_text(bytes))
}

/// Decode raw archive bytes: UTF-8 when valid, Windows-1252 otherwise.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Archive is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            decoded.into_owned()
        }
    }
}
