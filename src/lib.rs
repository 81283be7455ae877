//! `mhtml2html`: convert MHTML web archives into self-contained HTML.
//!
//! The [`parser`] turns archive text into an [`Archive`] of decoded parts.
//! The [`inline`] module walks the root document and replaces references to
//! archived parts with `data:` URIs.
//!
//! ```no_run
//! let text = mhtml2html::parser::read_archive("page.mhtml")?;
//! let dom = mhtml2html::convert(text.as_str())?;
//! let html = mhtml2html::export::html::to_html(&dom)?;
//! # Ok::<(), mhtml2html::error::MhtmlError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod inline;
pub mod model;
pub mod parser;

pub use error::{MhtmlError, Result};
pub use inline::{convert, ConvertOptions, Converter, MhtmlInput};
pub use model::{Archive, ArchiveHeaders, ArchiveShape, Asset, TransferEncoding};
pub use parser::{parse, parse_html_only};
