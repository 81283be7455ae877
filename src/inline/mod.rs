//! Resource inlining: reference resolution, CSS rewriting, and the DOM walk
//! that produces a self-contained document.

pub mod convert;
pub mod css;
pub mod dom;
pub mod embed;
pub mod resolver;

pub use convert::{convert, ConvertOptions, Converter, MhtmlInput};
pub use dom::{Html5everParser, HtmlParser};
