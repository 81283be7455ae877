//! MHTML parsing: line cursor, MIME header handling, and the archive state machine.

pub mod cursor;
pub mod header;
pub mod input;
pub mod mhtml;

pub use input::read_archive;
pub use mhtml::{parse, parse_html_only, MhtmlParser};
