//! Core data model types: decoded parts and the archive that indexes them.

pub mod archive;
pub mod asset;

pub use archive::{Archive, ArchiveHeaders, ArchiveShape};
pub use asset::{Asset, BodyText, TransferEncoding};
