//! Output of converted documents.

pub mod html;
