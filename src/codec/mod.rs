//! Transfer-encoding codecs: quoted-printable (RFC 2045) and base64.

pub mod base64;
pub mod quoted_printable;
