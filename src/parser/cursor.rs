//! Forward-only line cursor over an in-memory document.
//!
//! Owns the byte position and the line count so the state machine in
//! [`super::mhtml`] never touches raw indices.

use crate::error::{MhtmlError, Result};

/// Reads a string one line at a time, tracking 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    text: &'a str,
    pos: usize,
    newlines: usize,
    line: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            newlines: 0,
            line: 0,
        }
    }

    /// Number of the line most recently consumed (0 before the first read).
    pub fn line(&self) -> usize {
        self.line
    }

    fn eof(&self) -> MhtmlError {
        MhtmlError::UnexpectedEof {
            line: self.line.max(1),
        }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// The unread remainder of the input.
    pub fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Return the next line including its terminator.
    ///
    /// A final line without a terminator is returned as-is. Fails with
    /// [`MhtmlError::UnexpectedEof`] once the input is exhausted.
    pub fn next_line(&mut self) -> Result<&'a str> {
        let rest = self.remaining();
        if rest.is_empty() {
            return Err(self.eof());
        }

        let (len, terminated) = match rest.find('\n') {
            Some(i) => (i + 1, true),
            None => (rest.len(), false),
        };
        self.pos += len;
        if terminated {
            self.newlines += 1;
            self.line = self.newlines;
        } else {
            self.line = self.newlines + 1;
        }
        Ok(&rest[..len])
    }

    /// Skip whitespace, counting any line breaks passed over.
    ///
    /// Fails with [`MhtmlError::UnexpectedEof`] if nothing but whitespace is
    /// left.
    pub fn skip_whitespace(&mut self) -> Result<()> {
        let rest = self.remaining();
        let trimmed = rest.trim_start();
        let skipped = &rest[..rest.len() - trimmed.len()];

        self.newlines += skipped.matches('\n').count();
        self.line = self.newlines;
        self.pos += skipped.len();

        if trimmed.is_empty() {
            return Err(self.eof());
        }
        Ok(())
    }

    /// Whether only whitespace (or nothing) is left.
    pub fn only_whitespace_left(&self) -> bool {
        self.remaining().trim().is_empty()
    }
}
