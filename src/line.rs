//! Line framing over the raw receive buffer.
//!
//! [`LineFramer`] owns the bytes read from the socket that have not yet been
//! attributed to a finished reply. It never blocks: the session reads from the
//! socket and feeds the framer, the assembler walks its lines, and the bytes
//! of a completed reply are consumed from the front. Anything after the
//! terminal line of a reply stays put for the next command.

use std::borrow::Cow;

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;

/// Line delimiter byte.
pub const LINE_DELIMITER: u8 = b'\n';

/// Default upper bound on unconsumed bytes (1 MiB).
pub const DEFAULT_MAX_BUFFER_LEN: usize = 1024 * 1024;

/// One delimiter-terminated line of the receive buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// Line text without the delimiter or a trailing `\r`.
    pub text: Cow<'a, str>,
    /// Byte offset of the line in the buffer.
    pub start: usize,
    /// Byte length including the delimiter.
    pub len: usize,
}

impl RawLine<'_> {
    /// Offset of the first byte after this line's delimiter.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Incremental byte-to-line framer.
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
    max_buffer_len: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Create an empty framer with the default buffer limit.
    pub fn new() -> Self {
        Self::with_max_buffer_len(DEFAULT_MAX_BUFFER_LEN)
    }

    /// Create an empty framer with a custom buffer limit.
    pub fn with_max_buffer_len(max_len: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(max_len.min(32768)),
            max_buffer_len: max_len,
        }
    }

    /// Append raw bytes to the buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Fail if the unconsumed bytes exceed the limit.
    ///
    /// Only meaningful while a reply is still incomplete: bytes that follow
    /// a terminal line are consumed or kept for the next command, so the
    /// caller checks this after the assembler asks for more data.
    pub fn check_limit(&self) -> Result<(), ProtocolError> {
        if self.buffer.len() > self.max_buffer_len {
            return Err(ProtocolError::BufferOverflow {
                len: self.buffer.len(),
                limit: self.max_buffer_len,
            });
        }
        Ok(())
    }

    /// Split the entire buffer on the delimiter.
    ///
    /// The last segment is whatever follows the final delimiter, so it is
    /// either a partial line or empty when the buffer ends on a delimiter.
    pub fn lines(&self) -> Vec<Cow<'_, str>> {
        self.buffer[..]
            .split(|&b| b == LINE_DELIMITER)
            .map(String::from_utf8_lossy)
            .collect()
    }

    /// Iterate over the complete lines starting at byte `offset`.
    ///
    /// A trailing partial line is not yielded. `offset` must fall on a line
    /// boundary, which holds for any value obtained from [`RawLine::end`].
    pub fn complete_lines_from(&self, offset: usize) -> CompleteLines<'_> {
        CompleteLines {
            buffer: &self.buffer,
            pos: offset.min(self.buffer.len()),
        }
    }

    /// Remove `count` bytes from the front of the buffer.
    ///
    /// Returns the number of bytes actually removed, which is less than
    /// `count` only if the buffer was shorter.
    pub fn consume(&mut self, count: usize) -> usize {
        let n = count.min(self.buffer.len());
        self.buffer.advance(n);
        n
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if there are no unconsumed bytes.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The unconsumed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Configured buffer limit.
    pub fn max_buffer_len(&self) -> usize {
        self.max_buffer_len
    }
}

/// Iterator returned by [`LineFramer::complete_lines_from`].
#[derive(Debug)]
pub struct CompleteLines<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for CompleteLines<'a> {
    type Item = RawLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.buffer[self.pos..];
        let newline = rest.iter().position(|&b| b == LINE_DELIMITER)?;

        let mut body = &rest[..newline];
        if let Some((&b'\r', head)) = body.split_last() {
            body = head;
        }

        let line = RawLine {
            text: String::from_utf8_lossy(body),
            start: self.pos,
            len: newline + 1,
        };
        self.pos += newline + 1;
        Some(line)
    }
}
