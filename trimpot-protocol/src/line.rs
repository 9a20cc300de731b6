//! Line assembly for the serial console.
//!
//! Bytes arrive from the transport in arbitrary chunks. The parser
//! collects them until a line terminator (`\r` or `\n`) and hands out the
//! complete line *including* its terminator, which the dispatcher uses to
//! recognise argument-less commands.
//!
//! - A terminator arriving on an empty buffer is skipped, so `\r\n`
//!   produces a single line.
//! - A line longer than [`MAX_LINE_LEN`] is discarded up to the next
//!   terminator.

use heapless::Vec;

/// Maximum line length in bytes, terminator included
pub const MAX_LINE_LEN: usize = 64;

/// Errors that can occur during line assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`]; bytes up to the next terminator are dropped
    Overflow,
}

/// A complete input line, terminator included
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    bytes: Vec<u8, MAX_LINE_LEN>,
}

impl Line {
    /// Build a line from raw bytes (used by tests and host tools)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LineError> {
        let mut line = Vec::new();
        line.extend_from_slice(bytes)
            .map_err(|_| LineError::Overflow)?;
        Ok(Self { bytes: line })
    }

    /// Raw bytes of the line, terminator included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes, terminator included
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the line holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check whether a byte ends a console line
pub const fn is_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Accumulating bytes of the current line
    Collecting,
    /// Dropping the rest of an overlong line
    Discarding,
}

/// State machine for assembling input lines
#[derive(Debug, Clone)]
pub struct LineParser {
    state: ParseState,
    buffer: Vec<u8, MAX_LINE_LEN>,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    /// Create a new line parser
    pub const fn new() -> Self {
        Self {
            state: ParseState::Collecting,
            buffer: Vec::new(),
        }
    }

    /// Reset the parser state, dropping any partial line
    pub fn reset(&mut self) {
        self.state = ParseState::Collecting;
        self.buffer.clear();
    }

    /// Number of bytes buffered for the current line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a line,
    /// `Ok(None)` when more bytes are needed, or `Err` when the current
    /// line overflowed (reported once per overlong line).
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        match self.state {
            ParseState::Discarding => {
                if is_terminator(byte) {
                    self.reset();
                }
                Ok(None)
            }
            ParseState::Collecting if is_terminator(byte) => {
                if self.buffer.is_empty() {
                    // Second half of "\r\n", or a blank line
                    return Ok(None);
                }
                // Capacity for the terminator is reserved below
                let _ = self.buffer.push(byte);
                let bytes = core::mem::take(&mut self.buffer);
                Ok(Some(Line { bytes }))
            }
            ParseState::Collecting => {
                if self.buffer.len() >= MAX_LINE_LEN - 1 {
                    self.buffer.clear();
                    self.state = ParseState::Discarding;
                    return Err(LineError::Overflow);
                }
                let _ = self.buffer.push(byte);
                Ok(None)
            }
        }
    }
}
