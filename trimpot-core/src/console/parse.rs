//! Input line scanning

use trimpot_protocol::line::is_terminator;

use super::ConsoleError;

/// Largest literal accepted before the sign is applied
pub const MAX_LITERAL: i32 = i16::MAX as i32;

/// Read position within one input line
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'l> {
    rest: &'l [u8],
}

impl<'l> Cursor<'l> {
    pub fn new(line: &'l [u8]) -> Self {
        Self { rest: line }
    }

    /// Unconsumed bytes
    pub fn rest(&self) -> &'l [u8] {
        self.rest
    }

    pub fn peek(&self) -> Option<u8> {
        self.rest.first().copied()
    }

    /// Skip `count` bytes, saturating at the end of the line
    pub fn advance(&mut self, count: usize) {
        self.rest = self.rest.get(count..).unwrap_or_default();
    }

    /// Consume `byte` if it is next
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.advance(1);
            true
        } else {
            false
        }
    }

    /// Consume a single blank separator, if present
    pub fn skip_blank(&mut self) {
        self.eat(b' ');
    }

    /// Check if the next byte ends the line
    pub fn at_terminator(&self) -> bool {
        self.peek().is_some_and(is_terminator)
    }
}

/// Parse `[-]digits` at the cursor
///
/// Stops at the first non-digit. Fails with
/// [`ConsoleError::ValueOutOfRange`] as soon as the magnitude exceeds
/// [`MAX_LITERAL`], and with [`ConsoleError::ValueRequired`] when no
/// digit follows.
pub fn signed_literal(cursor: &mut Cursor<'_>) -> Result<i32, ConsoleError> {
    let negative = cursor.eat(b'-');

    let mut magnitude: i32 = 0;
    let mut digits = 0;
    while let Some(digit) = cursor.peek().filter(u8::is_ascii_digit) {
        magnitude = magnitude * 10 + i32::from(digit - b'0');
        if magnitude > MAX_LITERAL {
            return Err(ConsoleError::ValueOutOfRange);
        }
        cursor.advance(1);
        digits += 1;
    }

    if digits == 0 {
        return Err(ConsoleError::ValueRequired);
    }
    Ok(if negative { -magnitude } else { magnitude })
}
