//! Small helpers shared across the pipeline: byte-position bookkeeping and
//! line/column reporting for diagnostics.

use once_cell::unsync::OnceCell;
use std::fmt::{Display, Formatter};

/// Line and column of a byte offset into a [`Code`] buffer. Both are
/// 1-indexed, matching how editors and error messages usually count.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A wrapper around the raw template bytes that lazily indexes line breaks
/// so repeated [`Code::position_at`] calls during error reporting don't
/// rescan the whole buffer.
pub struct Code<'c> {
    pub value: &'c [u8],
    line_breaks: OnceCell<Vec<usize>>,
}

impl<'c> From<&'c [u8]> for Code<'c> {
    fn from(value: &'c [u8]) -> Self {
        Code::new(value)
    }
}

impl<'c> From<&'c str> for Code<'c> {
    fn from(value: &'c str) -> Self {
        Code::new(value.as_bytes())
    }
}

impl<'c> Code<'c> {
    pub fn new(value: &'c [u8]) -> Self {
        Self {
            value,
            line_breaks: OnceCell::new(),
        }
    }

    fn line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.value
                .iter()
                .enumerate()
                .filter_map(|(index, b)| if *b == b'\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Compute the [`Position`] (line, column) of a byte offset.
    pub fn position_at(&self, pointer: usize) -> Position {
        let breaks = self.line_breaks();
        let index = match breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };

        if index == 0 {
            Position::new(1, pointer + 1)
        } else {
            let line_start = breaks[index - 1] + 1;
            Position::new(index + 1, pointer - line_start + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_column_is_one_indexed() {
        let code = Code::new(b"hello");
        assert_eq!(code.position_at(0), Position::new(1, 1));
        assert_eq!(code.position_at(3), Position::new(1, 4));
    }

    #[test]
    fn position_tracks_line_breaks() {
        let code = Code::new(b"ab\ncd\nef");
        assert_eq!(code.position_at(0), Position::new(1, 1));
        assert_eq!(code.position_at(3), Position::new(2, 1));
        assert_eq!(code.position_at(6), Position::new(3, 1));
        assert_eq!(code.position_at(7), Position::new(3, 2));
    }
}
