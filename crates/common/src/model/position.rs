// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::Range;

/// A 1-based line and column. Columns count characters, not bytes, same as the parser reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

impl LineCol {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<(usize, usize)> for LineCol {
    fn from((line, column): (usize, usize)) -> Self {
        Self { line, column }
    }
}

impl Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The physical extent of a node in its source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Position of `start`.
    pub line_col: LineCol,
}

impl Span {
    pub fn new(start: usize, end: usize, line_col: LineCol) -> Self {
        Self {
            start,
            end,
            line_col,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_ordering() {
        assert!(LineCol::new(1, 20) < LineCol::new(2, 1));
        assert!(LineCol::new(3, 2) < LineCol::new(3, 10));
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(10, 40, LineCol::new(2, 1));
        let inner = Span::new(12, 15, LineCol::new(2, 3));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert_eq!(inner.range(), 12..15);
    }
}
