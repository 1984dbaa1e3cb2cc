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

use crate::model::position::LineCol;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A positioned finding, ready to be handed to whatever channel the host reports through.
///
/// Ordering is by file, then line, then column, then message, which is the order findings are
/// emitted in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Byte range of the offending token, for renderers that show source context.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub span: Option<(usize, usize)>,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, line_col: LineCol, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: line_col.line,
            column: line_col.column,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }

    pub fn line_col(&self) -> LineCol {
        LineCol::new(self.line, self.column)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.line, self.column, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_vet_style() {
        let d = Diagnostic::new("pkg/loop.go", LineCol::new(12, 16), "found it");
        assert_eq!(d.to_string(), "pkg/loop.go:12:16: found it");
    }

    #[test]
    fn test_sorting_by_position() {
        let mut diags = vec![
            Diagnostic::new("b.go", LineCol::new(1, 1), "x"),
            Diagnostic::new("a.go", LineCol::new(9, 3), "x"),
            Diagnostic::new("a.go", LineCol::new(9, 1), "y"),
            Diagnostic::new("a.go", LineCol::new(2, 7), "x"),
        ];
        diags.sort();
        let positions: Vec<_> = diags
            .iter()
            .map(|d| (d.file.as_str(), d.line, d.column))
            .collect();
        assert_eq!(
            positions,
            vec![("a.go", 2, 7), ("a.go", 9, 1), ("a.go", 9, 3), ("b.go", 1, 1)]
        );
    }

    #[test]
    fn test_json_omits_missing_span() {
        let d = Diagnostic::new("a.go", LineCol::new(1, 2), "m");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"file":"a.go","line":1,"column":2,"message":"m"}"#);
    }
}
