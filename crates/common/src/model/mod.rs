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

pub use crate::model::diagnostic::Diagnostic;
pub use crate::model::position::{LineCol, Span};
use serde::Serialize;
use thiserror::Error;

mod diagnostic;
mod position;

/// Structured information about a parse failure, used by renderers that want to show more than
/// the one-line summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseErrorDetails {
    /// Byte range in the source where the parser gave up.
    pub span: Option<(usize, usize)>,
    /// Tokens the parser would have accepted at that point.
    pub expected_tokens: Vec<String>,
    /// Free-form hints.
    pub notes: Vec<String>,
}

/// Failure to turn source text into a resolved tree. The analysis itself never fails; these are
/// only produced by the front end (or by the host reading files).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum SourceError {
    #[error("Failure to parse string @ {0}: {1}")]
    StringLexError(LineCol, String),
    #[error("Failure to parse program @ {line}/{column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        context: String,
        end_line_col: Option<(usize, usize)>,
        message: String,
        details: ParseErrorDetails,
    },
    #[error("Unable to read {path}: {message}")]
    Io { path: String, message: String },
}

impl SourceError {
    /// The (line, column) this error points at, if it has one.
    pub fn line_col(&self) -> Option<LineCol> {
        match self {
            SourceError::StringLexError(lc, _) => Some(*lc),
            SourceError::ParseError { line, column, .. } => Some(LineCol::new(*line, *column)),
            SourceError::Io { .. } => None,
        }
    }
}
