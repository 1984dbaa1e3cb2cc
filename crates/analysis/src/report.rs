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

use crate::capture::Issue;
use indexmap::IndexMap;
use loopvet_common::Diagnostic;

pub fn message(name: &str) -> String {
    format!(
        "found reference to loop variable `{name}`. Consider to duplicate variable `{name}` before using it inside the function closure."
    )
}

/// Collects the issues of one file into diagnostics.
///
/// An occurrence inside loops nested in each other is found once per enclosing loop that scopes
/// it, but is reported once: occurrences are keyed by their byte offset.
pub struct Reporter {
    file: String,
    by_offset: IndexMap<usize, Diagnostic>,
}

impl Reporter {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            by_offset: IndexMap::new(),
        }
    }

    pub fn report(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.by_offset.entry(issue.span.start).or_insert_with(|| {
                Diagnostic::new(self.file.as_str(), issue.line_col, message(&issue.name))
                    .with_span(issue.span.start, issue.span.end)
            });
        }
    }

    pub fn len(&self) -> usize {
        self.by_offset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_offset.is_empty()
    }

    /// The diagnostics in position order.
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<_> = self.by_offset.into_values().collect();
        diagnostics.sort();
        diagnostics
    }
}
