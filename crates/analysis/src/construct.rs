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

use loopvet_common::{LineCol, Span};
use loopvet_frontend::ast::{Block, File, ForStmt, RangeStmt};
use loopvet_frontend::visit::{Visitor, walk_for, walk_range};

/// A loop whose header may establish variables shared by all iterations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterationConstruct<'a> {
    /// `for init; cond; post { }` and its degenerate forms.
    Counting(&'a ForStmt),
    /// `for key, value := range source { }`
    Iterator(&'a RangeStmt),
}

impl<'a> IterationConstruct<'a> {
    pub fn body(&self) -> &'a Block {
        match self {
            IterationConstruct::Counting(f) => &f.body,
            IterationConstruct::Iterator(r) => &r.body,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            IterationConstruct::Counting(f) => f.span,
            IterationConstruct::Iterator(r) => r.span,
        }
    }

    /// Position of the `for` keyword.
    pub fn position(&self) -> LineCol {
        self.span().line_col
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IterationConstruct::Counting(_) => "for",
            IterationConstruct::Iterator(_) => "range",
        }
    }
}

struct Constructs<'a> {
    found: Vec<IterationConstruct<'a>>,
}

impl<'a> Visitor<'a> for Constructs<'a> {
    fn visit_for(&mut self, for_stmt: &'a ForStmt) {
        self.found.push(IterationConstruct::Counting(for_stmt));
        walk_for(self, for_stmt);
    }

    fn visit_range(&mut self, range: &'a RangeStmt) {
        self.found.push(IterationConstruct::Iterator(range));
        walk_range(self, range);
    }
}

/// Every loop in the file, outer loops before the loops they contain, in document order. Loops
/// inside function literals are included.
pub fn enumerate_constructs(file: &File) -> Vec<IterationConstruct<'_>> {
    let mut constructs = Constructs { found: vec![] };
    constructs.visit_file(file);
    constructs.found
}
