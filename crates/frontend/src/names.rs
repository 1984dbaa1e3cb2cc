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

use loopvet_common::{LineCol, SymbolId};
use strum::{Display, EnumIter};

/// How a symbol was introduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DeclKind {
    Var,
    Const,
    Func,
    Type,
    Package,
    Param,
    Result,
    Receiver,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
    /// Where the declaring identifier appears. Imports without an alias use the import spec.
    pub line_col: LineCol,
    /// Scope depth at declaration; 0 is package scope.
    pub depth: usize,
}

/// Every symbol declared in a file, in the order the binder declared them. The offset into the
/// table is the symbol's identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Names {
    decls: Vec<Decl>,
}

impl Names {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        name: &str,
        kind: DeclKind,
        line_col: LineCol,
        depth: usize,
    ) -> SymbolId {
        let id = SymbolId(self.decls.len() as u32);
        self.decls.push(Decl {
            name: name.to_string(),
            kind,
            line_col,
            depth,
        });
        id
    }

    pub fn decl(&self, symbol: SymbolId) -> Option<&Decl> {
        self.decls.get(symbol.offset())
    }

    pub fn name_of(&self, symbol: SymbolId) -> Option<&str> {
        self.decl(symbol).map(|d| d.name.as_str())
    }

    /// All symbols declared with the given name, outermost first.
    pub fn find_named(&self, name: &str) -> Vec<SymbolId> {
        self.decls
            .iter()
            .enumerate()
            .filter(|(_, d)| d.name == name)
            .map(|(i, _)| SymbolId(i as u32))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (SymbolId(i as u32), d))
    }
}
