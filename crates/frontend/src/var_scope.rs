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

use crate::names::{DeclKind, Names};
use loopvet_common::{LineCol, SymbolId};

/// The stack of lexical scopes active at some point of the walk. The bottom scope is the
/// package scope; the universe scope is never represented, so predeclared names do not resolve.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VarScope {
    scopes: Vec<Vec<(String, SymbolId)>>,
}

/// Policy for binding a name in the current scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BindMode {
    /// If the name is already bound in the current scope, use it.
    Reuse,
    /// Always introduce a new symbol, shadowing any existing binding.
    New,
}

impl Default for VarScope {
    fn default() -> Self {
        Self {
            scopes: vec![Vec::new()],
        }
    }
}

impl VarScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new lexical scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Pop the current scope, returning how many names it held. The package scope is never
    /// popped.
    pub fn pop_scope(&mut self) -> usize {
        if self.scopes.len() == 1 {
            return 0;
        }
        self.scopes.pop().map(|s| s.len()).unwrap_or(0)
    }

    /// Depth of the current scope; 0 is package scope.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Resolve a name, innermost scope first.
    pub fn find_name(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(n, _)| n == name)
            .map(|(_, symbol)| *symbol)
    }

    fn find_in_current(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .last()
            .and_then(|scope| scope.iter().rev().find(|(n, _)| n == name))
            .map(|(_, symbol)| *symbol)
    }

    /// Declare a name in the current scope, shadowing whatever it denoted before.
    pub fn declare_name(
        &mut self,
        names: &mut Names,
        name: &str,
        kind: DeclKind,
        line_col: LineCol,
    ) -> SymbolId {
        self.bind(names, name, kind, line_col, BindMode::New)
    }

    /// Declare a name in the current scope unless it is already declared there, in which case
    /// the existing symbol is returned. This is how the left side of `:=` behaves.
    pub fn declare_or_use_name(
        &mut self,
        names: &mut Names,
        name: &str,
        kind: DeclKind,
        line_col: LineCol,
    ) -> SymbolId {
        self.bind(names, name, kind, line_col, BindMode::Reuse)
    }

    /// Declare a name in package scope regardless of the current depth.
    pub fn declare_global(
        &mut self,
        names: &mut Names,
        name: &str,
        kind: DeclKind,
        line_col: LineCol,
    ) -> SymbolId {
        let symbol = names.declare(name, kind, line_col, 0);
        self.scopes[0].push((name.to_string(), symbol));
        symbol
    }

    fn bind(
        &mut self,
        names: &mut Names,
        name: &str,
        kind: DeclKind,
        line_col: LineCol,
        mode: BindMode,
    ) -> SymbolId {
        if mode == BindMode::Reuse
            && let Some(existing) = self.find_in_current(name)
        {
            return existing;
        }
        let symbol = names.declare(name, kind, line_col, self.depth());
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name.to_string(), symbol));
        }
        symbol
    }
}
