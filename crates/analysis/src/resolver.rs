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

use loopvet_common::SymbolId;
use loopvet_frontend::ParsedFile;
use loopvet_frontend::ast::Ident;

/// Maps an identifier occurrence to the variable it denotes.
///
/// Two occurrences denote the same variable iff they resolve to equal symbols. `None` means the
/// occurrence is not a binding this analysis can track (a predeclared name, a field, a label),
/// and is never an error.
pub trait SymbolResolver {
    fn resolve(&self, ident: &Ident) -> Option<SymbolId>;
}

impl SymbolResolver for ParsedFile {
    fn resolve(&self, ident: &Ident) -> Option<SymbolId> {
        self.symbol_of(ident)
    }
}

/// A resolver backed by a function, for hosts with their own symbol tables.
#[derive(Clone, Copy, Debug)]
pub struct FnResolver<F>(F);

pub fn resolver_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&Ident) -> Option<SymbolId>,
{
    FnResolver(f)
}

impl<F> SymbolResolver for FnResolver<F>
where
    F: Fn(&Ident) -> Option<SymbolId>,
{
    fn resolve(&self, ident: &Ident) -> Option<SymbolId> {
        (self.0)(ident)
    }
}
