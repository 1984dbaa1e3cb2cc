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

//! Which variables a loop header makes shared across iterations.

use crate::construct::IterationConstruct;
use crate::resolver::SymbolResolver;
use indexmap::IndexSet;
use loopvet_common::SymbolId;
use loopvet_frontend::ast::{Expr, ExprNode, Ident, Stmt, StmtNode};
use tracing::trace;

/// The variables established or advanced by one loop's header, in the order they were found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopScopeSet {
    symbols: IndexSet<SymbolId>,
}

impl LoopScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the symbol was already present.
    pub fn insert(&mut self, symbol: SymbolId) -> bool {
        self.symbols.insert(symbol)
    }

    pub fn contains(&self, symbol: SymbolId) -> bool {
        self.symbols.contains(&symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.iter().copied()
    }
}

impl FromIterator<SymbolId> for LoopScopeSet {
    fn from_iter<T: IntoIterator<Item = SymbolId>>(iter: T) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

/// The identifier naming the storage an lvalue-shaped expression ultimately refers to:
/// `x`, `(x)`, `x.f`, `x[i]` and `*x` all root at `x`. Anything else has no root.
pub fn root_ident(expr: &Expr) -> Option<&Ident> {
    match &expr.node {
        ExprNode::Ident(ident) => Some(ident),
        ExprNode::Paren(inner) | ExprNode::Deref(inner) => root_ident(inner),
        ExprNode::Selector { base, .. } => root_ident(base),
        ExprNode::Index { base, .. } => root_ident(base),
        _ => None,
    }
}

/// Collect the loop-scoped variables of a single construct.
///
/// For an iterator loop these are the roots of its key and value. For a counting loop they are
/// the roots of the assignment targets in the init clause, plus the roots of whatever the post
/// clause increments, decrements or assigns. A condition-only or infinite loop has none.
pub fn extract<R>(construct: &IterationConstruct<'_>, resolver: &R) -> LoopScopeSet
where
    R: SymbolResolver + ?Sized,
{
    let mut targets: Vec<&Expr> = vec![];
    match construct {
        IterationConstruct::Iterator(range) => {
            targets.extend(range.value.iter());
            targets.extend(range.key.iter());
        }
        IterationConstruct::Counting(for_stmt) => {
            if let Some(init) = &for_stmt.init {
                if let StmtNode::Assign { lhs, .. } = &init.node {
                    targets.extend(lhs.iter());
                }
            }
            if let Some(post) = &for_stmt.post {
                targets.extend(post_targets(post));
            }
        }
    }

    let mut set = LoopScopeSet::new();
    for target in targets {
        let Some(ident) = root_ident(target) else {
            continue;
        };
        if ident.is_blank() {
            continue;
        }
        match resolver.resolve(ident) {
            Some(symbol) => {
                set.insert(symbol);
            }
            None => trace!(name = %ident.name, at = %ident.line_col(), "unresolved loop target"),
        }
    }
    set
}

fn post_targets(post: &Stmt) -> Vec<&Expr> {
    match &post.node {
        StmtNode::IncDec { target, .. } => vec![target],
        StmtNode::Assign { lhs, .. } => lhs.iter().collect(),
        _ => vec![],
    }
}
