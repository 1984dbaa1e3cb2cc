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

//! Name resolution. Walks a parsed file with Go's block scoping and records, for every
//! identifier occurrence, the symbol it declares or refers to.

use crate::ast::{
    AssignOp, Block, CaseClause, Decl, Expr, ExprNode, File, ForStmt, FuncDecl, FuncLit, Ident,
    Param, RangeStmt, Signature, Stmt, StmtNode, TopDecl, element_types, is_keyed_by_value,
};
use crate::names::{DeclKind, Names};
use crate::var_scope::VarScope;
use crate::visit::{Visitor, walk_expr, walk_stmt, walk_stmts};
use loopvet_common::SymbolId;
use tracing::trace;

/// Output of binding: the symbol table and, indexed by [`IdentId`](crate::ast::IdentId), the
/// symbol each identifier occurrence denotes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pub names: Names,
    pub resolutions: Vec<Option<SymbolId>>,
}

/// Bind every identifier in `file`. `ident_count` is the number of identifier ids the parser
/// handed out.
pub fn bind(file: &File, ident_count: usize) -> Bindings {
    let mut binder = Binder {
        scope: VarScope::new(),
        names: Names::new(),
        resolutions: vec![None; ident_count],
    };
    binder.bind_file(file);
    Bindings {
        names: binder.names,
        resolutions: binder.resolutions,
    }
}

struct Binder {
    scope: VarScope,
    names: Names,
    resolutions: Vec<Option<SymbolId>>,
}

impl Binder {
    fn record(&mut self, ident: &Ident, symbol: SymbolId) {
        if let Some(slot) = self.resolutions.get_mut(ident.id.offset()) {
            *slot = Some(symbol);
        }
    }

    /// Declare `ident` in the current scope. The blank identifier declares nothing.
    fn declare(&mut self, ident: &Ident, kind: DeclKind) {
        if ident.is_blank() {
            return;
        }
        let symbol = self
            .scope
            .declare_name(&mut self.names, &ident.name, kind, ident.line_col());
        trace!(name = %ident.name, %kind, depth = self.scope.depth(), "declared");
        self.record(ident, symbol);
    }

    fn declare_global(&mut self, ident: &Ident, kind: DeclKind) {
        if ident.is_blank() {
            return;
        }
        let symbol =
            self.scope
                .declare_global(&mut self.names, &ident.name, kind, ident.line_col());
        self.record(ident, symbol);
    }

    fn resolve(&mut self, ident: &Ident) {
        if ident.is_blank() {
            return;
        }
        if let Some(symbol) = self.scope.find_name(&ident.name) {
            self.record(ident, symbol);
        }
    }

    fn bind_file(&mut self, file: &File) {
        for import in &file.imports {
            let Some(name) = import.local_name() else {
                continue;
            };
            match &import.alias {
                Some(alias) => self.declare_global(alias, DeclKind::Package),
                None => {
                    self.scope.declare_global(
                        &mut self.names,
                        name,
                        DeclKind::Package,
                        import.span.line_col,
                    );
                }
            }
        }

        // Everything at package level is visible to every body, regardless of order.
        for decl in &file.decls {
            match decl {
                TopDecl::Func(func) if !func.is_method() && func.name.name != "init" => {
                    self.declare_global(&func.name, DeclKind::Func)
                }
                TopDecl::Func(_) => {}
                TopDecl::Decl(Decl::Var(specs)) => {
                    for name in specs.iter().flat_map(|s| &s.names) {
                        self.declare_global(name, DeclKind::Var);
                    }
                }
                TopDecl::Decl(Decl::Const(specs)) => {
                    for name in specs.iter().flat_map(|s| &s.names) {
                        self.declare_global(name, DeclKind::Const);
                    }
                }
                TopDecl::Decl(Decl::Type(specs)) => {
                    for spec in specs {
                        self.declare_global(&spec.name, DeclKind::Type);
                    }
                }
            }
        }

        for decl in &file.decls {
            match decl {
                TopDecl::Func(func) => self.bind_func_decl(func),
                TopDecl::Decl(Decl::Var(specs) | Decl::Const(specs)) => {
                    for value in specs.iter().flat_map(|s| &s.values) {
                        self.visit_expr(value);
                    }
                }
                TopDecl::Decl(Decl::Type(_)) => {}
            }
        }
    }

    fn bind_func_decl(&mut self, func: &FuncDecl) {
        self.scope.push_scope();
        self.declare_params(&func.receiver, DeclKind::Receiver);
        self.declare_signature(&func.signature);
        if let Some(body) = &func.body {
            // Parameters and the outermost block of the body share a scope.
            walk_stmts(self, &body.stmts);
        }
        self.scope.pop_scope();
    }

    fn declare_signature(&mut self, signature: &Signature) {
        self.declare_params(&signature.params, DeclKind::Param);
        self.declare_params(&signature.results, DeclKind::Result);
    }

    fn declare_params(&mut self, params: &[Param], kind: DeclKind) {
        for name in params.iter().flat_map(|p| &p.names) {
            self.declare(name, kind);
        }
    }

    fn bind_local_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(specs) | Decl::Const(specs) => {
                let kind = if matches!(decl, Decl::Var(_)) {
                    DeclKind::Var
                } else {
                    DeclKind::Const
                };
                for spec in specs {
                    // The scope of a local starts after its spec.
                    for value in &spec.values {
                        self.visit_expr(value);
                    }
                    for name in &spec.names {
                        self.declare(name, kind);
                    }
                }
            }
            Decl::Type(specs) => {
                for spec in specs {
                    self.declare(&spec.name, DeclKind::Type);
                }
            }
        }
    }

    fn bind_define(&mut self, lhs: &[Expr], rhs: &[Expr]) {
        for value in rhs {
            self.visit_expr(value);
        }
        for target in lhs {
            match target.as_ident() {
                Some(ident) if ident.is_blank() => {}
                Some(ident) => {
                    let symbol = self.scope.declare_or_use_name(
                        &mut self.names,
                        &ident.name,
                        DeclKind::Var,
                        ident.line_col(),
                    );
                    self.record(ident, symbol);
                }
                // Not valid Go, but bind whatever is there.
                None => self.visit_expr(target),
            }
        }
    }

    fn bind_optional(&mut self, stmt: &Option<Box<Stmt>>) {
        if let Some(stmt) = stmt {
            self.visit_stmt(stmt);
        }
    }

    fn bind_case_clauses(&mut self, clauses: &[CaseClause], binding: Option<&Ident>) {
        for clause in clauses {
            for value in clause.values.iter().flatten() {
                self.visit_expr(value);
            }
            self.scope.push_scope();
            // Each clause of a type switch gets its own copy of the guard's variable.
            if let Some(binding) = binding
                && !binding.is_blank()
            {
                self.scope.declare_name(
                    &mut self.names,
                    &binding.name,
                    DeclKind::Var,
                    binding.line_col(),
                );
            }
            walk_stmts(self, &clause.body);
            self.scope.pop_scope();
        }
    }

    /// `ty` is the literal's type as written, or for an elided inner literal the type it takes
    /// from the enclosing one.
    fn bind_elements(&mut self, ty: Option<&str>, expr: &Expr) {
        let ExprNode::Composite { elements, .. } = &expr.node else {
            return;
        };
        let keyed_by_value = ty.is_some_and(is_keyed_by_value);
        let (key_ty, element_ty) = match ty.and_then(element_types) {
            Some((key, element)) => (key, Some(element)),
            None => (None, None),
        };
        for element in elements {
            if let Some(key) = &element.key {
                // In struct literals a bare identifier key is a field name.
                match &key.node {
                    ExprNode::Ident(_) if !keyed_by_value => {}
                    ExprNode::Composite { ty: None, .. } => self.bind_elements(key_ty, key),
                    _ => self.visit_expr(key),
                }
            }
            match &element.value.node {
                ExprNode::Composite { ty: None, .. } => {
                    self.bind_elements(element_ty, &element.value)
                }
                _ => self.visit_expr(&element.value),
            }
        }
    }
}

impl<'a> Visitor<'a> for Binder {
    fn visit_block(&mut self, block: &'a Block) {
        self.scope.push_scope();
        walk_stmts(self, &block.stmts);
        self.scope.pop_scope();
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match &stmt.node {
            StmtNode::Decl(decl) => self.bind_local_decl(decl),
            StmtNode::Assign {
                lhs,
                op: AssignOp::Define,
                rhs,
            } => self.bind_define(lhs, rhs),
            StmtNode::Labeled { stmt, .. } => self.bind_optional(stmt),
            StmtNode::Branch { .. } => {}
            StmtNode::If(if_stmt) => {
                self.scope.push_scope();
                self.bind_optional(&if_stmt.init);
                self.visit_expr(&if_stmt.cond);
                self.visit_block(&if_stmt.then);
                self.bind_optional(&if_stmt.otherwise);
                self.scope.pop_scope();
            }
            StmtNode::Switch(switch) => {
                self.scope.push_scope();
                self.bind_optional(&switch.init);
                if let Some(tag) = &switch.tag {
                    self.visit_expr(tag);
                }
                self.bind_case_clauses(&switch.clauses, None);
                self.scope.pop_scope();
            }
            StmtNode::TypeSwitch(switch) => {
                self.scope.push_scope();
                self.bind_optional(&switch.init);
                self.visit_expr(&switch.subject);
                self.bind_case_clauses(&switch.clauses, switch.binding.as_ref());
                self.scope.pop_scope();
            }
            StmtNode::Select(clauses) => {
                for clause in clauses {
                    self.scope.push_scope();
                    self.bind_optional(&clause.comm);
                    walk_stmts(self, &clause.body);
                    self.scope.pop_scope();
                }
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_for(&mut self, for_stmt: &'a ForStmt) {
        self.scope.push_scope();
        self.bind_optional(&for_stmt.init);
        if let Some(cond) = &for_stmt.cond {
            self.visit_expr(cond);
        }
        self.bind_optional(&for_stmt.post);
        self.visit_block(&for_stmt.body);
        self.scope.pop_scope();
    }

    fn visit_range(&mut self, range: &'a RangeStmt) {
        // The range expression is evaluated outside the scope of the iteration variables.
        self.visit_expr(&range.source);
        self.scope.push_scope();
        for binding in [&range.key, &range.value].into_iter().flatten() {
            match binding.as_ident() {
                Some(ident) if range.define => self.declare(ident, DeclKind::Var),
                _ => self.visit_expr(binding),
            }
        }
        self.visit_block(&range.body);
        self.scope.pop_scope();
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match &expr.node {
            ExprNode::Ident(ident) => self.resolve(ident),
            // Field names are resolved by the type checker, which we don't have.
            ExprNode::Selector { base, .. } => self.visit_expr(base),
            ExprNode::Composite { ty, .. } => {
                self.bind_elements(ty.as_ref().map(|t| t.text.as_str()), expr)
            }
            _ => walk_expr(self, expr),
        }
    }

    fn visit_func_lit(&mut self, func: &'a FuncLit) {
        self.scope.push_scope();
        self.declare_signature(&func.signature);
        walk_stmts(self, &func.body.stmts);
        self.scope.pop_scope();
    }
}
