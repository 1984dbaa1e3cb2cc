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

//! Read-only traversal of the syntax tree.
//!
//! Implementors override the `visit_*` methods for the nodes they care about, and call the
//! matching `walk_*` function to continue into the children. Every identifier occurrence in the
//! tree, declaring or referring, reaches `visit_ident` exactly once per walk. Children are
//! visited in source order, so a walk is a pre-order, document-order traversal.

use crate::ast::{
    Block, CaseClause, CommClause, Decl, Element, Expr, ExprNode, File, ForStmt, FuncDecl,
    FuncLit, Ident, Param, RangeStmt, Signature, Stmt, StmtNode, TopDecl,
};

pub trait Visitor<'a> {
    fn visit_file(&mut self, file: &'a File) {
        walk_file(self, file);
    }

    fn visit_func_decl(&mut self, func: &'a FuncDecl) {
        walk_func_decl(self, func);
    }

    fn visit_decl(&mut self, decl: &'a Decl) {
        walk_decl(self, decl);
    }

    fn visit_block(&mut self, block: &'a Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_for(&mut self, for_stmt: &'a ForStmt) {
        walk_for(self, for_stmt);
    }

    fn visit_range(&mut self, range: &'a RangeStmt) {
        walk_range(self, range);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }

    fn visit_func_lit(&mut self, func: &'a FuncLit) {
        walk_func_lit(self, func);
    }

    fn visit_ident(&mut self, _ident: &'a Ident) {}
}

pub fn walk_file<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, file: &'a File) {
    visitor.visit_ident(&file.package);
    for import in &file.imports {
        if let Some(alias) = &import.alias {
            visitor.visit_ident(alias);
        }
    }
    for decl in &file.decls {
        match decl {
            TopDecl::Func(func) => visitor.visit_func_decl(func),
            TopDecl::Decl(decl) => visitor.visit_decl(decl),
        }
    }
}

pub fn walk_func_decl<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, func: &'a FuncDecl) {
    walk_params(visitor, &func.receiver);
    visitor.visit_ident(&func.name);
    walk_signature(visitor, &func.signature);
    if let Some(body) = &func.body {
        visitor.visit_block(body);
    }
}

pub fn walk_signature<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, signature: &'a Signature) {
    walk_params(visitor, &signature.params);
    walk_params(visitor, &signature.results);
}

fn walk_params<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, params: &'a [Param]) {
    for param in params {
        for name in &param.names {
            visitor.visit_ident(name);
        }
    }
}

pub fn walk_decl<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, decl: &'a Decl) {
    match decl {
        Decl::Var(specs) | Decl::Const(specs) => {
            for spec in specs {
                for name in &spec.names {
                    visitor.visit_ident(name);
                }
                for value in &spec.values {
                    visitor.visit_expr(value);
                }
            }
        }
        Decl::Type(specs) => {
            for spec in specs {
                visitor.visit_ident(&spec.name);
            }
        }
    }
}

pub fn walk_block<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, block: &'a Block) {
    walk_stmts(visitor, &block.stmts);
}

pub fn walk_stmts<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, stmts: &'a [Stmt]) {
    for stmt in stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, stmt: &'a Stmt) {
    match &stmt.node {
        StmtNode::Decl(decl) => visitor.visit_decl(decl),
        StmtNode::Labeled { label, stmt } => {
            visitor.visit_ident(label);
            if let Some(stmt) = stmt {
                visitor.visit_stmt(stmt);
            }
        }
        StmtNode::Expr(expr) | StmtNode::Go(expr) | StmtNode::Defer(expr) => {
            visitor.visit_expr(expr)
        }
        StmtNode::Send { channel, value } => {
            visitor.visit_expr(channel);
            visitor.visit_expr(value);
        }
        StmtNode::IncDec { target, .. } => visitor.visit_expr(target),
        StmtNode::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs) {
                visitor.visit_expr(expr);
            }
        }
        StmtNode::Return(results) => {
            for expr in results {
                visitor.visit_expr(expr);
            }
        }
        StmtNode::Branch { label, .. } => {
            if let Some(label) = label {
                visitor.visit_ident(label);
            }
        }
        StmtNode::Block(block) => visitor.visit_block(block),
        StmtNode::If(if_stmt) => {
            if let Some(init) = &if_stmt.init {
                visitor.visit_stmt(init);
            }
            visitor.visit_expr(&if_stmt.cond);
            visitor.visit_block(&if_stmt.then);
            if let Some(otherwise) = &if_stmt.otherwise {
                visitor.visit_stmt(otherwise);
            }
        }
        StmtNode::Switch(switch) => {
            if let Some(init) = &switch.init {
                visitor.visit_stmt(init);
            }
            if let Some(tag) = &switch.tag {
                visitor.visit_expr(tag);
            }
            walk_case_clauses(visitor, &switch.clauses);
        }
        StmtNode::TypeSwitch(switch) => {
            if let Some(init) = &switch.init {
                visitor.visit_stmt(init);
            }
            if let Some(binding) = &switch.binding {
                visitor.visit_ident(binding);
            }
            visitor.visit_expr(&switch.subject);
            walk_case_clauses(visitor, &switch.clauses);
        }
        StmtNode::Select(clauses) => walk_comm_clauses(visitor, clauses),
        StmtNode::For(for_stmt) => visitor.visit_for(for_stmt),
        StmtNode::Range(range) => visitor.visit_range(range),
    }
}

pub fn walk_case_clauses<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, clauses: &'a [CaseClause]) {
    for clause in clauses {
        for value in clause.values.iter().flatten() {
            visitor.visit_expr(value);
        }
        walk_stmts(visitor, &clause.body);
    }
}

pub fn walk_comm_clauses<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, clauses: &'a [CommClause]) {
    for clause in clauses {
        if let Some(comm) = &clause.comm {
            visitor.visit_stmt(comm);
        }
        walk_stmts(visitor, &clause.body);
    }
}

pub fn walk_for<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, for_stmt: &'a ForStmt) {
    if let Some(init) = &for_stmt.init {
        visitor.visit_stmt(init);
    }
    if let Some(cond) = &for_stmt.cond {
        visitor.visit_expr(cond);
    }
    if let Some(post) = &for_stmt.post {
        visitor.visit_stmt(post);
    }
    visitor.visit_block(&for_stmt.body);
}

pub fn walk_range<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, range: &'a RangeStmt) {
    if let Some(key) = &range.key {
        visitor.visit_expr(key);
    }
    if let Some(value) = &range.value {
        visitor.visit_expr(value);
    }
    visitor.visit_expr(&range.source);
    visitor.visit_block(&range.body);
}

pub fn walk_func_lit<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, func: &'a FuncLit) {
    walk_signature(visitor, &func.signature);
    visitor.visit_block(&func.body);
}

pub fn walk_elements<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, elements: &'a [Element]) {
    for element in elements {
        if let Some(key) = &element.key {
            visitor.visit_expr(key);
        }
        visitor.visit_expr(&element.value);
    }
}

pub fn walk_expr<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, expr: &'a Expr) {
    match &expr.node {
        ExprNode::Ident(ident) => visitor.visit_ident(ident),
        ExprNode::Literal(_) | ExprNode::Type(_) => {}
        ExprNode::FuncLit(func) => visitor.visit_func_lit(func),
        ExprNode::Composite { elements, .. } => walk_elements(visitor, elements),
        ExprNode::Paren(inner) | ExprNode::Deref(inner) | ExprNode::Unary(_, inner) => {
            visitor.visit_expr(inner)
        }
        ExprNode::Selector { base, field } => {
            visitor.visit_expr(base);
            visitor.visit_ident(field);
        }
        ExprNode::Index { base, indices } => {
            visitor.visit_expr(base);
            for index in indices {
                visitor.visit_expr(index);
            }
        }
        ExprNode::Slice {
            base,
            low,
            high,
            max,
        } => {
            visitor.visit_expr(base);
            for bound in [low, high, max].into_iter().flatten() {
                visitor.visit_expr(bound);
            }
        }
        ExprNode::TypeAssert { base, .. } => visitor.visit_expr(base),
        ExprNode::Call { function, args, .. } => {
            visitor.visit_expr(function);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprNode::Binary(_, lhs, rhs) => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
    }
}
