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

/// Kicks off the Pest parser and converts it into our AST, then binds names.
/// This is the main entry point for parsing.
use std::cell::Cell;
use std::iter::Peekable;

pub use pest::Parser as PestParser;
use pest::error::LineColLocation;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use tracing::debug;

use crate::ast::{
    AssignOp, BinaryOp, Block, BranchKind, CaseClause, CommClause, Decl, Element, Expr, ExprNode,
    File, ForStmt, FuncDecl, FuncLit, Ident, IdentId, ImportSpec, IncDecOp, IfStmt, Literal,
    LiteralKind, Param, RangeStmt, Signature, Stmt, StmtNode, SwitchStmt, TopDecl, TypeExpr,
    TypeSpec, TypeSwitchStmt, UnaryOp, ValueSpec,
};
use crate::binder::{Bindings, bind};
use crate::diagnostics::build_parse_error_details;
use crate::names::Names;
use crate::parse::go::{GoParser, Rule};
use crate::semicolons::{OffsetMap, insert_semicolons};
use loopvet_common::{LineCol, ParseErrorDetails, SourceError, Span, SymbolId};

pub mod go {
    #[derive(Parser)]
    #[grammar = "src/go.pest"]
    pub struct GoParser;
}

const HEADER_SIMPLE_STMTS: &[Rule] = &[
    Rule::header_short_var_decl,
    Rule::header_assign_stmt,
    Rule::header_send_stmt,
    Rule::header_inc_dec_stmt,
    Rule::header_expr_stmt,
];

/// A parsed and name-resolved compilation unit.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub name: String,
    pub source: String,
    pub file: File,
    pub names: Names,
    /// Indexed by [`IdentId`].
    pub resolutions: Vec<Option<SymbolId>>,
}

impl ParsedFile {
    /// The symbol an identifier occurrence declares or refers to. `None` for predeclared names,
    /// the blank identifier, field names, labels and anything else that is not a binding in
    /// this file.
    pub fn symbol_of(&self, ident: &Ident) -> Option<SymbolId> {
        self.resolutions.get(ident.id.offset()).copied().flatten()
    }
}

/// The tree the grammar produced is not shaped the way the transformer expects. Only reachable
/// if the grammar and this file disagree.
fn malformed(pair: &Pair<Rule>, expected: &str) -> SourceError {
    let (line, column) = pair.line_col();
    SourceError::ParseError {
        line,
        column,
        context: pair.as_str().lines().next().unwrap_or_default().to_string(),
        end_line_col: None,
        message: format!("expected {expected} in {:?}", pair.as_rule()),
        details: ParseErrorDetails::default(),
    }
}

/// Cursor over the children of a pair that reports missing children as errors.
struct Children<'i> {
    parent: Pair<'i, Rule>,
    inner: Peekable<Pairs<'i, Rule>>,
}

impl<'i> Children<'i> {
    fn of(pair: Pair<'i, Rule>) -> Self {
        Self {
            inner: pair.clone().into_inner().peekable(),
            parent: pair,
        }
    }

    fn next(&mut self) -> Option<Pair<'i, Rule>> {
        self.inner.next()
    }

    fn expect(&mut self, what: &str) -> Result<Pair<'i, Rule>, SourceError> {
        self.inner
            .next()
            .ok_or_else(|| malformed(&self.parent, what))
    }

    fn next_if(&mut self, rule: Rule) -> Option<Pair<'i, Rule>> {
        self.inner.next_if(|p| p.as_rule() == rule)
    }

    fn next_if_any(&mut self, rules: &[Rule]) -> Option<Pair<'i, Rule>> {
        self.inner.next_if(|p| rules.contains(&p.as_rule()))
    }
}

enum LoopHeader<'i> {
    None,
    Cond(Pair<'i, Rule>),
    Clause(Pair<'i, Rule>),
    Range(Pair<'i, Rule>),
}

pub struct TreeTransformer {
    next_ident: Cell<u32>,
    pratt: PrattParser<Rule>,
    /// Maps offsets in the parsed text, which has its semicolons written out, back to the
    /// source.
    offsets: OffsetMap,
}

impl Default for TreeTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeTransformer {
    pub fn new() -> Self {
        let pratt = PrattParser::new()
            // Go's five binary precedence levels, lowest first.
            // 1. Logical or.
            .op(Op::infix(Rule::lor, Assoc::Left))
            // 2. Logical and.
            .op(Op::infix(Rule::land, Assoc::Left))
            // 3. Comparison.
            .op(Op::infix(Rule::eq, Assoc::Left)
                | Op::infix(Rule::neq, Assoc::Left)
                | Op::infix(Rule::lt, Assoc::Left)
                | Op::infix(Rule::lte, Assoc::Left)
                | Op::infix(Rule::gt, Assoc::Left)
                | Op::infix(Rule::gte, Assoc::Left))
            // 4. Additive.
            .op(Op::infix(Rule::add, Assoc::Left)
                | Op::infix(Rule::sub, Assoc::Left)
                | Op::infix(Rule::bitor, Assoc::Left)
                | Op::infix(Rule::bitxor, Assoc::Left))
            // 5. Multiplicative.
            .op(Op::infix(Rule::mul, Assoc::Left)
                | Op::infix(Rule::div, Assoc::Left)
                | Op::infix(Rule::modulus, Assoc::Left)
                | Op::infix(Rule::shl, Assoc::Left)
                | Op::infix(Rule::shr, Assoc::Left)
                | Op::infix(Rule::bitand, Assoc::Left)
                | Op::infix(Rule::bitand_not, Assoc::Left))
            // Unary operators bind tighter than any binary operator.
            .op(Op::prefix(Rule::neg)
                | Op::prefix(Rule::pos)
                | Op::prefix(Rule::not)
                | Op::prefix(Rule::bit_not)
                | Op::prefix(Rule::deref)
                | Op::prefix(Rule::addr)
                | Op::prefix(Rule::recv))
            // Selectors, indexing, slicing, assertions and calls bind tightest.
            .op(Op::postfix(Rule::selector)
                | Op::postfix(Rule::type_assert)
                | Op::postfix(Rule::slice_expr)
                | Op::postfix(Rule::index_expr)
                | Op::postfix(Rule::call));
        Self {
            next_ident: Cell::new(0),
            pratt,
            offsets: OffsetMap::default(),
        }
    }

    /// A transformer for text produced by [`insert_semicolons`].
    pub fn with_offsets(offsets: OffsetMap) -> Self {
        Self {
            offsets,
            ..Self::new()
        }
    }

    fn span_of(&self, pair: &Pair<Rule>) -> Span {
        let span = pair.as_span();
        Span::new(
            self.offsets.source_offset(span.start()),
            self.offsets.source_offset(span.end()),
            LineCol::from(pair.line_col()),
        )
    }

    fn type_expr(&self, pair: &Pair<Rule>) -> TypeExpr {
        let span = pair.as_span();
        TypeExpr {
            text: self.offsets.original_text(span.as_str(), span.start()),
            span: self.span_of(pair),
        }
    }

    /// Number of identifier ids handed out so far.
    pub fn ident_count(&self) -> usize {
        self.next_ident.get() as usize
    }

    fn mk_ident(&self, pair: &Pair<Rule>) -> Ident {
        let id = IdentId(self.next_ident.get());
        self.next_ident.set(id.0 + 1);
        Ident {
            id,
            name: pair.as_str().to_string(),
            span: self.span_of(pair),
        }
    }

    fn parse_ident(&self, pair: Pair<Rule>) -> Result<Ident, SourceError> {
        if pair.as_rule() != Rule::ident {
            return Err(malformed(&pair, "an identifier"));
        }
        Ok(self.mk_ident(&pair))
    }

    fn parse_ident_list(&self, pair: Pair<Rule>) -> Result<Vec<Ident>, SourceError> {
        pair.into_inner().map(|p| self.parse_ident(p)).collect()
    }

    fn parse_expr_list(&self, pair: Pair<Rule>) -> Result<Vec<Expr>, SourceError> {
        pair.into_inner().map(|p| self.parse_expr(p)).collect()
    }

    pub fn transform_file(&self, pair: Pair<Rule>) -> Result<File, SourceError> {
        let span = self.span_of(&pair);
        let mut children = Children::of(pair);
        let package_clause = children.expect("a package clause")?;
        let package = self.parse_ident(Children::of(package_clause).expect("a package name")?)?;

        let mut imports = vec![];
        let mut decls = vec![];
        while let Some(child) = children.next() {
            match child.as_rule() {
                Rule::import_decl => {
                    for spec in child.into_inner() {
                        imports.push(self.parse_import_spec(spec)?);
                    }
                }
                Rule::func_decl => decls.push(TopDecl::Func(self.parse_func_decl(child)?)),
                Rule::var_decl | Rule::const_decl | Rule::type_decl => {
                    decls.push(TopDecl::Decl(self.parse_decl(child)?))
                }
                Rule::EOI => {}
                _ => return Err(malformed(&child, "a declaration")),
            }
        }
        Ok(File {
            package,
            imports,
            decls,
            span,
        })
    }

    fn parse_import_spec(&self, pair: Pair<Rule>) -> Result<ImportSpec, SourceError> {
        let span = self.span_of(&pair);
        let mut alias = None;
        let mut dot = false;
        let mut path = None;
        for child in pair.clone().into_inner() {
            match child.as_rule() {
                Rule::ident => alias = Some(self.mk_ident(&child)),
                Rule::dot_import => dot = true,
                Rule::string | Rule::raw_string => path = Some(unquote_pair(&child)?),
                _ => return Err(malformed(&child, "an import path")),
            }
        }
        let Some(path) = path else {
            return Err(malformed(&pair, "an import path"));
        };
        Ok(ImportSpec {
            alias,
            dot,
            path,
            span,
        })
    }

    fn parse_func_decl(&self, pair: Pair<Rule>) -> Result<FuncDecl, SourceError> {
        let span = self.span_of(&pair);
        let mut children = Children::of(pair);
        let receiver = match children.next_if(Rule::receiver) {
            Some(receiver) => self.parse_params(receiver)?,
            None => vec![],
        };
        let name = self.parse_ident(children.expect("a function name")?)?;
        children.next_if(Rule::type_params);
        let signature = self.parse_signature(children.expect("a signature")?)?;
        let body = children
            .next_if(Rule::block)
            .map(|b| self.parse_block(b))
            .transpose()?;
        Ok(FuncDecl {
            receiver,
            name,
            signature,
            body,
            span,
        })
    }

    fn parse_func_lit(&self, pair: Pair<Rule>) -> Result<FuncLit, SourceError> {
        let span = self.span_of(&pair);
        let mut children = Children::of(pair);
        let signature = self.parse_signature(children.expect("a signature")?)?;
        let body = self.parse_block(children.expect("a function body")?)?;
        Ok(FuncLit {
            signature,
            body,
            span,
        })
    }

    fn parse_signature(&self, pair: Pair<Rule>) -> Result<Signature, SourceError> {
        let mut children = Children::of(pair);
        let params = self.parse_params(children.expect("parameters")?)?;
        let results = match children.next() {
            None => vec![],
            Some(result) => {
                let inner = Children::of(result).expect("a result type")?;
                match inner.as_rule() {
                    Rule::parameters => self.parse_params(inner)?,
                    Rule::type_expr => vec![Param {
                        names: vec![],
                        ty: self.type_expr(&inner),
                        variadic: false,
                    }],
                    _ => return Err(malformed(&inner, "a result type")),
                }
            }
        };
        Ok(Signature { params, results })
    }

    /// `parameters` or `receiver`.
    fn parse_params(&self, pair: Pair<Rule>) -> Result<Vec<Param>, SourceError> {
        pair.into_inner().map(|p| self.parse_param(p)).collect()
    }

    fn parse_param(&self, pair: Pair<Rule>) -> Result<Param, SourceError> {
        let mut names = vec![];
        let mut variadic = false;
        let mut ty = None;
        for child in pair.clone().into_inner() {
            match child.as_rule() {
                Rule::ident => names.push(self.mk_ident(&child)),
                Rule::variadic => variadic = true,
                Rule::type_expr => ty = Some(self.type_expr(&child)),
                _ => return Err(malformed(&child, "a parameter")),
            }
        }
        let Some(ty) = ty else {
            return Err(malformed(&pair, "a parameter type"));
        };
        Ok(Param {
            names,
            ty,
            variadic,
        })
    }

    fn parse_decl(&self, pair: Pair<Rule>) -> Result<Decl, SourceError> {
        match pair.as_rule() {
            Rule::var_decl => Ok(Decl::Var(
                pair.into_inner()
                    .map(|s| self.parse_value_spec(s))
                    .collect::<Result<_, _>>()?,
            )),
            Rule::const_decl => Ok(Decl::Const(
                pair.into_inner()
                    .map(|s| self.parse_value_spec(s))
                    .collect::<Result<_, _>>()?,
            )),
            Rule::type_decl => Ok(Decl::Type(
                pair.into_inner()
                    .map(|s| self.parse_type_spec(s))
                    .collect::<Result<_, _>>()?,
            )),
            _ => Err(malformed(&pair, "a declaration")),
        }
    }

    fn parse_value_spec(&self, pair: Pair<Rule>) -> Result<ValueSpec, SourceError> {
        let span = self.span_of(&pair);
        let mut names = vec![];
        let mut ty = None;
        let mut values = vec![];
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::ident_list => names = self.parse_ident_list(child)?,
                Rule::type_expr => ty = Some(self.type_expr(&child)),
                Rule::expr_list => values = self.parse_expr_list(child)?,
                _ => return Err(malformed(&child, "a value spec")),
            }
        }
        Ok(ValueSpec {
            names,
            ty,
            values,
            span,
        })
    }

    fn parse_type_spec(&self, pair: Pair<Rule>) -> Result<TypeSpec, SourceError> {
        let start = pair.as_span().start();
        let text = pair.as_str();
        let mut children = Children::of(pair);
        let name_pair = children.expect("a type name")?;
        let mut after_name = name_pair.as_span().end() - start;
        if let Some(params) = children.next_if(Rule::type_params) {
            after_name = params.as_span().end() - start;
        }
        let alias = text[after_name..].trim_start().starts_with('=');
        let name = self.parse_ident(name_pair)?;
        let ty = self.type_expr(&children.expect("a type")?);
        Ok(TypeSpec { name, alias, ty })
    }

    fn parse_block(&self, pair: Pair<Rule>) -> Result<Block, SourceError> {
        let span = self.span_of(&pair);
        let statements = Children::of(pair).expect("statements")?;
        Ok(Block {
            stmts: self.parse_statements(statements)?,
            span,
        })
    }

    fn parse_statements(&self, pair: Pair<Rule>) -> Result<Vec<Stmt>, SourceError> {
        pair.into_inner().map(|p| self.parse_statement(p)).collect()
    }

    /// A `statement` wrapper pair.
    fn parse_statement(&self, pair: Pair<Rule>) -> Result<Stmt, SourceError> {
        let inner = Children::of(pair).expect("a statement")?;
        self.parse_stmt(inner)
    }

    fn parse_stmt(&self, pair: Pair<Rule>) -> Result<Stmt, SourceError> {
        let span = self.span_of(&pair);
        let node = match pair.as_rule() {
            Rule::labeled_stmt => {
                let mut children = Children::of(pair);
                let label = self.parse_ident(children.expect("a label")?)?;
                let stmt = children
                    .next()
                    .map(|s| self.parse_statement(s).map(Box::new))
                    .transpose()?;
                StmtNode::Labeled { label, stmt }
            }
            Rule::go_stmt => StmtNode::Go(self.parse_expr(Children::of(pair).expect("a call")?)?),
            Rule::defer_stmt => {
                StmtNode::Defer(self.parse_expr(Children::of(pair).expect("a call")?)?)
            }
            Rule::return_stmt => match Children::of(pair).next() {
                Some(results) => StmtNode::Return(self.parse_expr_list(results)?),
                None => StmtNode::Return(vec![]),
            },
            Rule::break_stmt | Rule::continue_stmt | Rule::goto_stmt | Rule::fallthrough_stmt => {
                let kind = match pair.as_rule() {
                    Rule::break_stmt => BranchKind::Break,
                    Rule::continue_stmt => BranchKind::Continue,
                    Rule::goto_stmt => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = Children::of(pair)
                    .next()
                    .map(|l| self.parse_ident(l))
                    .transpose()?;
                StmtNode::Branch { kind, label }
            }
            Rule::block => StmtNode::Block(self.parse_block(pair)?),
            Rule::if_stmt => StmtNode::If(self.parse_if(pair)?),
            Rule::for_stmt => self.parse_for(pair)?,
            Rule::switch_stmt => self.parse_switch(pair)?,
            Rule::select_stmt => StmtNode::Select(
                pair.into_inner()
                    .map(|c| self.parse_comm_clause(c))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::var_decl | Rule::const_decl | Rule::type_decl => {
                StmtNode::Decl(self.parse_decl(pair)?)
            }
            _ => self.parse_simple_stmt(pair)?,
        };
        Ok(Stmt::new(node, span))
    }

    /// Simple statements, in both their block and header flavours.
    fn parse_simple_stmt(&self, pair: Pair<Rule>) -> Result<StmtNode, SourceError> {
        let rule = pair.as_rule();
        let mut children = Children::of(pair.clone());
        let node = match rule {
            Rule::short_var_decl | Rule::header_short_var_decl => {
                let lhs = self
                    .parse_ident_list(children.expect("identifiers")?)?
                    .into_iter()
                    .map(|ident| {
                        let span = ident.span;
                        Expr::new(ExprNode::Ident(ident), span)
                    })
                    .collect();
                let rhs = self.parse_expr_list(children.expect("values")?)?;
                StmtNode::Assign {
                    lhs,
                    op: AssignOp::Define,
                    rhs,
                }
            }
            Rule::assign_stmt | Rule::header_assign_stmt => {
                let lhs = self.parse_expr_list(children.expect("assignment targets")?)?;
                let op_pair = children.expect("an assignment operator")?;
                let Some(op) = AssignOp::from_token(op_pair.as_str()) else {
                    return Err(malformed(&op_pair, "an assignment operator"));
                };
                let rhs = self.parse_expr_list(children.expect("values")?)?;
                StmtNode::Assign { lhs, op, rhs }
            }
            Rule::send_stmt | Rule::header_send_stmt => {
                let channel = self.parse_expr(children.expect("a channel")?)?;
                let value = self.parse_expr(children.expect("a value")?)?;
                StmtNode::Send { channel, value }
            }
            Rule::inc_dec_stmt | Rule::header_inc_dec_stmt => {
                let target = self.parse_expr(children.expect("an operand")?)?;
                let op = match children.expect("++ or --")?.as_rule() {
                    Rule::inc => IncDecOp::Inc,
                    _ => IncDecOp::Dec,
                };
                StmtNode::IncDec { target, op }
            }
            Rule::expr_stmt | Rule::header_expr_stmt => {
                StmtNode::Expr(self.parse_expr(children.expect("an expression")?)?)
            }
            _ => return Err(malformed(&pair, "a statement")),
        };
        Ok(node)
    }

    fn parse_optional_header(
        &self,
        children: &mut Children,
    ) -> Result<Option<Box<Stmt>>, SourceError> {
        children
            .next_if_any(HEADER_SIMPLE_STMTS)
            .map(|p| self.parse_stmt(p).map(Box::new))
            .transpose()
    }

    fn parse_if(&self, pair: Pair<Rule>) -> Result<IfStmt, SourceError> {
        let mut children = Children::of(pair);
        let init = self.parse_optional_header(&mut children)?;
        let cond = self.parse_expr(children.expect("a condition")?)?;
        let then = self.parse_block(children.expect("a block")?)?;
        let otherwise = match children.next() {
            Some(else_clause) => {
                let branch = Children::of(else_clause).expect("an else branch")?;
                Some(Box::new(self.parse_stmt(branch)?))
            }
            None => None,
        };
        Ok(IfStmt {
            init,
            cond,
            then,
            otherwise,
        })
    }

    fn parse_for(&self, pair: Pair<Rule>) -> Result<StmtNode, SourceError> {
        let span = self.span_of(&pair);
        let mut children = Children::of(pair);
        let header = match children.next_if_any(&[
            Rule::range_clause,
            Rule::for_clause,
            Rule::header_expr,
        ]) {
            None => LoopHeader::None,
            Some(p) if p.as_rule() == Rule::range_clause => LoopHeader::Range(p),
            Some(p) if p.as_rule() == Rule::for_clause => LoopHeader::Clause(p),
            Some(p) => LoopHeader::Cond(p),
        };
        let body_pair = children.expect("a loop body")?;

        let mut for_stmt = ForStmt {
            init: None,
            cond: None,
            post: None,
            body: Block {
                stmts: vec![],
                span: self.span_of(&body_pair),
            },
            span,
        };
        match header {
            LoopHeader::None => {}
            LoopHeader::Cond(cond) => for_stmt.cond = Some(self.parse_expr(cond)?),
            LoopHeader::Clause(clause) => {
                for part in clause.into_inner() {
                    match part.as_rule() {
                        Rule::for_init => {
                            let stmt = Children::of(part).expect("an init statement")?;
                            for_stmt.init = Some(Box::new(self.parse_stmt(stmt)?));
                        }
                        Rule::for_cond => {
                            let cond = Children::of(part).expect("a condition")?;
                            for_stmt.cond = Some(self.parse_expr(cond)?);
                        }
                        Rule::for_post => {
                            let stmt = Children::of(part).expect("a post statement")?;
                            for_stmt.post = Some(Box::new(self.parse_stmt(stmt)?));
                        }
                        _ => return Err(malformed(&part, "a for clause")),
                    }
                }
            }
            LoopHeader::Range(clause) => {
                let mut parts = Children::of(clause);
                let (mut key, mut value) = (None, None);
                if let Some(lhs) = parts.next_if(Rule::range_lhs) {
                    let mut bindings = lhs.into_inner();
                    key = bindings.next().map(|k| self.parse_expr(k)).transpose()?;
                    value = bindings.next().map(|v| self.parse_expr(v)).transpose()?;
                }
                let define = parts.next_if(Rule::define).is_some();
                parts.next_if(Rule::assign);
                let source = self.parse_expr(parts.expect("a range expression")?)?;
                let body = self.parse_block(body_pair)?;
                return Ok(StmtNode::Range(RangeStmt {
                    key,
                    value,
                    define,
                    source,
                    body,
                    span,
                }));
            }
        }
        for_stmt.body = self.parse_block(body_pair)?;
        Ok(StmtNode::For(for_stmt))
    }

    fn parse_switch(&self, pair: Pair<Rule>) -> Result<StmtNode, SourceError> {
        let mut children = Children::of(pair);
        let header = children.expect("a switch header")?;
        let is_type_switch = header.as_rule() == Rule::type_switch_guard;
        let mut header_parts = Children::of(header);
        let init = self.parse_optional_header(&mut header_parts)?;

        if is_type_switch {
            let binding = header_parts
                .next_if(Rule::ident)
                .map(|b| self.parse_ident(b))
                .transpose()?;
            let guard = header_parts.expect("a type switch guard")?;
            let subject = self.parse_expr(Children::of(guard).expect("an operand")?)?;
            let clauses = self.parse_case_clauses(children)?;
            return Ok(StmtNode::TypeSwitch(TypeSwitchStmt {
                init,
                binding,
                subject,
                clauses,
            }));
        }

        let tag = header_parts
            .next_if(Rule::header_expr)
            .map(|t| self.parse_expr(t))
            .transpose()?;
        let clauses = self.parse_case_clauses(children)?;
        Ok(StmtNode::Switch(SwitchStmt {
            init,
            tag,
            clauses,
        }))
    }

    fn parse_case_clauses(&self, mut children: Children) -> Result<Vec<CaseClause>, SourceError> {
        let mut clauses = vec![];
        while let Some(clause) = children.next() {
            let span = self.span_of(&clause);
            let mut parts = Children::of(clause);
            let label = parts.expect("a case label")?;
            let values = match label.as_rule() {
                Rule::case_label => {
                    let values = Children::of(label).expect("case values")?;
                    Some(self.parse_expr_list(values)?)
                }
                _ => None,
            };
            let body = self.parse_statements(parts.expect("statements")?)?;
            clauses.push(CaseClause { values, body, span });
        }
        Ok(clauses)
    }

    fn parse_comm_clause(&self, pair: Pair<Rule>) -> Result<CommClause, SourceError> {
        let span = self.span_of(&pair);
        let mut parts = Children::of(pair);
        let label = parts.expect("a case label")?;
        let comm = match label.as_rule() {
            Rule::comm_case => {
                let stmt = Children::of(label).expect("a communication")?;
                Some(Box::new(self.parse_stmt(stmt)?))
            }
            _ => None,
        };
        let body = self.parse_statements(parts.expect("statements")?)?;
        Ok(CommClause { comm, body, span })
    }

    fn parse_expr(&self, pair: Pair<Rule>) -> Result<Expr, SourceError> {
        match pair.as_rule() {
            Rule::expr | Rule::header_expr | Rule::header_expr_operand => {
                self.parse_operators(pair.into_inner())
            }
            Rule::type_expr => Ok(Expr::new(
                ExprNode::Type(self.type_expr(&pair)),
                self.span_of(&pair),
            )),
            _ => Err(malformed(&pair, "an expression")),
        }
    }

    fn parse_operators(&self, pairs: Pairs<Rule>) -> Result<Expr, SourceError> {
        self.pratt
            .map_primary(|primary| self.parse_primary(primary))
            .map_prefix(|op, rhs| {
                let rhs = rhs?;
                let span = Span::new(
                    self.offsets.source_offset(op.as_span().start()),
                    rhs.span.end,
                    LineCol::from(op.line_col()),
                );
                let operand = Box::new(rhs);
                let node = match op.as_rule() {
                    Rule::neg => ExprNode::Unary(UnaryOp::Neg, operand),
                    Rule::pos => ExprNode::Unary(UnaryOp::Pos, operand),
                    Rule::not => ExprNode::Unary(UnaryOp::Not, operand),
                    Rule::bit_not => ExprNode::Unary(UnaryOp::BitNot, operand),
                    Rule::addr => ExprNode::Unary(UnaryOp::Addr, operand),
                    Rule::recv => ExprNode::Unary(UnaryOp::Recv, operand),
                    Rule::deref => ExprNode::Deref(operand),
                    _ => return Err(malformed(&op, "a unary operator")),
                };
                Ok(Expr::new(node, span))
            })
            .map_postfix(|lhs, op| self.parse_postfix(lhs?, op))
            .map_infix(|lhs, op, rhs| {
                let (lhs, rhs) = (lhs?, rhs?);
                let op = match op.as_rule() {
                    Rule::lor => BinaryOp::LOr,
                    Rule::land => BinaryOp::LAnd,
                    Rule::eq => BinaryOp::Eq,
                    Rule::neq => BinaryOp::NEq,
                    Rule::lt => BinaryOp::Lt,
                    Rule::lte => BinaryOp::LtE,
                    Rule::gt => BinaryOp::Gt,
                    Rule::gte => BinaryOp::GtE,
                    Rule::add => BinaryOp::Add,
                    Rule::sub => BinaryOp::Sub,
                    Rule::bitor => BinaryOp::BitOr,
                    Rule::bitxor => BinaryOp::BitXor,
                    Rule::mul => BinaryOp::Mul,
                    Rule::div => BinaryOp::Div,
                    Rule::modulus => BinaryOp::Mod,
                    Rule::shl => BinaryOp::Shl,
                    Rule::shr => BinaryOp::Shr,
                    Rule::bitand => BinaryOp::BitAnd,
                    Rule::bitand_not => BinaryOp::BitAndNot,
                    _ => return Err(malformed(&op, "a binary operator")),
                };
                let span = Span::new(lhs.span.start, rhs.span.end, lhs.span.line_col);
                Ok(Expr::new(
                    ExprNode::Binary(op, Box::new(lhs), Box::new(rhs)),
                    span,
                ))
            })
            .parse(pairs)
    }

    fn parse_primary(&self, pair: Pair<Rule>) -> Result<Expr, SourceError> {
        let span = self.span_of(&pair);
        let node = match pair.as_rule() {
            Rule::ident => ExprNode::Ident(self.mk_ident(&pair)),
            Rule::basic_lit => ExprNode::Literal(parse_literal(pair)?),
            Rule::func_lit => ExprNode::FuncLit(self.parse_func_lit(pair)?),
            Rule::composite_lit | Rule::header_composite_lit => {
                let mut children = Children::of(pair);
                let ty = self.type_expr(&children.expect("a literal type")?);
                let elements = self.parse_literal_value(children.expect("a literal value")?)?;
                ExprNode::Composite {
                    ty: Some(ty),
                    elements,
                }
            }
            Rule::type_operand => ExprNode::Type(self.type_expr(&pair)),
            Rule::paren_expr => ExprNode::Paren(Box::new(
                self.parse_expr(Children::of(pair).expect("an expression")?)?,
            )),
            _ => return Err(malformed(&pair, "an operand")),
        };
        Ok(Expr::new(node, span))
    }

    fn parse_literal_value(&self, pair: Pair<Rule>) -> Result<Vec<Element>, SourceError> {
        pair.into_inner()
            .map(|element| {
                let mut parts = Children::of(element);
                let first = self.parse_element_part(parts.expect("an element")?)?;
                match parts.next() {
                    Some(value) => Ok(Element {
                        key: Some(first),
                        value: self.parse_element_part(value)?,
                    }),
                    None => Ok(Element {
                        key: None,
                        value: first,
                    }),
                }
            })
            .collect()
    }

    /// `element_key` or `element_value`: a nested literal with its type elided, or an
    /// expression.
    fn parse_element_part(&self, pair: Pair<Rule>) -> Result<Expr, SourceError> {
        let inner = Children::of(pair).expect("an element")?;
        match inner.as_rule() {
            Rule::literal_value => {
                let span = self.span_of(&inner);
                let elements = self.parse_literal_value(inner)?;
                Ok(Expr::new(ExprNode::Composite { ty: None, elements }, span))
            }
            _ => self.parse_expr(inner),
        }
    }

    fn parse_postfix(&self, lhs: Expr, op: Pair<Rule>) -> Result<Expr, SourceError> {
        let span = Span::new(
            lhs.span.start,
            self.offsets.source_offset(op.as_span().end()),
            lhs.span.line_col,
        );
        let base = Box::new(lhs);
        let node = match op.as_rule() {
            Rule::selector => ExprNode::Selector {
                base,
                field: self.parse_ident(Children::of(op).expect("a field name")?)?,
            },
            Rule::type_assert => ExprNode::TypeAssert {
                base,
                ty: self.type_expr(&Children::of(op).expect("a type")?),
            },
            Rule::index_expr => ExprNode::Index {
                base,
                indices: op
                    .into_inner()
                    .map(|i| self.parse_expr(i))
                    .collect::<Result<_, _>>()?,
            },
            Rule::slice_expr => {
                let mut bounds = op
                    .into_inner()
                    .map(|bound| {
                        bound
                            .into_inner()
                            .next()
                            .map(|e| self.parse_expr(e).map(Box::new))
                            .transpose()
                    })
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter();
                ExprNode::Slice {
                    base,
                    low: bounds.next().flatten(),
                    high: bounds.next().flatten(),
                    max: bounds.next().flatten(),
                }
            }
            Rule::call => {
                let mut args = vec![];
                let mut ellipsis = false;
                for child in op.into_inner() {
                    match child.as_rule() {
                        Rule::call_args => {
                            for arg in child.into_inner() {
                                args.push(self.parse_expr(Children::of(arg).expect("an argument")?)?);
                            }
                        }
                        Rule::variadic => ellipsis = true,
                        _ => return Err(malformed(&child, "an argument")),
                    }
                }
                ExprNode::Call {
                    function: base,
                    args,
                    ellipsis,
                }
            }
            _ => return Err(malformed(&op, "a postfix operator")),
        };
        Ok(Expr::new(node, span))
    }
}

fn parse_literal(pair: Pair<Rule>) -> Result<Literal, SourceError> {
    let inner = Children::of(pair).expect("a literal")?;
    let kind = match inner.as_rule() {
        Rule::integer => LiteralKind::Int,
        Rule::float => LiteralKind::Float,
        Rule::imaginary => LiteralKind::Imaginary,
        Rule::rune => LiteralKind::Rune,
        Rule::string | Rule::raw_string => {
            unquote_pair(&inner)?;
            LiteralKind::String
        }
        _ => return Err(malformed(&inner, "a literal")),
    };
    Ok(Literal {
        kind,
        raw: inner.as_str().to_string(),
    })
}

fn unquote_pair(pair: &Pair<Rule>) -> Result<String, SourceError> {
    let text = pair.as_str();
    if pair.as_rule() == Rule::raw_string {
        let inner = text.trim_start_matches('`').trim_end_matches('`');
        return Ok(inner.replace('\r', ""));
    }
    unquote_str(text).map_err(|e| SourceError::StringLexError(LineCol::from(pair.line_col()), e))
}

// Lex an interpreted Go string literal. Expectation is:
//   " at beginning and end
//   the single-character escapes \a \b \f \n \r \t \v \\ \' \"
//   \x hex, \u and \U unicode, and three-digit octal escapes
pub fn unquote_str(s: &str) -> Result<String, String> {
    let mut output = String::new();
    let mut chars = s.chars().peekable();
    let Some('"') = chars.next() else {
        return Err("Expected \" at beginning of string".to_string());
    };
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(escape) = chars.next() else {
                    return Err("Unexpected end of string".to_string());
                };
                match escape {
                    'a' => output.push('\u{07}'),
                    'b' => output.push('\u{08}'),
                    'f' => output.push('\u{0C}'),
                    'n' => output.push('\n'),
                    'r' => output.push('\r'),
                    't' => output.push('\t'),
                    'v' => output.push('\u{0B}'),
                    '\\' => output.push('\\'),
                    '\'' => output.push('\''),
                    '"' => output.push('"'),
                    'x' | 'u' | 'U' => {
                        let width = match escape {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let digits: String = chars.by_ref().take(width).collect();
                        let value = u32::from_str_radix(&digits, 16)
                            .map_err(|_| format!("Invalid \\{escape} escape: {digits}"))?;
                        let Some(ch) = char::from_u32(value) else {
                            return Err(format!("Invalid code point in \\{escape} escape"));
                        };
                        output.push(ch);
                    }
                    '0'..='7' => {
                        let mut digits = escape.to_string();
                        digits.extend(chars.by_ref().take(2));
                        let value = u32::from_str_radix(&digits, 8)
                            .map_err(|_| format!("Invalid octal escape: {digits}"))?;
                        let Some(ch) = char::from_u32(value).filter(|_| value <= 255) else {
                            return Err(format!("Octal escape out of range: {digits}"));
                        };
                        output.push(ch);
                    }
                    other => return Err(format!("Unknown escape sequence \\{other}")),
                }
            }
            '"' => {
                if chars.peek().is_some() {
                    return Err("Unexpected \" in string".to_string());
                }
                return Ok(output);
            }
            c => output.push(c),
        }
    }
    Err("Unexpected end of string".to_string())
}

/// Parse Go source into a syntax tree, returning the tree and the number of identifier
/// occurrences in it.
pub fn parse_tree(source: &str) -> Result<(File, usize), SourceError> {
    let terminated = insert_semicolons(source);
    let mut pairs = match GoParser::parse(Rule::file, &terminated.text) {
        Ok(pairs) => pairs,
        Err(e) => {
            let ((line, column), end_line_col) = match e.line_col {
                LineColLocation::Pos(lc) => (lc, None),
                LineColLocation::Span(begin, end) => (begin, Some(end)),
            };
            let (message, mut details) = build_parse_error_details(&terminated.text, &e);
            details.span = details.span.map(|(start, end)| {
                (
                    terminated.offsets.source_offset(start),
                    terminated.offsets.source_offset(end),
                )
            });
            // Inserted semicolons never move a token to another line or column.
            let context = source
                .lines()
                .nth(line.saturating_sub(1))
                .unwrap_or_default()
                .to_string();
            return Err(SourceError::ParseError {
                line,
                column,
                context,
                end_line_col,
                message,
                details,
            });
        }
    };
    let Some(file_pair) = pairs.next() else {
        return Err(SourceError::ParseError {
            line: 1,
            column: 1,
            context: String::new(),
            end_line_col: None,
            message: "empty parse".to_string(),
            details: ParseErrorDetails::default(),
        });
    };
    let transformer = TreeTransformer::with_offsets(terminated.offsets.clone());
    let file = transformer.transform_file(file_pair)?;
    Ok((file, transformer.ident_count()))
}

/// Parse and bind a compilation unit.
pub fn parse_file(name: &str, source: &str) -> Result<ParsedFile, SourceError> {
    let (file, ident_count) = parse_tree(source)?;
    let Bindings { names, resolutions } = bind(&file, ident_count);
    debug!(
        file = name,
        identifiers = ident_count,
        symbols = names.len(),
        "parsed"
    );
    Ok(ParsedFile {
        name: name.to_string(),
        source: source.to_string(),
        file,
        names,
        resolutions,
    })
}

#[cfg(test)]
mod tests {
    use crate::ast::{
        AssignOp, BinaryOp, BranchKind, Expr, ExprNode, IncDecOp, StmtNode, TopDecl, UnaryOp,
    };
    use crate::parse::{parse_tree, unquote_str};
    use loopvet_common::SourceError;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use unindent::unindent;

    /// Parse `body` as the body of a function and return its statements.
    fn stripped_stmts(body: &str) -> Vec<StmtNode> {
        let src = format!("package p\n\nfunc f() {{\n{}\n}}\n", unindent(body));
        let (file, _) = parse_tree(&src).unwrap();
        let Some(TopDecl::Func(func)) = file.decls.into_iter().next() else {
            panic!("expected a function");
        };
        func.body
            .unwrap()
            .stmts
            .into_iter()
            .map(|s| s.node)
            .collect()
    }

    fn name(expr: &Expr) -> &str {
        match &expr.node {
            ExprNode::Ident(ident) => &ident.name,
            other => panic!("expected identifier, got {other:?}"),
        }
    }

    #[test]
    fn test_string_unquote() {
        assert_eq!(unquote_str(r#""foo""#).unwrap(), "foo");
        assert_eq!(unquote_str(r#""foo\"bar""#).unwrap(), r#"foo"bar"#);
        assert_eq!(unquote_str(r#""a\tb\n""#).unwrap(), "a\tb\n");
        assert_eq!(unquote_str(r#""\x41\u00e9\101""#).unwrap(), "AéA");
        assert!(unquote_str(r#""\q""#).is_err());
        assert!(unquote_str(r#""open"#).is_err());
    }

    #[test]
    fn test_bad_escape_is_lex_error() {
        let src = "package p\n\nvar s = \"\\q\"\n";
        let err = parse_tree(src).unwrap_err();
        assert!(matches!(err, SourceError::StringLexError(lc, _) if lc.line == 3));
    }

    #[test]
    fn test_parse_for_clause() {
        let stmts = stripped_stmts(
            r#"
            for i, j := 0, 0; i < j; i++ {
            }
            "#,
        );
        let [StmtNode::For(for_stmt)] = stmts.as_slice() else {
            panic!("expected a single for loop, got {stmts:?}");
        };
        let Some(StmtNode::Assign { lhs, op, rhs }) = for_stmt.init.as_ref().map(|s| &s.node)
        else {
            panic!("expected an init assignment");
        };
        assert_eq!(*op, AssignOp::Define);
        assert_eq!(lhs.iter().map(name).collect::<Vec<_>>(), vec!["i", "j"]);
        assert_eq!(rhs.len(), 2);
        assert!(matches!(
            for_stmt.cond.as_ref().map(|c| &c.node),
            Some(ExprNode::Binary(BinaryOp::Lt, _, _))
        ));
        assert!(matches!(
            for_stmt.post.as_ref().map(|s| &s.node),
            Some(StmtNode::IncDec { op: IncDecOp::Inc, .. })
        ));
    }

    #[test_case("for {}", false, false, false; "infinite")]
    #[test_case("for false {}", false, true, false; "condition only")]
    #[test_case("for ;; {}", false, false, false; "empty clauses")]
    #[test_case("for x := 0; ; {}", true, false, false; "init only")]
    #[test_case("for ; ; p.n++ {}", false, false, true; "post only")]
    #[test_case("for i := 0; i < 10; i += 2 {}", true, true, true; "compound post")]
    fn test_for_forms(src: &str, init: bool, cond: bool, post: bool) {
        let stmts = stripped_stmts(src);
        let [StmtNode::For(for_stmt)] = stmts.as_slice() else {
            panic!("expected a single for loop, got {stmts:?}");
        };
        assert_eq!(
            (
                for_stmt.init.is_some(),
                for_stmt.cond.is_some(),
                for_stmt.post.is_some()
            ),
            (init, cond, post)
        );
    }

    #[test_case("for range xs {}", None, None, true; "no bindings")]
    #[test_case("for k := range m {}", Some("k"), None, true; "key only")]
    #[test_case("for k, v := range m {}", Some("k"), Some("v"), true; "key and value")]
    #[test_case("for _, v := range []int{1, 2} {}", Some("_"), Some("v"), true; "blank key")]
    #[test_case("for k, v = range m {}", Some("k"), Some("v"), false; "assignment form")]
    #[test_case("for i := range 10 {}", Some("i"), None, true; "range over int")]
    fn test_range_forms(src: &str, key: Option<&str>, value: Option<&str>, define: bool) {
        let stmts = stripped_stmts(src);
        let [StmtNode::Range(range)] = stmts.as_slice() else {
            panic!("expected a single range loop, got {stmts:?}");
        };
        assert_eq!(range.key.as_ref().map(name), key);
        assert_eq!(range.value.as_ref().map(name), value);
        if key.is_some() {
            assert_eq!(range.define, define);
        }
    }

    #[test]
    fn test_precedence() {
        let stmts = stripped_stmts("x = a + b * c == d || !e");
        let [StmtNode::Assign { rhs, .. }] = stmts.as_slice() else {
            panic!("expected an assignment");
        };
        let ExprNode::Binary(BinaryOp::LOr, lhs, rhs) = &rhs[0].node else {
            panic!("expected || at the top, got {:?}", rhs[0].node);
        };
        assert!(matches!(&rhs.node, ExprNode::Unary(UnaryOp::Not, _)));
        let ExprNode::Binary(BinaryOp::Eq, sum, _) = &lhs.node else {
            panic!("expected == under ||");
        };
        let ExprNode::Binary(BinaryOp::Add, _, product) = &sum.node else {
            panic!("expected + under ==");
        };
        assert!(matches!(&product.node, ExprNode::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn test_unary_binds_looser_than_selectors() {
        let stmts = stripped_stmts("(*q).n++\n*p.n = 1\n_ = -a[0]");
        let [
            StmtNode::IncDec { target, .. },
            StmtNode::Assign { lhs, .. },
            StmtNode::Assign { rhs, .. },
        ] = stmts.as_slice()
        else {
            panic!("unexpected statements {stmts:?}");
        };
        let ExprNode::Selector { base, .. } = &target.node else {
            panic!("expected a selector");
        };
        assert!(matches!(&base.node, ExprNode::Paren(inner) if matches!(inner.node, ExprNode::Deref(_))));
        let ExprNode::Deref(inner) = &lhs[0].node else {
            panic!("expected a dereference");
        };
        assert!(matches!(inner.node, ExprNode::Selector { .. }));
        let ExprNode::Unary(UnaryOp::Neg, inner) = &rhs[0].node else {
            panic!("expected a negation");
        };
        assert!(matches!(inner.node, ExprNode::Index { .. }));
    }

    #[test]
    fn test_keyword_prefixed_identifiers() {
        let stmts = stripped_stmts(
            r#"
            gopher()
            channel <- 1
            deferred := 1
            returned = 2
            format(ifs, fortune, rangeEnd, variable, types)
            "#,
        );
        assert!(matches!(&stmts[0], StmtNode::Expr(e) if matches!(e.node, ExprNode::Call { .. })));
        assert!(matches!(&stmts[1], StmtNode::Send { channel, .. } if name(channel) == "channel"));
        assert!(matches!(&stmts[2], StmtNode::Assign { op: AssignOp::Define, lhs, .. } if name(&lhs[0]) == "deferred"));
        assert!(matches!(&stmts[3], StmtNode::Assign { op: AssignOp::Assign, lhs, .. } if name(&lhs[0]) == "returned"));
        let StmtNode::Expr(call) = &stmts[4] else {
            panic!("expected a call");
        };
        let ExprNode::Call { args, .. } = &call.node else {
            panic!("expected a call");
        };
        assert_eq!(
            args.iter().map(name).collect::<Vec<_>>(),
            vec!["ifs", "fortune", "rangeEnd", "variable", "types"]
        );
    }

    #[test]
    fn test_header_composite_literals() {
        let stmts = stripped_stmts(
            r#"
            for _, p := range []point{{1, 2}, {x: 3}} {
            }
            if v == (point{}) {
            }
            "#,
        );
        let [StmtNode::Range(range), StmtNode::If(if_stmt)] = stmts.as_slice() else {
            panic!("unexpected statements {stmts:?}");
        };
        let ExprNode::Composite { ty, elements } = &range.source.node else {
            panic!("expected a composite literal");
        };
        assert_eq!(ty.as_ref().map(|t| t.text.as_str()), Some("[]point"));
        assert_eq!(elements.len(), 2);
        assert!(matches!(&if_stmt.cond.node, ExprNode::Binary(BinaryOp::Eq, _, _)));
        assert!(if_stmt.then.stmts.is_empty());
    }

    #[test]
    fn test_branch_labels_stay_on_their_line() {
        let stmts = stripped_stmts(
            r#"
            outer:
            for {
                break
                cleanup()
                continue outer
            }
            "#,
        );
        let [StmtNode::Labeled { label, stmt: Some(stmt) }] = stmts.as_slice() else {
            panic!("expected a labeled loop, got {stmts:?}");
        };
        assert_eq!(label.name, "outer");
        let StmtNode::For(for_stmt) = &stmt.node else {
            panic!("expected a for loop");
        };
        let body: Vec<_> = for_stmt.body.stmts.iter().map(|s| &s.node).collect();
        assert!(matches!(body[0], StmtNode::Branch { kind: BranchKind::Break, label: None }));
        assert!(matches!(body[1], StmtNode::Expr(_)));
        assert!(matches!(
            body[2],
            StmtNode::Branch { kind: BranchKind::Continue, label: Some(l) } if l.name == "outer"
        ));
    }

    #[test]
    fn test_line_breaks_end_statements() {
        let stmts = stripped_stmts(
            r#"
            tmp := *p
            *p = *q
            *q = tmp
            if done {
                return
            }
            return
            cleanup()
            "#,
        );
        assert_eq!(stmts.len(), 6, "{stmts:?}");
        let StmtNode::Assign { rhs, .. } = &stmts[0] else {
            panic!("expected a definition, got {:?}", stmts[0]);
        };
        assert!(matches!(&rhs[0].node, ExprNode::Deref(_)));
        assert!(matches!(
            &stmts[1],
            StmtNode::Assign { op: AssignOp::Assign, lhs, .. }
                if matches!(lhs[0].node, ExprNode::Deref(_))
        ));
        assert!(matches!(&stmts[4], StmtNode::Return(results) if results.is_empty()));
        assert!(matches!(&stmts[5], StmtNode::Expr(_)));
    }

    #[test]
    fn test_spans_skip_inserted_semicolons() {
        let src = "package p

func f() {
	a := 1
	b := a
}
";
        let (file, _) = parse_tree(src).unwrap();
        let Some(TopDecl::Func(func)) = file.decls.first() else {
            panic!("expected a function");
        };
        let body = func.body.as_ref().unwrap();
        let StmtNode::Assign { rhs, .. } = &body.stmts[1].node else {
            panic!("expected a definition");
        };
        assert_eq!(&src[rhs[0].span.start..rhs[0].span.end], "a");
        assert_eq!(&src[body.span.start..body.span.end], "{\n\ta := 1\n\tb := a\n}");
    }

    #[test]
    fn test_generic_declarations() {
        let src = unindent(
            r#"
            package p

            type Number interface {
                ~int | ~float64
            }

            type List[T any] struct {
                items []T
            }

            type Pairs[K comparable, V any] = map[K]V

            func (l *List[T]) Push(v T) {
                l.items = append(l.items, v)
            }

            func Sum[T Number](xs []T) T {
                var total T
                for _, x := range xs {
                    total += x
                }
                return total
            }

            func use() {
                l := List[int]{}
                _ = Sum[int](l.items)
            }
            "#,
        );
        let (file, _) = parse_tree(&src).unwrap();
        assert_eq!(file.decls.len(), 6);
        let TopDecl::Decl(crate::ast::Decl::Type(specs)) = &file.decls[2] else {
            panic!("expected a type declaration");
        };
        assert!(specs[0].alias);
        assert_eq!(specs[0].ty.text, "map[K]V");
        let TopDecl::Func(sum) = &file.decls[4] else {
            panic!("expected a function");
        };
        assert_eq!(sum.name.name, "Sum");
        assert_eq!(sum.signature.params[0].ty.text, "[]T");
    }

    #[test]
    fn test_switches_and_select() {
        let stmts = stripped_stmts(
            r#"
            switch x := f(); v := x.(type) {
            case int, *T:
                use(v)
            default:
            }
            switch {
            case a > b:
                fallthrough
            }
            select {
            case v, ok := <-ch:
                use(v, ok)
            case out <- 1:
            default:
            }
            "#,
        );
        let [StmtNode::TypeSwitch(ts), StmtNode::Switch(sw), StmtNode::Select(clauses)] =
            stmts.as_slice()
        else {
            panic!("unexpected statements {stmts:?}");
        };
        assert!(ts.init.is_some());
        assert_eq!(ts.binding.as_ref().map(|b| b.name.as_str()), Some("v"));
        assert_eq!(name(&ts.subject), "x");
        assert_eq!(ts.clauses.len(), 2);
        assert_eq!(ts.clauses[0].values.as_ref().map(|v| v.len()), Some(2));
        assert!(ts.clauses[1].values.is_none());
        assert!(sw.init.is_none() && sw.tag.is_none());
        assert_eq!(clauses.len(), 3);
        assert!(matches!(
            clauses[0].comm.as_ref().map(|c| &c.node),
            Some(StmtNode::Assign { op: AssignOp::Define, .. })
        ));
        assert!(matches!(
            clauses[1].comm.as_ref().map(|c| &c.node),
            Some(StmtNode::Send { .. })
        ));
        assert!(clauses[2].comm.is_none());
    }

    #[test]
    fn test_closures_and_calls() {
        let stmts = stripped_stmts(
            r#"
            defer func() { recover() }()
            go func(n int) {
                results <- n * 2
            }(i)
            f := func(xs ...int) (total int) { return }
            f(nums...)
            "#,
        );
        let [StmtNode::Defer(d), StmtNode::Go(g), StmtNode::Assign { rhs, .. }, StmtNode::Expr(call)] =
            stmts.as_slice()
        else {
            panic!("unexpected statements {stmts:?}");
        };
        assert!(matches!(&d.node, ExprNode::Call { function, .. } if matches!(function.node, ExprNode::FuncLit(_))));
        let ExprNode::Call { function, args, .. } = &g.node else {
            panic!("expected a call");
        };
        let ExprNode::FuncLit(lit) = &function.node else {
            panic!("expected a function literal");
        };
        assert_eq!(lit.signature.params[0].names[0].name, "n");
        assert_eq!(args.len(), 1);
        let ExprNode::FuncLit(lit) = &rhs[0].node else {
            panic!("expected a function literal");
        };
        assert!(lit.signature.params[0].variadic);
        assert_eq!(lit.signature.results[0].names[0].name, "total");
        assert!(matches!(&call.node, ExprNode::Call { ellipsis: true, .. }));
    }

    #[test]
    fn test_declarations() {
        let src = unindent(
            r#"
            package main

            import (
                "fmt"
                . "math"
                _ "embed"
            )

            type (
                T struct {
                    a, b int
                    sync.Mutex
                }
                Alias = T
            )

            const (
                A = iota
                B
            )

            var global, other = 1, 2

            func (t *T) Method() {}

            func main() {
                var local int
                fmt.Println(local)
            }
            "#,
        );
        let (file, ident_count) = parse_tree(&src).unwrap();
        assert_eq!(file.package.name, "main");
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[0].local_name(), Some("fmt"));
        assert_eq!(file.imports[1].local_name(), None);
        assert_eq!(file.imports[2].local_name(), None);
        assert_eq!(file.decls.len(), 5);
        let TopDecl::Decl(crate::ast::Decl::Type(specs)) = &file.decls[0] else {
            panic!("expected type declarations");
        };
        assert!(!specs[0].alias);
        assert!(specs[1].alias);
        let TopDecl::Func(method) = &file.decls[3] else {
            panic!("expected a method");
        };
        assert!(method.is_method());
        assert!(ident_count > 10);
    }

    #[test_case("package p\n\nfunc f( {\n}\n", 3; "unclosed parameters")]
    #[test_case("package p\n\nfunc f() {\n    x := \n}\n", 5; "missing value")]
    #[test_case("func f() {}\n", 1; "missing package clause")]
    fn test_parse_errors(src: &str, expected_line: usize) {
        let err = parse_tree(src).unwrap_err();
        let SourceError::ParseError { line, details, .. } = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(line, expected_line);
        assert!(details.span.is_some());
    }
}
