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

/// The abstract syntax tree produced by the parser and consumed by the binder and the analysis.
use loopvet_common::{LineCol, Span};
use std::fmt::Display;

/// Unique (per file) identity of one identifier occurrence in the tree. Dense, starting at zero,
/// in the order the parser meets them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentId(pub u32);

impl IdentId {
    pub fn offset(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Ident {
    pub id: IdentId,
    pub name: String,
    pub span: Span,
}

impl Ident {
    /// The blank identifier `_`, which never denotes anything.
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    pub fn line_col(&self) -> LineCol {
        self.span.line_col
    }
}

/// A type is kept as its source text. Nothing inside a type is a variable reference the
/// analysis cares about.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TypeExpr {
    pub text: String,
    pub span: Span,
}

impl TypeExpr {
    /// Whether a composite literal of this type is keyed by values rather than field names.
    pub fn is_keyed_by_value(&self) -> bool {
        is_keyed_by_value(&self.text)
    }
}

/// Whether a composite literal of the type spelled `ty` is keyed by values (slices, arrays and
/// maps) rather than by field names.
pub fn is_keyed_by_value(ty: &str) -> bool {
    let ty = ty.trim_start();
    ty.starts_with('[') || map_brackets(ty).is_some()
}

/// For a slice, array or map type: the key type (maps only) and the element type. These are the
/// types elided inner literals take, as in `[]map[string]int{{k: 1}}`.
pub fn element_types(ty: &str) -> Option<(Option<&str>, &str)> {
    let ty = ty.trim();
    let (key, rest) = if ty.starts_with('[') {
        let close = matching_bracket(ty)?;
        (None, &ty[close + 1..])
    } else {
        let rest = map_brackets(ty)?;
        let close = matching_bracket(rest)?;
        (Some(rest[1..close].trim()), &rest[close + 1..])
    };
    // `[]*T{{...}}` elides `&T`.
    let element = rest.trim_start().trim_start_matches('*').trim_start();
    Some((key, element))
}

/// The text from the `[` of a map type onward.
fn map_brackets(ty: &str) -> Option<&str> {
    let rest = ty.strip_prefix("map")?.trim_start();
    rest.starts_with('[').then_some(rest)
}

/// Byte offset of the `]` closing the `[` that starts `text`.
fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<TopDecl>,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ImportSpec {
    /// Explicit alias, if any. `_` for blank imports.
    pub alias: Option<Ident>,
    /// `import . "path"`
    pub dot: bool,
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// The name the import is known by inside the file, if it introduces one.
    pub fn local_name(&self) -> Option<&str> {
        if self.dot {
            return None;
        }
        match &self.alias {
            Some(alias) if alias.is_blank() => None,
            Some(alias) => Some(alias.name.as_str()),
            None => self.path.rsplit('/').next().filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum TopDecl {
    Func(FuncDecl),
    Decl(Decl),
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct FuncDecl {
    pub receiver: Vec<Param>,
    pub name: Ident,
    pub signature: Signature,
    pub body: Option<Block>,
    pub span: Span,
}

impl FuncDecl {
    pub fn is_method(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

/// One parameter group, `a, b int` or an unnamed `int`.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Param {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub variadic: bool,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Decl {
    Var(Vec<ValueSpec>),
    Const(Vec<ValueSpec>),
    Type(Vec<TypeSpec>),
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    pub alias: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct FuncLit {
    pub signature: Signature,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Stmt {
    pub node: StmtNode,
    pub span: Span,
}

impl Stmt {
    pub fn new(node: StmtNode, span: Span) -> Self {
        Stmt { node, span }
    }

    pub fn line_col(&self) -> LineCol {
        self.span.line_col
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum StmtNode {
    Decl(Decl),
    Labeled {
        label: Ident,
        stmt: Option<Box<Stmt>>,
    },
    Expr(Expr),
    Send {
        channel: Expr,
        value: Expr,
    },
    IncDec {
        target: Expr,
        op: IncDecOp,
    },
    /// Plain, compound and defining (`:=`) assignment.
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    Go(Expr),
    Defer(Expr),
    Return(Vec<Expr>),
    Branch {
        kind: BranchKind,
        label: Option<Ident>,
    },
    Block(Block),
    If(IfStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Select(Vec<CommClause>),
    /// The counting loop, including its condition-only and infinite forms.
    For(ForStmt),
    /// The iterator loop.
    Range(RangeStmt),
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either another `If` or a `Block`.
    pub otherwise: Option<Box<Stmt>>,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct SwitchStmt {
    pub init: Option<Box<Stmt>>,
    pub tag: Option<Expr>,
    pub clauses: Vec<CaseClause>,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TypeSwitchStmt {
    pub init: Option<Box<Stmt>>,
    /// `v` in `switch v := x.(type)`.
    pub binding: Option<Ident>,
    pub subject: Expr,
    pub clauses: Vec<CaseClause>,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct CaseClause {
    /// `None` for `default`.
    pub values: Option<Vec<Expr>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct CommClause {
    /// `None` for `default`.
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    /// `:=` (true) or `=` (false). Meaningless when there is no key.
    pub define: bool,
    pub source: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Expr {
    pub node: ExprNode,
    pub span: Span,
}

impl Expr {
    pub fn new(node: ExprNode, span: Span) -> Self {
        Expr { node, span }
    }

    pub fn line_col(&self) -> LineCol {
        self.span.line_col
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.node {
            ExprNode::Ident(ident) => Some(ident),
            _ => None,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum ExprNode {
    Ident(Ident),
    Literal(Literal),
    FuncLit(FuncLit),
    /// `T{...}`; nested literals with an elided type have `ty: None`.
    Composite {
        ty: Option<TypeExpr>,
        elements: Vec<Element>,
    },
    Paren(Box<Expr>),
    Selector {
        base: Box<Expr>,
        field: Ident,
    },
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    Slice {
        base: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    TypeAssert {
        base: Box<Expr>,
        ty: TypeExpr,
    },
    Call {
        function: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
    },
    Unary(UnaryOp, Box<Expr>),
    /// `*x`, which in operand position is also a pointer type.
    Deref(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// A type in operand position, e.g. the argument to `make`, or a conversion's callee.
    Type(TypeExpr),
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Source text, including quotes for strings and runes.
    pub raw: String,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum LiteralKind {
    Int,
    Float,
    Imaginary,
    Rune,
    String,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum BinaryOp {
    LOr,
    LAnd,
    Eq,
    NEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Add,
    Sub,
    BitOr,
    BitXor,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitAndNot,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LOr => write!(f, "||"),
            Self::LAnd => write!(f, "&&"),
            Self::Eq => write!(f, "=="),
            Self::NEq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::LtE => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtE => write!(f, ">="),
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::BitOr => write!(f, "|"),
            Self::BitXor => write!(f, "^"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Mod => write!(f, "%"),
            Self::Shl => write!(f, "<<"),
            Self::Shr => write!(f, ">>"),
            Self::BitAnd => write!(f, "&"),
            Self::BitAndNot => write!(f, "&^"),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
    Addr,
    Recv,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Neg => write!(f, "-"),
            Self::Pos => write!(f, "+"),
            Self::Not => write!(f, "!"),
            Self::BitNot => write!(f, "^"),
            Self::Addr => write!(f, "&"),
            Self::Recv => write!(f, "<-"),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum AssignOp {
    /// `:=`
    Define,
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    BitAndNot,
}

impl AssignOp {
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            ":=" => Self::Define,
            "=" => Self::Assign,
            "+=" => Self::Add,
            "-=" => Self::Sub,
            "*=" => Self::Mul,
            "/=" => Self::Div,
            "%=" => Self::Mod,
            "&=" => Self::BitAnd,
            "|=" => Self::BitOr,
            "^=" => Self::BitXor,
            "<<=" => Self::Shl,
            ">>=" => Self::Shr,
            "&^=" => Self::BitAndNot,
            _ => return None,
        };
        Some(op)
    }

    /// `x op= y`, as opposed to plain or defining assignment.
    pub fn is_compound(&self) -> bool {
        !matches!(self, Self::Define | Self::Assign)
    }
}

impl Display for AssignOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Define => write!(f, ":="),
            Self::Assign => write!(f, "="),
            Self::Add => write!(f, "+="),
            Self::Sub => write!(f, "-="),
            Self::Mul => write!(f, "*="),
            Self::Div => write!(f, "/="),
            Self::Mod => write!(f, "%="),
            Self::BitAnd => write!(f, "&="),
            Self::BitOr => write!(f, "|="),
            Self::BitXor => write!(f, "^="),
            Self::Shl => write!(f, "<<="),
            Self::Shr => write!(f, ">>="),
            Self::BitAndNot => write!(f, "&^="),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum IncDecOp {
    Inc,
    Dec,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}
