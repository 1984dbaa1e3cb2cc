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

#[macro_use]
extern crate pest_derive;

pub mod ast;
mod binder;
pub mod diagnostics;
pub mod names;
pub mod parse;
pub mod semicolons;
mod var_scope;
pub mod visit;

pub use crate::diagnostics::{
    DiagnosticRenderOptions, DiagnosticVerbosity, emit_source_error, format_source_error,
    render_diagnostic,
};
pub use crate::names::{DeclKind, Names};
pub use crate::parse::{ParsedFile, parse_file, parse_tree, unquote_str};
pub use var_scope::VarScope;
