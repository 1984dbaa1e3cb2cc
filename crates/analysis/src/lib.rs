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

//! Detection of function literals that capture variables shared by all iterations of an
//! enclosing loop.
//!
//! For every loop in a unit, the variables its header establishes are collected, the outermost
//! function literals in its body are found, and every identifier inside those literals that
//! resolves to one of the variables is reported.

pub mod bindings;
pub mod capture;
pub mod closures;
pub mod construct;
pub mod pass;
pub mod report;
pub mod resolver;
pub mod testing;

pub use crate::bindings::{LoopScopeSet, extract, root_ident};
pub use crate::capture::{Issue, check};
pub use crate::closures::find_closures;
pub use crate::construct::{IterationConstruct, enumerate_constructs};
pub use crate::pass::LoopCapturePass;
pub use crate::report::{Reporter, message};
pub use crate::resolver::{FnResolver, SymbolResolver, resolver_fn};
