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

use loopvet_frontend::ast::{Block, FuncLit};
use loopvet_frontend::visit::{Visitor, walk_block};

struct ClosureFinder<'a> {
    found: Vec<&'a FuncLit>,
}

impl<'a> Visitor<'a> for ClosureFinder<'a> {
    // Stop at the literal; its own body is scanned as a whole by the capture check.
    fn visit_func_lit(&mut self, func: &'a FuncLit) {
        self.found.push(func);
    }
}

/// The outermost function literals anywhere in a loop body, in document order.
///
/// Literals nested inside another literal are not returned separately: every reference they
/// contain is already inside the enclosing literal's body. Literals inside nested loops are
/// returned, since they are also inside this loop.
pub fn find_closures(body: &Block) -> Vec<&FuncLit> {
    let mut finder = ClosureFinder { found: vec![] };
    walk_block(&mut finder, body);
    finder.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::enumerate_constructs;
    use loopvet_frontend::parse_tree;
    use pretty_assertions::assert_eq;
    use unindent::unindent;

    #[test]
    fn test_outermost_only() {
        let src = unindent(
            r#"
            package p

            func f(xs []int) {
                for i := 0; i < 3; i++ {
                    a := func() {
                        b := func() {}
                        b()
                    }
                    if i > 0 {
                        defer func() {}()
                    }
                    for range xs {
                        go func() {}()
                    }
                    a()
                }
            }
            "#,
        );
        let (file, _) = parse_tree(&src).unwrap();
        let constructs = enumerate_constructs(&file);
        let lines: Vec<_> = find_closures(constructs[0].body())
            .iter()
            .map(|f| f.span.line_col.line)
            .collect();
        assert_eq!(lines, vec![5, 10, 13]);
    }

    #[test]
    fn test_closure_in_call_argument() {
        let src = "package p\nfunc f() {\n\tfor i := range n {\n\t\trun(1, func() { use(i) })\n\t}\n}\n";
        let (file, _) = parse_tree(src).unwrap();
        let constructs = enumerate_constructs(&file);
        assert_eq!(find_closures(constructs[0].body()).len(), 1);
    }

    #[test]
    fn test_no_closures() {
        let src = "package p\nfunc f() {\n\tfor i := 0; i < 3; i++ {\n\t\tuse(i)\n\t}\n}\n";
        let (file, _) = parse_tree(src).unwrap();
        let constructs = enumerate_constructs(&file);
        assert!(find_closures(constructs[0].body()).is_empty());
    }
}
