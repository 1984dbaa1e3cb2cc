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

use crate::bindings::LoopScopeSet;
use crate::resolver::SymbolResolver;
use loopvet_common::{LineCol, Span};
use loopvet_frontend::ast::{FuncLit, Ident};
use loopvet_frontend::visit::{Visitor, walk_block};

/// One reference, inside a closure, to a variable shared across the iterations of an
/// enclosing loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub name: String,
    pub line_col: LineCol,
    pub span: Span,
}

struct CaptureCheck<'r, R: ?Sized> {
    loop_scope: &'r LoopScopeSet,
    resolver: &'r R,
    issues: Vec<Issue>,
}

impl<'a, R> Visitor<'a> for CaptureCheck<'_, R>
where
    R: SymbolResolver + ?Sized,
{
    fn visit_ident(&mut self, ident: &'a Ident) {
        if ident.is_blank() {
            return;
        }
        let Some(symbol) = self.resolver.resolve(ident) else {
            return;
        };
        if self.loop_scope.contains(symbol) {
            self.issues.push(Issue {
                name: ident.name.clone(),
                line_col: ident.line_col(),
                span: ident.span,
            });
        }
    }
}

/// Every identifier occurrence in the closure's body that denotes a loop-scoped variable, in
/// document order. Nested closures and loops inside the body are searched too. A parameter or
/// local of the closure that merely shares a name resolves to a different variable and is not
/// reported.
pub fn check<R>(closure: &FuncLit, loop_scope: &LoopScopeSet, resolver: &R) -> Vec<Issue>
where
    R: SymbolResolver + ?Sized,
{
    if loop_scope.is_empty() {
        return vec![];
    }
    let mut check = CaptureCheck {
        loop_scope,
        resolver,
        issues: vec![],
    };
    walk_block(&mut check, &closure.body);
    check.issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::extract;
    use crate::closures::find_closures;
    use crate::construct::enumerate_constructs;
    use loopvet_frontend::parse_file;
    use pretty_assertions::assert_eq;
    use unindent::unindent;

    fn issues_of_first_loop(src: &str) -> Vec<(String, usize, usize)> {
        let parsed = parse_file("t.go", &unindent(src)).unwrap();
        let constructs = enumerate_constructs(&parsed.file);
        let scope = extract(&constructs[0], &parsed);
        find_closures(constructs[0].body())
            .into_iter()
            .flat_map(|closure| check(closure, &scope, &parsed))
            .map(|i| (i.name, i.line_col.line, i.line_col.column))
            .collect()
    }

    #[test]
    fn test_every_occurrence_reported() {
        let issues = issues_of_first_loop(
            r#"
            package p

            func f(xs []int) {
                for i, x := range xs {
                    go func() {
                        println(i, x, i)
                    }()
                }
            }
            "#,
        );
        assert_eq!(
            issues,
            vec![
                ("i".to_string(), 6, 21),
                ("x".to_string(), 6, 24),
                ("i".to_string(), 6, 27)
            ]
        );
    }

    #[test]
    fn test_shadowing_parameter_is_clean() {
        let issues = issues_of_first_loop(
            r#"
            package p

            func f(xs []int) {
                for i := range xs {
                    go func(i int) {
                        println(i)
                    }(i)
                }
            }
            "#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_shadowing_local_copy_is_clean() {
        let issues = issues_of_first_loop(
            r#"
            package p

            func f(xs []int) {
                for i := range xs {
                    i := i
                    go func() {
                        println(i)
                    }()
                }
            }
            "#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_nested_closure_and_field_names() {
        let issues = issues_of_first_loop(
            r#"
            package p

            type T struct{ v int }

            func f(ts []T) {
                for _, v := range ts {
                    run(func() {
                        w := T{v: 1}
                        run(func() {
                            println(w.v, v.v)
                        })
                    })
                }
            }
            "#,
        );
        // The struct key and both selectors name fields, not the variable.
        assert_eq!(issues, vec![("v".to_string(), 10, 30)]);
    }
}
