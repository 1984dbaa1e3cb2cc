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

use crate::bindings::extract;
use crate::capture::check;
use crate::closures::find_closures;
use crate::construct::enumerate_constructs;
use crate::report::Reporter;
use crate::resolver::SymbolResolver;
use loopvet_common::{AnalyzerConfig, Diagnostic};
use loopvet_frontend::ParsedFile;
use loopvet_frontend::ast::File;
use tracing::{debug, trace};

pub const NAME: &str = "loopcapture";

pub const DOC: &str = "check for references to loop variables from within nested functions

A variable declared by a for or range clause is shared by every iteration of the loop.
A function literal that refers to it observes whatever value it holds when the function
runs, which for goroutines and deferred calls is usually the last one. Copy the variable
inside the loop body (v := v) and refer to the copy instead.";

/// Drives the analysis over one compilation unit at a time. Holds no state between units, so
/// a single pass can be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct LoopCapturePass {
    config: AnalyzerConfig,
}

impl LoopCapturePass {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn run(&self, parsed: &ParsedFile) -> Vec<Diagnostic> {
        self.run_with(&parsed.name, &parsed.file, parsed)
    }

    /// Analyze a tree resolved by some other host.
    pub fn run_with(
        &self,
        file_name: &str,
        file: &File,
        resolver: &dyn SymbolResolver,
    ) -> Vec<Diagnostic> {
        if !self.config.includes(file_name) {
            debug!(file = file_name, "skipping test source");
            return vec![];
        }

        let mut reporter = Reporter::new(file_name);
        for construct in enumerate_constructs(file) {
            let loop_scope = extract(&construct, resolver);
            if loop_scope.is_empty() {
                trace!(at = %construct.position(), kind = construct.kind(), "no loop variables");
                continue;
            }
            for closure in find_closures(construct.body()) {
                let issues = check(closure, &loop_scope, resolver);
                for issue in &issues {
                    trace!(name = %issue.name, at = %issue.line_col, "captured loop variable");
                }
                reporter.report(issues);
            }
        }
        debug!(file = file_name, findings = reporter.len(), "analyzed");
        reporter.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::message;
    use crate::resolver::resolver_fn;
    use loopvet_common::SymbolId;
    use loopvet_frontend::ast::Ident;
    use loopvet_frontend::parse_file;
    use pretty_assertions::assert_eq;
    use unindent::unindent;

    fn run_named(name: &str, config: AnalyzerConfig, src: &str) -> Vec<(usize, usize, String)> {
        let parsed = parse_file(name, &unindent(src)).unwrap();
        LoopCapturePass::new(config)
            .run(&parsed)
            .into_iter()
            .map(|d| (d.line, d.column, d.message))
            .collect()
    }

    fn run(src: &str) -> Vec<(usize, usize, String)> {
        run_named("loop.go", AnalyzerConfig::default(), src)
    }

    fn names(src: &str) -> Vec<String> {
        let parsed = parse_file("loop.go", &unindent(src)).unwrap();
        LoopCapturePass::default()
            .run(&parsed)
            .into_iter()
            .map(|d| {
                let start = d.message.find('`').unwrap() + 1;
                let end = start + d.message[start..].find('`').unwrap();
                d.message[start..end].to_string()
            })
            .collect()
    }

    #[test]
    fn test_counting_loop_capture() {
        let found = run(r#"
            package p

            func f() {
                for i := 0; i < 5; i++ {
                    go func() {
                        println(i)
                    }()
                }
            }
            "#);
        assert_eq!(found, vec![(6, 21, message("i"))]);
    }

    #[test]
    fn test_condition_only_loop_is_skipped() {
        let found = run(r#"
            package p

            func f(i int) {
                for false {
                    go func() { println(i) }()
                }
                for i < 10 {
                    defer func() { println(i) }()
                }
            }
            "#);
        assert!(found.is_empty());
    }

    #[test]
    fn test_two_variables_reported_separately() {
        let found = names(
            r#"
            package p

            func f() {
                for i, j := 0, 0; i < j; i++ {
                    go func() {
                        println(i, j)
                    }()
                }
            }
            "#,
        );
        assert_eq!(found, vec!["i", "j"]);
    }

    #[test]
    fn test_range_key_and_value() {
        let found = names(
            r#"
            package p

            func f(m map[string]int) {
                for k, v := range m {
                    go func() {
                        println(k, v)
                    }()
                }
            }
            "#,
        );
        assert_eq!(found, vec!["k", "v"]);
    }

    #[test]
    fn test_range_value_only() {
        let found = names(
            r#"
            package p

            func f(m map[string]int) {
                for _, v := range m {
                    go func() {
                        println(v)
                    }()
                }
            }
            "#,
        );
        assert_eq!(found, vec!["v"]);
    }

    #[test]
    fn test_range_without_bindings() {
        let found = run(r#"
            package p

            func f(xs []int) {
                for range xs {
                }
            }
            "#);
        assert!(found.is_empty());
    }

    #[test]
    fn test_copy_and_direct_use_are_clean() {
        let found = run(r#"
            package p

            func f(xs []int) {
                for i := range xs {
                    i := i
                    go func() {
                        println(i)
                    }()
                }
                for j := range xs {
                    println(j)
                    xs[j] = j
                }
            }
            "#);
        assert!(found.is_empty());
    }

    #[test]
    fn test_nested_loops_report_each_occurrence_once() {
        let found = run(r#"
            package p

            func f(xs [][]int) {
                for i := range xs {
                    for j := range xs[i] {
                        go func() {
                            println(i, j)
                        }()
                    }
                }
            }
            "#);
        assert_eq!(found, vec![(7, 25, message("i")), (7, 28, message("j"))]);
    }

    #[test]
    fn test_outer_variable_advanced_by_inner_post_reported_once() {
        // Both loops scope `i`: the outer through its init, the inner through its post.
        let found = run(r#"
            package p

            func f() {
                for i := 0; i < 10; i++ {
                    for j := 0; j < 3; i++ {
                        go func() {
                            println(i, j)
                        }()
                    }
                }
            }
            "#);
        assert_eq!(found, vec![(7, 25, message("i")), (7, 28, message("j"))]);
    }

    #[test]
    fn test_nested_closure_reported_once() {
        let found = run(r#"
            package p

            func f(xs []int) {
                for _, x := range xs {
                    go func() {
                        defer func() {
                            println(x)
                        }()
                    }()
                }
            }
            "#);
        assert_eq!(found, vec![(7, 25, message("x"))]);
    }

    #[test]
    fn test_loop_inside_closure() {
        let found = run(r#"
            package p

            var handler = func(xs []int) {
                for _, x := range xs {
                    defer func() { println(x) }()
                }
            }
            "#);
        assert_eq!(found, vec![(5, 32, message("x"))]);
    }

    #[test]
    fn test_test_sources_skipped_by_default() {
        let src = r#"
            package p

            func TestLoop(xs []int) {
                for _, x := range xs {
                    go func() { println(x) }()
                }
            }
            "#;
        assert!(run_named("loop_test.go", AnalyzerConfig::default(), src).is_empty());

        let config = AnalyzerConfig {
            include_test_sources: true,
        };
        assert_eq!(run_named("loop_test.go", config, src).len(), 1);
    }

    #[test]
    fn test_assignment_form_range() {
        let found = names(
            r#"
            package p

            func f(m map[string]int) {
                var k string
                var v int
                for k, v = range m {
                    go func() { println(k, v) }()
                }
            }
            "#,
        );
        assert_eq!(found, vec!["k", "v"]);
    }

    #[test]
    fn test_key_of_elided_map_literal_captured() {
        let found = run(r#"
            package p

            func f(keys []string) {
                for _, k := range keys {
                    go func() {
                        _ = []map[string]int{{k: 1}}
                    }()
                }
            }
            "#);
        assert_eq!(found, vec![(6, 35, message("k"))]);
    }

    #[test]
    fn test_statements_split_by_line_breaks() {
        let found = run(r#"
            package p

            func swap(p, q *int, xs []int) {
                tmp := *p
                *p = *q
                *q = tmp
                for i := range xs {
                    go func() { println(i) }()
                }
                if len(xs) == 0 {
                    return
                }
                for _, x := range xs {
                    defer func() { println(x) }()
                }
            }
            "#);
        assert_eq!(found, vec![(8, 29, message("i")), (14, 32, message("x"))]);
    }

    #[test]
    fn test_generic_function_analyzed() {
        let found = names(
            r#"
            package p

            func Each[T any](xs []T, f func(T)) {
                for _, x := range xs {
                    go func() { f(x) }()
                }
            }
            "#,
        );
        assert_eq!(found, vec!["x"]);
    }

    #[test]
    fn test_compound_lvalue_posts() {
        let found = names(
            r#"
            package p

            type counter struct{ n int }

            func f(p *counter, a []int, q *int) {
                for ; p.n < 3; p.n++ {
                    go func() { println(p) }()
                }
                for ; a[0] < 3; a[0]++ {
                    go func() { println(a) }()
                }
                for ; *q < 3; (*q)++ {
                    go func() { println(q) }()
                }
            }
            "#,
        );
        assert_eq!(found, vec!["p", "a", "q"]);
    }

    #[test]
    fn test_custom_resolver_drops_unresolved_targets() {
        let src = unindent(
            r#"
            package p

            func f() {
                for i, j := 0, 0; i < j; i++ {
                    go func() { println(i, j) }()
                }
            }
            "#,
        );
        let parsed = parse_file("loop.go", &src).unwrap();
        // Hide every `j` occurrence from the pass.
        let resolver = resolver_fn(|ident: &Ident| -> Option<SymbolId> {
            if ident.name == "j" {
                None
            } else {
                parsed.symbol_of(ident)
            }
        });
        let found = LoopCapturePass::default().run_with("loop.go", &parsed.file, &resolver);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, message("i"));
    }

    #[test]
    fn test_diagnostics_carry_file_and_span() {
        let src = "package p\nfunc f(xs []int) {\n\tfor i := range xs {\n\t\tgo func() { _ = i }()\n\t}\n}\n";
        let parsed = parse_file("dir/loop.go", src).unwrap();
        let found = LoopCapturePass::default().run(&parsed);
        assert_eq!(found.len(), 1);
        let (start, end) = found[0].span.unwrap();
        assert_eq!(&src[start..end], "i");
        assert_eq!(
            found[0].to_string(),
            format!("dir/loop.go:4:19: {}", message("i"))
        );
    }
}
