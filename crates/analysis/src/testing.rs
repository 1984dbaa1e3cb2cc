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

//! Fixture harness. A fixture is an ordinary Go file in which every line that should draw a
//! diagnostic carries a trailing comment of the form
//!
//! ```text
//! fmt.Println(i, j) // want "variable `i`" "variable `j`"
//! ```
//!
//! Each quoted string (interpreted `"..."` or raw `` `...` ``) is a regular expression that must
//! match the message of exactly one diagnostic reported on that line. Diagnostics that match no
//! expectation, and expectations that match no diagnostic, are both mismatches.

use crate::pass::LoopCapturePass;
use itertools::Itertools;
use loopvet_common::{Diagnostic, LineCol, SourceError};
use loopvet_frontend::{parse_file, unquote_str};
use regex::Regex;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::debug;

const WANT_MARKER: &str = "// want";

#[derive(Clone, Debug)]
pub struct Expectation {
    pub line: usize,
    pub pattern: Regex,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FixtureMismatch {
    Unexpected(Diagnostic),
    Missing {
        file: String,
        line: usize,
        pattern: String,
    },
}

impl Display for FixtureMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureMismatch::Unexpected(diagnostic) => {
                write!(f, "unexpected diagnostic: {diagnostic}")
            }
            FixtureMismatch::Missing {
                file,
                line,
                pattern,
            } => write!(f, "{file}:{line}: no diagnostic was found matching {pattern:?}"),
        }
    }
}

/// Collect the expectations of every `// want` comment in the source.
pub fn parse_expectations(source: &str) -> Result<Vec<Expectation>, SourceError> {
    let mut expectations = vec![];
    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let Some(marker) = text.find(WANT_MARKER) else {
            continue;
        };
        let rest_start = marker + WANT_MARKER.len();
        let rest = &text[rest_start..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let column = text[..rest_start].chars().count() + 1;
        for pattern in lex_patterns(rest, LineCol::new(line, column))? {
            let pattern = Regex::new(&pattern).map_err(|e| {
                SourceError::StringLexError(
                    LineCol::new(line, column),
                    format!("invalid pattern {pattern:?}: {e}"),
                )
            })?;
            expectations.push(Expectation { line, pattern });
        }
    }
    Ok(expectations)
}

/// Split the text after a want marker into its quoted strings, unquoted.
fn lex_patterns(text: &str, at: LineCol) -> Result<Vec<String>, SourceError> {
    let lex_error = |message: &str| SourceError::StringLexError(at, message.to_string());

    let mut patterns = vec![];
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let (literal, remainder) = match rest.chars().next() {
            Some('`') => {
                let end = rest[1..]
                    .find('`')
                    .ok_or_else(|| lex_error("unterminated raw string"))?;
                patterns.push(rest[1..=end].to_string());
                (None, &rest[end + 2..])
            }
            Some('"') => {
                let end = closing_quote(rest).ok_or_else(|| lex_error("unterminated string"))?;
                (Some(&rest[..=end]), &rest[end + 1..])
            }
            _ => return Err(lex_error("expected a quoted pattern")),
        };
        if let Some(literal) = literal {
            patterns.push(unquote_str(literal).map_err(|e| lex_error(&e))?);
        }
        rest = remainder.trim_start();
    }
    if patterns.is_empty() {
        return Err(lex_error("expected at least one pattern"));
    }
    Ok(patterns)
}

/// Byte offset of the quote that closes the interpreted string starting at `text[0]`.
fn closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (offset, c) in text.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(offset),
            _ => {}
        }
    }
    None
}

/// Pair each diagnostic with an expectation on the same line whose pattern matches it.
pub fn match_expectations(
    file: &str,
    expectations: &[Expectation],
    diagnostics: Vec<Diagnostic>,
) -> Vec<FixtureMismatch> {
    let mut satisfied = vec![false; expectations.len()];
    let mut mismatches = vec![];
    for diagnostic in diagnostics {
        let found = expectations.iter().enumerate().position(|(i, e)| {
            !satisfied[i] && e.line == diagnostic.line && e.pattern.is_match(&diagnostic.message)
        });
        match found {
            Some(i) => satisfied[i] = true,
            None => mismatches.push(FixtureMismatch::Unexpected(diagnostic)),
        }
    }
    mismatches.extend(
        expectations
            .iter()
            .zip(satisfied)
            .filter(|(_, satisfied)| !satisfied)
            .map(|(e, _)| FixtureMismatch::Missing {
                file: file.to_string(),
                line: e.line,
                pattern: e.pattern.as_str().to_string(),
            }),
    );
    mismatches
}

/// Run the pass over one fixture held in memory.
pub fn check_fixture(
    pass: &LoopCapturePass,
    name: &str,
    source: &str,
) -> Result<Vec<FixtureMismatch>, SourceError> {
    let expectations = parse_expectations(source)?;
    let parsed = parse_file(name, source)?;
    let diagnostics = pass.run(&parsed);
    debug!(
        fixture = name,
        expectations = expectations.len(),
        diagnostics = diagnostics.len(),
        "checked fixture"
    );
    Ok(match_expectations(name, &expectations, diagnostics))
}

pub fn run_fixture_file(
    pass: &LoopCapturePass,
    path: &Path,
) -> Result<Vec<FixtureMismatch>, SourceError> {
    let name = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: name.clone(),
        message: e.to_string(),
    })?;
    check_fixture(pass, &name, &source)
}

/// Run every `.go` fixture below `dir`, in path order.
pub fn run_fixture_dir(
    pass: &LoopCapturePass,
    dir: &Path,
) -> Result<Vec<(PathBuf, Vec<FixtureMismatch>)>, SourceError> {
    let io_error = |message: String| SourceError::Io {
        path: dir.display().to_string(),
        message,
    };
    let pattern = dir.join("**").join("*.go");
    let paths = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| io_error(e.to_string()))?
        .map(|entry| entry.map_err(|e| io_error(e.to_string())))
        .collect::<Result<Vec<PathBuf>, _>>()?;
    paths
        .into_iter()
        .sorted()
        .map(|path| {
            let mismatches = run_fixture_file(pass, &path)?;
            Ok((path, mismatches))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopvet_common::AnalyzerConfig;
    use pretty_assertions::assert_eq;
    use unindent::unindent;

    fn patterns(source: &str) -> Vec<(usize, String)> {
        parse_expectations(source)
            .unwrap()
            .into_iter()
            .map(|e| (e.line, e.pattern.as_str().to_string()))
            .collect()
    }

    #[test]
    fn test_parse_want_comments() {
        let source = "package p\nx := 1 // want \"a\" `b\\d` \"c\\\"d\"\n// wanted\ny := 2 // want \"e\"\n";
        assert_eq!(
            patterns(source),
            vec![
                (2, "a".to_string()),
                (2, "b\\d".to_string()),
                (2, "c\"d".to_string()),
                (4, "e".to_string())
            ]
        );
    }

    #[test]
    fn test_malformed_want_comments() {
        for bad in [
            "x // want",
            "x // want \"open",
            "x // want `open",
            "x // want bare",
            "x // want \"(\"",
        ] {
            let err = parse_expectations(bad).unwrap_err();
            assert!(
                matches!(err, SourceError::StringLexError(lc, _) if lc.line == 1),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn test_fixture_matching() {
        let source = unindent(
            r#"
            package p

            func f() {
                for i := 0; i < 5; i++ {
                    defer func() {
                        println(i) // want "loop variable `i`"
                    }()
                }
                for j := 0; j < 5; j++ {
                    defer func() {
                        println(j)
                    }()
                }
                for k := 0; k < 5; k++ {
                    println(k) // want "loop variable `k`"
                }
            }
            "#,
        );
        let mismatches = check_fixture(&LoopCapturePass::default(), "f.go", &source).unwrap();
        let rendered: Vec<_> = mismatches.iter().map(|m| m.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                format!(
                    "unexpected diagnostic: f.go:11:21: {}",
                    crate::report::message("j")
                ),
                "f.go:15: no diagnostic was found matching \"loop variable `k`\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_one_diagnostic_per_expectation() {
        let source = "package p\nfunc f() {\n\tfor i := 0; i < 1; i++ {\n\t\tgo func() { println(i) }() // want \"`i`\" \"`i`\"\n\t}\n}\n";
        let mismatches = check_fixture(
            &LoopCapturePass::new(AnalyzerConfig::default()),
            "f.go",
            source,
        )
        .unwrap();
        assert_eq!(
            mismatches,
            vec![FixtureMismatch::Missing {
                file: "f.go".to_string(),
                line: 4,
                pattern: "`i`".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = run_fixture_file(
            &LoopCapturePass::default(),
            Path::new("/nonexistent/fixture.go"),
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
