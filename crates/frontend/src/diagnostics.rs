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

//! Helpers to transform Pest parser errors and analysis findings into user-facing diagnostics.

use std::{
    borrow::Cow,
    cmp::min,
    io::{self, Write},
    ops::Range,
};

use ariadne::{CharSet, Config, IndexType, Label, Report, ReportKind, Source};
use itertools::Itertools;
use pest::error::{Error, ErrorVariant, InputLocation};

use crate::parse::go::Rule;
use loopvet_common::{Diagnostic, LineCol, ParseErrorDetails, SourceError};

/// Verbosity levels for rendering diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticVerbosity {
    /// Single-line summary only.
    Summary,
    /// Summary with source context showing error location.
    SourceContext,
    /// Source context plus textual notes (expected tokens, hints).
    Detailed,
}

/// Rendering options for source diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticRenderOptions {
    pub verbosity: DiagnosticVerbosity,
    pub use_graphics: bool,
    pub use_color: bool,
}

impl Default for DiagnosticRenderOptions {
    fn default() -> Self {
        Self {
            verbosity: DiagnosticVerbosity::Summary,
            use_graphics: false,
            use_color: false,
        }
    }
}

fn report_config(use_color: bool) -> Config {
    Config::default()
        .with_color(use_color)
        .with_char_set(CharSet::Unicode)
        .with_index_type(IndexType::Byte)
}

/// Emit a source error directly to stderr with rich formatting.
///
/// Parse errors with a known span are rendered by Ariadne with the offending line in context,
/// followed by the expected tokens and hints. Anything else is printed as a single line.
pub fn emit_source_error(
    error: &SourceError,
    source: Option<&str>,
    source_name: &str,
    use_color: bool,
) {
    let SourceError::ParseError {
        message, details, ..
    } = error
    else {
        eprintln!("{source_name}: {error}");
        return;
    };

    let (Some(src), Some((start, end))) = (source, details.span) else {
        eprintln!("{source_name}: parse error: {message}");
        return;
    };

    let report = Report::build(ReportKind::Error, (source_name, start..end))
        .with_config(report_config(use_color))
        .with_message(message)
        .with_label(Label::new((source_name, start..end)).with_message("parser stopped here"))
        .finish();

    let mut stderr = io::stderr().lock();
    let _ = report.write((source_name, Source::from(src)), &mut stderr);

    let mut help = vec![];
    append_expected_tokens(&mut help, details);
    append_notes(&mut help, &details.notes);
    if !help.is_empty() {
        let _ = writeln!(&mut stderr);
        for line in help {
            let _ = writeln!(&mut stderr, "{line}");
        }
    }
    let _ = stderr.flush();
}

/// Format a [`SourceError`] according to the requested diagnostic options.
///
/// For errors other than parse errors this is the standard string form. For parse errors the
/// caller should pass the original source text so detailed renderings can display accurate spans.
pub fn format_source_error(
    error: &SourceError,
    source: Option<&str>,
    options: DiagnosticRenderOptions,
) -> Vec<String> {
    match error {
        SourceError::ParseError {
            line,
            column,
            context,
            message,
            details,
            ..
        } => format_parse_error(
            LineCol::new(*line, *column),
            context,
            message,
            details,
            source,
            options,
        ),
        _ => vec![error.to_string()],
    }
}

/// Render an analysis finding with its source line, the way the pretty output format shows it.
/// Falls back to the one-line `file:line:col: message` form when the finding has no span.
pub fn render_diagnostic(diagnostic: &Diagnostic, source: &str, use_color: bool) -> String {
    let Some((start, end)) = diagnostic.span else {
        return diagnostic.to_string();
    };
    let start = min(start, source.len());
    let end = min(end, source.len()).max(start);
    let name = diagnostic.file.as_str();
    let report = Report::build(ReportKind::Warning, (name, start..end))
        .with_config(report_config(use_color))
        .with_message(&diagnostic.message)
        .with_label(Label::new((name, start..end)).with_message("captured here"))
        .finish();
    report.write_to_string((name, Source::from(source)))
}

/// Produce a human-friendly summary string plus structured diagnostic details for a Pest error.
pub fn build_parse_error_details(
    program_text: &str,
    error: &Error<Rule>,
) -> (String, ParseErrorDetails) {
    let summary = summarize_error(error);
    let expected_tokens = extract_expected_tokens(error);
    let notes = collect_notes(program_text, error);

    let span_range = compute_span(program_text, error);
    let details = ParseErrorDetails {
        span: Some((span_range.start, span_range.end)),
        expected_tokens,
        notes,
    };

    (summary, details)
}

fn format_parse_error(
    position: LineCol,
    context_line: &str,
    summary: &str,
    details: &ParseErrorDetails,
    source: Option<&str>,
    options: DiagnosticRenderOptions,
) -> Vec<String> {
    let mut lines = vec![format!(
        "Failure to parse program @ {}/{}: {}",
        position.line, position.column, summary
    )];

    if options.verbosity == DiagnosticVerbosity::Summary {
        return lines;
    }

    match (options.use_graphics, source, details.span) {
        (true, Some(src), Some((start, end))) => {
            let report = render_report(src, summary, start..end, options.use_color);
            lines.extend(report.lines().map(|line| line.to_string()));
        }
        _ => lines.extend(render_plain_context(position, context_line)),
    }

    if options.verbosity == DiagnosticVerbosity::Detailed {
        append_expected_tokens(&mut lines, details);
        append_notes(&mut lines, &details.notes);
    }

    lines
}

fn summarize_error(error: &Error<Rule>) -> String {
    let ErrorVariant::ParsingError {
        positives,
        negatives,
    } = &error.variant
    else {
        return error.variant.message().to_string();
    };

    let positive_descs: Vec<_> = positives.iter().map(describe_rule).collect();
    let negative_descs: Vec<_> = negatives.iter().map(describe_rule).collect();
    let expected = dedupe_descriptions(&positive_descs);
    let unexpected = dedupe_descriptions(&negative_descs);

    let expected_str =
        (!expected.is_empty()).then(|| format_list(expected.iter().map(|d| d.label.as_ref())));
    let unexpected_str =
        (!unexpected.is_empty()).then(|| format_list(unexpected.iter().map(|d| d.label.as_ref())));

    match (expected_str, unexpected_str) {
        (Some(exp), Some(unexp)) => format!("unexpected {unexp}; expected {exp}"),
        (Some(exp), None) => format!("expected {exp}"),
        (None, Some(unexp)) => format!("unexpected {unexp}"),
        (None, None) => "unexpected parser failure".to_string(),
    }
}

fn extract_expected_tokens(error: &Error<Rule>) -> Vec<String> {
    let tokens = error
        .parse_attempts()
        .map(|parse_attempts| {
            parse_attempts
                .expected_tokens()
                .into_iter()
                .map(|token| token.to_string())
                // Whitespace tokens are never what the user is missing.
                .filter(|token| !token.trim().is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    tokens.into_iter().unique().collect()
}

fn collect_notes(program_text: &str, error: &Error<Rule>) -> Vec<String> {
    let mut notes: Vec<String> = error
        .variant
        .positives()
        .iter()
        .flat_map(|rule| describe_rule(rule).hint)
        .map(|hint| hint.to_string())
        .collect();

    if let InputLocation::Pos(pos) = error.location
        && pos >= program_text.len()
    {
        notes.push("file ends here; is a closing brace missing?".to_string());
    }

    notes.into_iter().unique().collect()
}

fn append_expected_tokens(lines: &mut Vec<String>, details: &ParseErrorDetails) {
    let quoted = details
        .expected_tokens
        .iter()
        .map(|token| format!("`{token}`"))
        .collect_vec();
    match quoted.as_slice() {
        [] => {}
        [only] => lines.push(format!("help: expected token {only}")),
        _ => lines.push(format!(
            "help: expected one of {}",
            format_list(quoted.iter().map(|s| s.as_str()))
        )),
    }
}

fn append_notes(lines: &mut Vec<String>, notes: &[String]) {
    lines.extend(notes.iter().map(|note| format!("help: {note}")));
}

fn compute_span(program_text: &str, error: &Error<Rule>) -> Range<usize> {
    match error.location {
        InputLocation::Pos(pos) => {
            let start = min(pos, program_text.len());
            let end = min(program_text.len(), start.saturating_add(1));
            start..end
        }
        InputLocation::Span((start, end)) => {
            let clamped_start = min(start, program_text.len());
            let clamped_end = min(end, program_text.len()).max(clamped_start);
            clamped_start..clamped_end
        }
    }
}

fn render_plain_context(position: LineCol, context_line: &str) -> Vec<String> {
    let trimmed = context_line.trim_end_matches(['\r', '\n']);
    let marker = " ⚠ ";

    // Columns count characters; find the byte offset to split at.
    let split = trimmed
        .char_indices()
        .nth(position.column.saturating_sub(1))
        .map(|(offset, _)| offset)
        .unwrap_or(trimmed.len());
    let marked_line = format!("{}{}{}", &trimmed[..split], marker, &trimmed[split..]);

    vec![
        format!("   line {} column {}:", position.line, position.column),
        format!("   {marked_line}"),
    ]
}

fn render_report(program_text: &str, summary: &str, span: Range<usize>, use_color: bool) -> String {
    let report = Report::build(ReportKind::Error, span.clone())
        .with_config(report_config(use_color))
        .with_message(summary)
        .with_label(Label::new(span).with_message("parser stopped here"))
        .finish();
    report.write_to_string(Source::from(program_text))
}

fn dedupe_descriptions(descriptions: &[RuleDescriptor]) -> Vec<RuleDescriptor> {
    descriptions
        .iter()
        .unique_by(|desc| desc.group.clone())
        .cloned()
        .collect()
}

fn describe_rule(rule: &Rule) -> RuleDescriptor {
    use Rule::*;

    match rule {
        lor | land | eq | neq | lt | lte | gt | gte | add | sub | bitor | bitxor | mul | div
        | modulus | shl | shr | bitand | bitand_not => RuleDescriptor {
            label: Cow::Borrowed("an operator"),
            hint: Some(Cow::Borrowed(
                "Binary operators are +, -, *, /, %, &, |, ^, &^, <<, >>, &&, ||, ==, !=, <, <=, >, >=.",
            )),
            group: Cow::Borrowed("binary_operator"),
        },
        assign_op | assign | define => RuleDescriptor {
            label: Cow::Borrowed("an assignment"),
            hint: Some(Cow::Borrowed(
                "Declare with `name := expr` or assign with `name = expr`.",
            )),
            group: Cow::Borrowed("assignment"),
        },
        inc | dec => RuleDescriptor {
            label: Cow::Borrowed("`++` or `--`"),
            hint: None,
            group: Cow::Borrowed("inc_dec"),
        },
        selector => RuleDescriptor {
            label: Cow::Borrowed("a selector like .name"),
            hint: None,
            group: Cow::Borrowed("selector"),
        },
        index_expr | slice_expr => RuleDescriptor {
            label: Cow::Borrowed("an index like [i]"),
            hint: None,
            group: Cow::Borrowed("index"),
        },
        call | call_args | call_arg => RuleDescriptor {
            label: Cow::Borrowed("an argument list `(…)`"),
            hint: Some(Cow::Borrowed(
                "Function calls require parentheses around arguments.",
            )),
            group: Cow::Borrowed("argument_list"),
        },
        type_assert => RuleDescriptor {
            label: Cow::Borrowed("a type assertion like .(T)"),
            hint: None,
            group: Cow::Borrowed("type_assert"),
        },
        integer | float | imaginary => RuleDescriptor {
            label: Cow::Borrowed("a numeric literal"),
            hint: None,
            group: Cow::Borrowed("number"),
        },
        rune => RuleDescriptor {
            label: Cow::Borrowed("a rune literal"),
            hint: None,
            group: Cow::Borrowed("rune_literal"),
        },
        string | raw_string => RuleDescriptor {
            label: Cow::Borrowed("a string literal"),
            hint: Some(Cow::Borrowed(
                "Strings are surrounded by double quotes or backquotes.",
            )),
            group: Cow::Borrowed("string_literal"),
        },
        basic_lit => RuleDescriptor {
            label: Cow::Borrowed("a literal"),
            hint: None,
            group: Cow::Borrowed("literal"),
        },
        literal_value | element | element_key | element_value => RuleDescriptor {
            label: Cow::Borrowed("a composite literal body like {1, 2}"),
            hint: None,
            group: Cow::Borrowed("literal_value"),
        },
        func_lit => RuleDescriptor {
            label: Cow::Borrowed("a function literal `func(…) { … }`"),
            hint: None,
            group: Cow::Borrowed("func_lit"),
        },
        ident | ident_list => RuleDescriptor {
            label: Cow::Borrowed("an identifier"),
            hint: Some(Cow::Borrowed(
                "Identifiers start with a letter or underscore and may not be keywords.",
            )),
            group: Cow::Borrowed("identifier"),
        },
        expr | header_expr | header_expr_operand | expr_list | header_expr_list | paren_expr => {
            RuleDescriptor {
                label: Cow::Borrowed("an expression"),
                hint: None,
                group: Cow::Borrowed("expression"),
            }
        }
        type_expr | type_operand | literal_type | header_literal_type => RuleDescriptor {
            label: Cow::Borrowed("a type"),
            hint: None,
            group: Cow::Borrowed("type"),
        },
        parameters | param_decl | unnamed_param | signature | result => RuleDescriptor {
            label: Cow::Borrowed("a parameter list `(…)`"),
            hint: None,
            group: Cow::Borrowed("parameters"),
        },
        block => RuleDescriptor {
            label: Cow::Borrowed("a block `{ … }`"),
            hint: Some(Cow::Borrowed(
                "The opening brace of a block must be on the same line as its statement.",
            )),
            group: Cow::Borrowed("block"),
        },
        statement | statements => RuleDescriptor {
            label: Cow::Borrowed("a statement"),
            hint: None,
            group: Cow::Borrowed("statement"),
        },
        case_clause | case_label | default_label | comm_clause | comm_case => RuleDescriptor {
            label: Cow::Borrowed("a case clause"),
            hint: None,
            group: Cow::Borrowed("case_clause"),
        },
        package_clause => RuleDescriptor {
            label: Cow::Borrowed("a package clause"),
            hint: Some(Cow::Borrowed("Every Go file starts with `package name`.")),
            group: Cow::Borrowed("package_clause"),
        },
        import_decl | import_spec => RuleDescriptor {
            label: Cow::Borrowed("an import"),
            hint: None,
            group: Cow::Borrowed("import"),
        },
        func_decl | var_decl | const_decl | type_decl => RuleDescriptor {
            label: Cow::Borrowed("a declaration"),
            hint: None,
            group: Cow::Borrowed("declaration"),
        },
        EOI => RuleDescriptor {
            label: Cow::Borrowed("end of file"),
            hint: None,
            group: Cow::Borrowed("eoi"),
        },
        _ => {
            let name = format_rule_name(rule);
            RuleDescriptor {
                label: Cow::Owned(name.clone()),
                hint: None,
                group: Cow::Owned(name),
            }
        }
    }
}

fn format_rule_name(rule: &Rule) -> String {
    format!("{rule:?}").split('_').map(|part| part.to_lowercase()).join(" ")
}

fn format_list<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let values = values.into_iter().collect_vec();
    match values.as_slice() {
        [] => String::new(),
        [first] => first.to_string(),
        [first, second] => format!("{first} or {second}"),
        [rest @ .., last] => format!("{}, or {}", rest.join(", "), last),
    }
}

#[derive(Clone)]
struct RuleDescriptor {
    label: Cow<'static, str>,
    hint: Option<Cow<'static, str>>,
    group: Cow<'static, str>,
}

trait ErrorVariantExt<R> {
    fn positives(&self) -> &[R];
}

impl<R> ErrorVariantExt<R> for ErrorVariant<R> {
    fn positives(&self) -> &[R] {
        match self {
            ErrorVariant::ParsingError { positives, .. } => positives,
            _ => &[],
        }
    }
}

/// Extension trait to write reports into strings.
trait ReportWrite<S: ariadne::Span> {
    fn write_to_string<C: ariadne::Cache<S::SourceId>>(&self, cache: C) -> String;
}

impl<S: ariadne::Span> ReportWrite<S> for Report<'_, S> {
    fn write_to_string<C: ariadne::Cache<S::SourceId>>(&self, cache: C) -> String {
        let mut buffer = Vec::new();
        if self.write(cache, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
