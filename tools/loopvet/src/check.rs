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

//! Runs the pass over every requested compilation unit and prints what it finds.

use crate::args::OutputFormat;
use eyre::eyre;
use loopvet_analysis::LoopCapturePass;
use loopvet_common::{Diagnostic, SourceError};
use loopvet_frontend::{emit_source_error, parse_file, render_diagnostic};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exit status when the run completed and reported findings.
pub const EXIT_FINDINGS: i32 = 3;
/// Exit status when some unit could not be read or parsed.
pub const EXIT_FAILURE: i32 = 1;

/// The outcome of analyzing one compilation unit.
#[derive(Debug)]
pub struct UnitReport {
    pub name: String,
    /// Source text, when it could be read.
    pub source: Option<String>,
    pub result: Result<Vec<Diagnostic>, SourceError>,
}

impl UnitReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.result {
            Ok(diagnostics) => diagnostics,
            Err(_) => &[],
        }
    }
}

/// Expand the command line paths into the `.go` files to analyze, sorted and without repeats.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>, eyre::Report> {
    let mut sources = BTreeSet::new();
    for path in paths {
        if path.is_dir() {
            let pattern = path.join("**").join("*.go");
            let pattern = pattern.to_string_lossy();
            for entry in glob::glob(&pattern)
                .map_err(|e| eyre!("Invalid search pattern {pattern}: {e}"))?
            {
                sources.insert(entry?);
            }
        } else {
            // Missing files are kept so they surface as read failures.
            sources.insert(path.clone());
        }
    }
    Ok(sources.into_iter().collect())
}

fn analyze_unit(pass: &LoopCapturePass, path: &Path) -> UnitReport {
    let name = path.display().to_string();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            return UnitReport {
                result: Err(SourceError::Io {
                    path: name.clone(),
                    message: e.to_string(),
                }),
                name,
                source: None,
            };
        }
    };
    let result = parse_file(&name, &source).map(|parsed| pass.run(&parsed));
    UnitReport {
        name,
        source: Some(source),
        result,
    }
}

/// Analyze every unit, in parallel. Reports come back in path order.
pub fn analyze(pass: &LoopCapturePass, sources: &[PathBuf]) -> Vec<UnitReport> {
    let units: Vec<&PathBuf> = sources
        .iter()
        .filter(|path| {
            let included = pass.config().includes(&path.to_string_lossy());
            if !included {
                debug!(path = %path.display(), "skipping test source");
            }
            included
        })
        .collect();
    info!(units = units.len(), "analyzing");
    units
        .par_iter()
        .map(|path| analyze_unit(pass, path))
        .collect()
}

/// Write every finding in the requested format, and parse failures to stderr. Returns the
/// process exit status.
pub fn emit(
    reports: &[UnitReport],
    format: OutputFormat,
    use_color: bool,
    out: &mut dyn Write,
) -> Result<i32, eyre::Report> {
    let mut failures = 0;
    for report in reports {
        if let Err(e) = &report.result {
            failures += 1;
            emit_source_error(e, report.source.as_deref(), &report.name, use_color);
        }
    }

    let mut diagnostics: Vec<(&Diagnostic, Option<&str>)> = reports
        .iter()
        .flat_map(|r| r.diagnostics().iter().map(|d| (d, r.source.as_deref())))
        .collect();
    diagnostics.sort_by(|a, b| a.0.cmp(b.0));

    match format {
        OutputFormat::Text => {
            for (diagnostic, _) in &diagnostics {
                writeln!(out, "{diagnostic}")?;
            }
        }
        OutputFormat::Pretty => {
            for (diagnostic, source) in &diagnostics {
                match source {
                    Some(source) => {
                        write!(out, "{}", render_diagnostic(diagnostic, source, use_color))?
                    }
                    None => writeln!(out, "{diagnostic}")?,
                }
            }
        }
        OutputFormat::Json => {
            let plain: Vec<&Diagnostic> = diagnostics.iter().map(|(d, _)| *d).collect();
            serde_json::to_writer_pretty(&mut *out, &plain)?;
            writeln!(out)?;
        }
    }

    info!(findings = diagnostics.len(), failures, "done");
    Ok(if failures > 0 {
        EXIT_FAILURE
    } else if !diagnostics.is_empty() {
        EXIT_FINDINGS
    } else {
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopvet_common::AnalyzerConfig;
    use pretty_assertions::assert_eq;
    use std::fs;

    const CAPTURING: &str = "package p\n\nfunc f(xs []int) {\n\tfor i := range xs {\n\t\tgo func() { println(i) }()\n\t}\n}\n";
    const CLEAN: &str = "package p\n\nfunc g(xs []int) {\n\tfor i := range xs {\n\t\tprintln(i)\n\t}\n}\n";

    fn workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        dir
    }

    fn run(dir: &Path, config: AnalyzerConfig, format: OutputFormat) -> (i32, String) {
        let sources = collect_sources(&[dir.to_path_buf()]).unwrap();
        let reports = analyze(&LoopCapturePass::new(config), &sources);
        let mut out = vec![];
        let code = emit(&reports, format, false, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_collect_sources_recurses_and_sorts() {
        let dir = workspace(&[
            ("b.go", CLEAN),
            ("nested/deeper/a.go", CLEAN),
            ("a.go", CLEAN),
            ("notes.txt", "not go"),
        ]);
        let file = dir.path().join("a.go");
        let sources = collect_sources(&[dir.path().to_path_buf(), file]).unwrap();
        let relative: Vec<_> = sources
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.go"),
                PathBuf::from("b.go"),
                PathBuf::from("nested/deeper/a.go")
            ]
        );
    }

    #[test]
    fn test_text_output_and_exit_status() {
        let dir = workspace(&[("clean.go", CLEAN), ("loop.go", CAPTURING)]);
        let (code, out) = run(dir.path(), AnalyzerConfig::default(), OutputFormat::Text);
        assert_eq!(code, EXIT_FINDINGS);
        let expected = format!(
            "{}:5:23: {}\n",
            dir.path().join("loop.go").display(),
            loopvet_analysis::message("i")
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_clean_run() {
        let dir = workspace(&[("clean.go", CLEAN)]);
        let (code, out) = run(dir.path(), AnalyzerConfig::default(), OutputFormat::Text);
        assert_eq!(code, 0);
        assert_eq!(out, "");
    }

    #[test]
    fn test_test_sources_need_opt_in() {
        let dir = workspace(&[("loop_test.go", CAPTURING)]);
        let (code, _) = run(dir.path(), AnalyzerConfig::default(), OutputFormat::Text);
        assert_eq!(code, 0);

        let config = AnalyzerConfig {
            include_test_sources: true,
        };
        let (code, _) = run(dir.path(), config, OutputFormat::Text);
        assert_eq!(code, EXIT_FINDINGS);
    }

    #[test]
    fn test_json_output() {
        let dir = workspace(&[("loop.go", CAPTURING)]);
        let (_, out) = run(dir.path(), AnalyzerConfig::default(), OutputFormat::Json);
        let parsed: Vec<Diagnostic> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!((parsed[0].line, parsed[0].column), (5, 23));
    }

    #[test]
    fn test_pretty_output_names_variable() {
        let dir = workspace(&[("loop.go", CAPTURING)]);
        let (_, out) = run(dir.path(), AnalyzerConfig::default(), OutputFormat::Pretty);
        assert!(out.contains("loop variable `i`"), "{out}");
    }

    #[test]
    fn test_parse_failure_still_reports_other_units() {
        let dir = workspace(&[
            ("broken.go", "package p\nfunc f( {\n"),
            ("loop.go", CAPTURING),
        ]);
        let (code, out) = run(dir.path(), AnalyzerConfig::default(), OutputFormat::Text);
        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_missing_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sources = collect_sources(&[dir.path().join("absent.go")]).unwrap();
        let reports = analyze(&LoopCapturePass::default(), &sources);
        assert!(matches!(reports[0].result, Err(SourceError::Io { .. })));
        let mut out = vec![];
        assert_eq!(
            emit(&reports, OutputFormat::Text, false, &mut out).unwrap(),
            EXIT_FAILURE
        );
    }
}
