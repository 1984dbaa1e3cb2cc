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

use clap::builder::ValueHint;
use clap_derive::{Parser, ValueEnum};
use eyre::eyre;
use figment::Figment;
use figment::providers::{Format as ProviderFormat, Serialized, Yaml};
use loopvet_common::AnalyzerConfig;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `file:line:column: message`, one per line.
    #[default]
    Text,
    /// Source excerpts with the captured identifier underlined.
    Pretty,
    /// A JSON array of diagnostics.
    Json,
}

#[derive(Parser, Debug)]
pub struct AnalyzerArgs {
    #[arg(
        short = 't',
        long = "include-tests",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Also analyze test sources (files ending in _test.go). Off unless set here or in the configuration file; `--include-tests=false` overrides the file."
    )]
    pub include_test_sources: Option<bool>,
}

impl AnalyzerArgs {
    pub fn merge_config(&self, config: &mut AnalyzerConfig) -> Result<(), eyre::Report> {
        if let Some(args) = self.include_test_sources {
            config.include_test_sources = args;
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "loopvet",
    about = "Reports function literals that capture variables shared by every iteration of an enclosing loop"
)]
pub struct Args {
    #[arg(
        value_name = "PATHS",
        help = "Go source files, or directories to search recursively for them",
        value_hint = ValueHint::AnyPath,
        default_value = "."
    )]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub analyzer_args: AnalyzerArgs,

    #[arg(
        long,
        value_name = "config",
        help = "Path to configuration (YAML) file to use, if any. If not specified, defaults are used.\
                Configuration file values can be overridden by command line arguments.",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, help = "How to print findings")]
    pub format: OutputFormat,

    #[arg(long, help = "Use color in rendered reports")]
    pub color: bool,

    #[arg(long, help = "Enable debug logging")]
    pub debug: bool,
}

impl Args {
    /// Load the configuration file if we have it, and then merge the arguments into it.
    pub fn load_config(&self) -> Result<AnalyzerConfig, eyre::Report> {
        let mut config = match &self.config_file {
            Some(config_path) => Figment::new()
                .merge(Serialized::defaults(AnalyzerConfig::default()))
                .merge(Yaml::file(config_path))
                .extract::<AnalyzerConfig>()
                .map_err(|e| {
                    eyre!(
                        "Failed to parse configuration from {:?}: {}",
                        config_path,
                        e
                    )
                })?,
            None => AnalyzerConfig::default(),
        };
        self.analyzer_args.merge_config(&mut config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["loopvet"]);
        assert_eq!(args.paths, vec![PathBuf::from(".")]);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.load_config().unwrap(), AnalyzerConfig::default());
    }

    #[test]
    fn test_flag_enables_tests() {
        let args = Args::parse_from(["loopvet", "-t", "--format", "json", "a.go", "pkg"]);
        assert_eq!(args.paths, vec![PathBuf::from("a.go"), PathBuf::from("pkg")]);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.load_config().unwrap().include_test_sources);
    }

    #[test]
    fn test_bare_flag_before_path() {
        let args = Args::parse_from(["loopvet", "-t", "pkg/"]);
        assert_eq!(args.paths, vec![PathBuf::from("pkg/")]);
        assert_eq!(args.analyzer_args.include_test_sources, Some(true));

        let args = Args::parse_from(["loopvet", "--include-tests=false", "pkg/"]);
        assert_eq!(args.paths, vec![PathBuf::from("pkg/")]);
        assert_eq!(args.analyzer_args.include_test_sources, Some(false));
    }

    #[test]
    fn test_file_then_flags() {
        let file = config_file("include_test_sources: true\n");
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from(["loopvet", "--config-file", path]);
        assert!(args.load_config().unwrap().include_test_sources);

        let args = Args::parse_from(["loopvet", "--config-file", path, "--include-tests=false"]);
        assert!(!args.load_config().unwrap().include_test_sources);
    }

    #[test]
    fn test_bad_config_file() {
        let file = config_file("include_test_sources: [1, 2]\n");
        let path = file.path().to_str().unwrap();
        let args = Args::parse_from(["loopvet", "--config-file", path]);
        let err = args.load_config().unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse configuration"));
    }
}
