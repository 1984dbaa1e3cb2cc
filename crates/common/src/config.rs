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

//! Config is created by the host (the command line tool, or a test), and handed to the analysis
//! pass at construction. Used to hold things typically configured by CLI flags or a config file.

use serde::{Deserialize, Serialize};

/// Source files whose name ends with this are considered test sources.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Whether to analyze test sources (`*_test.go`) as well.
    /// Off by default: table-driven tests and benchmarks capture loop variables in closures all
    /// the time, and usually on purpose.
    pub include_test_sources: bool,
}

impl AnalyzerConfig {
    /// Whether a unit with the given file name should be analyzed under this configuration.
    pub fn includes(&self, file_name: &str) -> bool {
        self.include_test_sources || !is_test_file(file_name)
    }
}

pub fn is_test_file(file_name: &str) -> bool {
    file_name.ends_with(TEST_FILE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("main.go", false; "plain source")]
    #[test_case("main_test.go", true; "test source")]
    #[test_case("pkg/dir/loop_test.go", true; "nested test source")]
    #[test_case("test.go", false; "name without underscore")]
    #[test_case("main_test.go.orig", false; "suffix not at end")]
    fn test_is_test_file(name: &str, expected: bool) {
        assert_eq!(is_test_file(name), expected);
    }

    #[test]
    fn test_default_excludes_tests() {
        let config = AnalyzerConfig::default();
        assert!(config.includes("loop.go"));
        assert!(!config.includes("loop_test.go"));

        let config = AnalyzerConfig {
            include_test_sources: true,
        };
        assert!(config.includes("loop_test.go"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AnalyzerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"include_test_sources": true}"#).unwrap();
        assert!(config.include_test_sources);
    }
}
