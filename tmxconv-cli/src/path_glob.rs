use std::collections::HashSet;
use std::path::PathBuf;

use glob::{MatchOptions, glob_with};
use tracing::debug;

/// One command-line pattern after expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expanded {
    /// A regular file matched by the pattern.
    File(PathBuf),
    /// The pattern matched no regular file.
    NoMatch(String),
    /// The pattern is not valid glob syntax.
    Invalid { pattern: String, reason: String },
}

/// Expand glob patterns into files, in pattern order.
///
/// Matches within one pattern are sorted by path. A file matched by several
/// patterns is kept at its first position only. Directories are skipped.
pub fn expand_input_globs(patterns: &[String]) -> Vec<Expanded> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut out = Vec::new();
    for pattern in patterns {
        let paths = match glob_with(pattern, options) {
            Ok(paths) => paths,
            Err(e) => {
                out.push(Expanded::Invalid {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let mut matched = false;
        // Unreadable directory entries are skipped
        for path in paths.flatten() {
            if !path.is_file() {
                continue;
            }
            matched = true;
            if seen.insert(path.clone()) {
                out.push(Expanded::File(path));
            }
        }
        debug!(pattern = %pattern, matched, "expanded pattern");
        if !matched {
            out.push(Expanded::NoMatch(pattern.clone()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pattern(dir: &TempDir, tail: &str) -> String {
        dir.path().join(tail).to_string_lossy().into_owned()
    }

    #[test]
    fn test_expands_in_pattern_order_without_duplicates() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.csv", "a.csv", "c.tmx"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        fs::create_dir(tmp.path().join("dir.csv")).unwrap();

        let expanded = expand_input_globs(&[
            pattern(&tmp, "c.tmx"),
            pattern(&tmp, "*.csv"),
            pattern(&tmp, "a.csv"),
        ]);
        assert_eq!(
            expanded,
            vec![
                Expanded::File(tmp.path().join("c.tmx")),
                Expanded::File(tmp.path().join("a.csv")),
                Expanded::File(tmp.path().join("b.csv")),
            ]
        );
    }

    #[test]
    fn test_reports_empty_and_invalid_patterns() {
        let tmp = TempDir::new().unwrap();
        let missing = pattern(&tmp, "*.csv");
        let expanded = expand_input_globs(&[missing.clone(), "[".to_string()]);
        assert_eq!(expanded[0], Expanded::NoMatch(missing));
        assert!(matches!(&expanded[1], Expanded::Invalid { pattern, .. } if pattern == "["));
    }
}
