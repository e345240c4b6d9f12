//! Runs one operation over every expanded input and collects the results.
//!
//! Errors never cross a file boundary: each input ends up as exactly one
//! [`FileReport`], in input order, whatever happened to the others.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tmxconv::{
    CsvToTmxOptions, Error, FormatType, TmxToCsvOptions, csv_to_tmx,
    path::derive_output_pathbuf,
    schema::{SchemaCache, SchemaSource, Violation},
    tmx_to_csv,
};
use tracing::{debug, error, info, warn};

use crate::path_glob::Expanded;

/// A conversion direction with its options.
#[derive(Debug, Clone)]
pub enum Conversion {
    CsvToTmx(CsvToTmxOptions),
    TmxToCsv(TmxToCsvOptions),
}

impl Conversion {
    pub fn input_format(&self) -> FormatType {
        match self {
            Conversion::CsvToTmx(_) => FormatType::Csv,
            Conversion::TmxToCsv(_) => FormatType::Tmx,
        }
    }

    /// Where the result of converting `input` is written.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let from = self.input_format();
        derive_output_pathbuf(input, from.extension(), from.counterpart().extension())
    }

    fn run(&self, input: &Path, output: &Path) -> Result<usize, Error> {
        match self {
            Conversion::CsvToTmx(options) => csv_to_tmx(input, output, options),
            Conversion::TmxToCsv(options) => tmx_to_csv(input, output, options),
        }
    }
}

/// What happened to one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Converted { output: PathBuf, count: usize },
    Valid,
    Invalid { violations: Vec<Violation> },
    Failed { error: String },
    /// A pattern that expanded to no file.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// The file path, or the pattern for [`Outcome::NoMatch`] and invalid patterns.
    pub input: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Converted { .. } | Outcome::Valid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub files: Vec<FileReport>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_reports(files: Vec<FileReport>) -> Self {
        let succeeded = files.iter().filter(|r| r.is_success()).count();
        let failed = files.len() - succeeded;
        Self {
            files,
            succeeded,
            failed,
        }
    }

    /// Process exit code: 1 if any input failed or nothing was processed.
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 || self.files.is_empty() {
            1
        } else {
            0
        }
    }
}

/// Convert every input, refusing to replace existing outputs unless `force`.
pub fn run_conversions(
    inputs: &[Expanded],
    conversion: &Conversion,
    force: bool,
    jobs: usize,
) -> BatchSummary {
    run_batch(inputs, jobs, |input| convert_one(input, conversion, force))
}

fn convert_one(input: &Path, conversion: &Conversion, force: bool) -> Outcome {
    let output = conversion.output_path(input);
    if !force && output.exists() {
        return failed(input, Error::OutputExists(output));
    }
    match conversion.run(input, &output) {
        Ok(count) => Outcome::Converted { output, count },
        Err(e) => failed(input, e),
    }
}

/// Validate every input against the cached schema.
///
/// The schema is loaded once, before the first file. If it cannot be loaded
/// every file fails with that error.
pub fn run_validation<S>(inputs: &[Expanded], cache: &SchemaCache<S>, jobs: usize) -> BatchSummary
where
    S: SchemaSource + Sync,
{
    let has_files = inputs.iter().any(|e| matches!(e, Expanded::File(_)));
    if has_files {
        if let Err(e) = cache.get() {
            error!(error = %e, "schema could not be loaded");
            let message = e.to_string();
            return run_batch(inputs, 1, |_| Outcome::Failed {
                error: message.clone(),
            });
        }
    }

    run_batch(inputs, jobs, |input| match cache.validate_file(input) {
        Ok(violations) if violations.is_empty() => Outcome::Valid,
        Ok(violations) => {
            debug!(path = %input.display(), count = violations.len(), "invalid document");
            Outcome::Invalid { violations }
        }
        Err(e) => failed(input, e),
    })
}

fn failed(input: &Path, e: Error) -> Outcome {
    debug!(path = %input.display(), error = %e, "file failed");
    Outcome::Failed {
        error: e.to_string(),
    }
}

fn run_batch<F>(inputs: &[Expanded], jobs: usize, process: F) -> BatchSummary
where
    F: Fn(&Path) -> Outcome + Sync,
{
    let handle = |entry: &Expanded| match entry {
        Expanded::File(path) => FileReport {
            input: path.display().to_string(),
            outcome: process(path),
        },
        Expanded::NoMatch(pattern) => FileReport {
            input: pattern.clone(),
            outcome: Outcome::NoMatch,
        },
        Expanded::Invalid { pattern, reason } => FileReport {
            input: pattern.clone(),
            outcome: Outcome::Failed {
                error: format!("invalid pattern: {reason}"),
            },
        },
    };

    let reports: Vec<FileReport> = if jobs <= 1 {
        inputs.iter().map(&handle).collect()
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            // Indexed collect keeps input order
            Ok(pool) => pool.install(|| inputs.par_iter().map(&handle).collect()),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable, running sequentially");
                inputs.iter().map(&handle).collect()
            }
        }
    };

    let summary = BatchSummary::from_reports(reports);
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "batch finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tmxconv::schema::FileSchema;

    fn csv_job() -> Conversion {
        Conversion::CsvToTmx(CsvToTmxOptions::new())
    }

    #[test]
    fn test_output_path_follows_direction() {
        assert_eq!(
            csv_job().output_path(Path::new("dir/A.CSV")),
            PathBuf::from("dir/A.tmx")
        );
        let back = Conversion::TmxToCsv(TmxToCsvOptions::new());
        assert_eq!(
            back.output_path(Path::new("a.tmx")),
            PathBuf::from("a.csv")
        );
    }

    #[test]
    fn test_existing_output_is_kept_without_force() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("a.csv");
        let output = tmp.path().join("a.tmx");
        fs::write(&input, "en,es\nHi,Hola\n").unwrap();
        fs::write(&output, "keep me").unwrap();
        let inputs = vec![Expanded::File(input)];

        let summary = run_conversions(&inputs, &csv_job(), false, 1);
        assert_eq!(summary.failed, 1);
        match &summary.files[0].outcome {
            Outcome::Failed { error } => assert!(error.ends_with("already exists")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

        let summary = run_conversions(&inputs, &csv_job(), true, 1);
        assert_eq!(summary.exit_code(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("<tmx"));
    }

    #[test]
    fn test_failures_do_not_stop_the_batch_and_order_is_kept() {
        let tmp = TempDir::new().unwrap();
        let mut inputs = Vec::new();
        for (name, content) in [
            ("1.csv", "en,es\nHi,Hola\n"),
            ("2.csv", "fr,de\na,b\n"),
            ("3.csv", "en,de\nYes,Ja\nNo,Nein\n"),
        ] {
            let path = tmp.path().join(name);
            fs::write(&path, content).unwrap();
            inputs.push(Expanded::File(path));
        }
        inputs.push(Expanded::NoMatch("*.nothing".to_string()));

        let summary = run_conversions(&inputs, &csv_job(), false, 3);
        let names: Vec<&str> = summary.files.iter().map(|r| r.input.as_str()).collect();
        assert!(names[0].ends_with("1.csv"));
        assert!(names[1].ends_with("2.csv"));
        assert!(names[2].ends_with("3.csv"));
        assert_eq!(names[3], "*.nothing");
        assert_eq!((summary.succeeded, summary.failed), (2, 2));
        assert!(matches!(
            summary.files[2].outcome,
            Outcome::Converted { count: 2, .. }
        ));
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_empty_batch_fails() {
        assert_eq!(BatchSummary::from_reports(Vec::new()).exit_code(), 1);
    }

    #[test]
    fn test_unloadable_schema_fails_every_file() {
        let tmp = TempDir::new().unwrap();
        let tmx = tmp.path().join("a.tmx");
        fs::write(&tmx, "<tmx/>").unwrap();
        let cache = SchemaCache::new(FileSchema::new(tmp.path().join("absent.dtd")));

        let summary = run_validation(&[Expanded::File(tmx)], &cache, 1);
        assert_eq!(summary.failed, 1);
        assert!(matches!(summary.files[0].outcome, Outcome::Failed { .. }));
    }

    #[test]
    fn test_validation_without_files_does_not_load_schema() {
        let tmp = TempDir::new().unwrap();
        let cache = SchemaCache::new(FileSchema::new(tmp.path().join("absent.dtd")));
        let summary = run_validation(&[Expanded::NoMatch("*.tmx".to_string())], &cache, 1);
        assert!(!cache.is_loaded());
        assert_eq!(summary.files[0].outcome, Outcome::NoMatch);
    }

    #[test]
    fn test_summary_serializes_with_status_tag() {
        let summary = BatchSummary::from_reports(vec![FileReport {
            input: "a.csv".to_string(),
            outcome: Outcome::Converted {
                output: PathBuf::from("a.tmx"),
                count: 3,
            },
        }]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["files"][0]["status"], "converted");
        assert_eq!(json["files"][0]["output"], "a.tmx");
        assert_eq!(json["files"][0]["count"], 3);
        assert_eq!(json["succeeded"], 1);
    }
}
