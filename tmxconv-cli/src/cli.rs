//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tmxconv::SegType;

const CSV2TMX_ABOUT: &str = "\
Convert CSV file(s) to TMX.

The first line of each CSV file must list one language code per column.
Cells containing a comma must be quoted.

Example:
es,en
\"Hola, John\",Hi John
me gustan las papas,I like potatoes

Each FILE.csv is written to FILE.tmx next to it.";

const TMX2CSV_ABOUT: &str = "\
Convert TMX file(s) to CSV.

The header row lists the languages of the first translation unit, in
document order. Each FILE.tmx is written to FILE.csv next to it.";

#[derive(Parser, Debug)]
#[command(
    name = "tmxconv",
    version,
    about = "Convert translation memories between CSV and TMX, and validate TMX files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Read defaults from this file instead of ./tmxconv.toml.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Print the batch summary as JSON on stdout instead of per-file lines.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert CSV file(s) to TMX.
    #[command(name = "csv2tmx", long_about = CSV2TMX_ABOUT)]
    Csv2Tmx(Csv2TmxArgs),

    /// Convert TMX file(s) to CSV.
    #[command(name = "tmx2csv", long_about = TMX2CSV_ABOUT)]
    Tmx2Csv(Tmx2CsvArgs),

    /// Validate TMX file(s) against the TMX 1.4 DTD.
    Validate(ValidateArgs),

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct Csv2TmxArgs {
    /// Force overwrite of existing output files.
    #[arg(short, long)]
    pub force: bool,

    /// CSV column index to use as the source language. Wins over --source-lang.
    #[arg(short = 's', long = "source", value_name = "COL_IDX")]
    pub source: Option<usize>,

    /// Source language code looked up in the CSV header [default: en].
    #[arg(short = 'l', long = "source-lang", value_name = "LANG_ID")]
    pub source_lang: Option<String>,

    /// Segmentation recorded in the TMX header [default: sentence].
    #[arg(
        short = 't',
        long = "seg-type",
        value_name = "sentence | phrase",
        value_parser = parse_seg_type
    )]
    pub seg_type: Option<SegType>,

    /// Number of files converted in parallel [default: 1].
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Glob compatible path(s) to CSV files to convert.
    #[arg(value_name = "GLOB_PATH", required = true)]
    pub patterns: Vec<String>,
}

#[derive(Args, Debug)]
pub struct Tmx2CsvArgs {
    /// Force overwrite of existing output files.
    #[arg(short, long)]
    pub force: bool,

    /// Place texts by their order inside each unit instead of by language tag.
    #[arg(long)]
    pub positional: bool,

    /// Number of files converted in parallel [default: 1].
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Glob compatible path(s) to TMX files to convert.
    #[arg(value_name = "GLOB_PATH", required = true)]
    pub patterns: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// DTD to validate against: an http(s) URL or a local path.
    #[arg(long, value_name = "URL_OR_PATH")]
    pub schema: Option<String>,

    /// Number of files validated in parallel [default: 1].
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Glob compatible path(s) to TMX files to check.
    #[arg(value_name = "GLOB_PATH", required = true)]
    pub patterns: Vec<String>,
}

/// CLI log format choices.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_seg_type(s: &str) -> Result<SegType, String> {
    s.parse::<SegType>().map_err(|e| e.to_string())
}

fn parse_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
