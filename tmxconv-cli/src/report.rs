//! Human-readable and JSON output of a [`BatchSummary`].

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

use crate::batch::{BatchSummary, FileReport, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Whether each stream gets ANSI colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorMode {
    pub stdout: bool,
    pub stderr: bool,
}

/// The uncolored message for one report and the stream it belongs on.
pub fn render(report: &FileReport) -> (Stream, String) {
    let input = &report.input;
    match &report.outcome {
        Outcome::Converted { output, count } => (
            Stream::Stdout,
            format!("{input} -> {} {count} pairs are done.", output.display()),
        ),
        Outcome::Valid => (Stream::Stdout, format!("{input} is a valid tmx file.")),
        Outcome::Invalid { violations } => {
            let mut message = format!("{input} is invalid tmx file");
            for violation in violations {
                message.push_str("\n  ");
                message.push_str(&violation.to_string());
            }
            (Stream::Stderr, message)
        }
        Outcome::Failed { error } => (Stream::Stderr, format!("{input} failed.\n{error}")),
        Outcome::NoMatch => (
            Stream::Stderr,
            format!("{input} failed.\nno file matches this pattern"),
        ),
    }
}

/// Print one line group per report, successes green on stdout and failures
/// red on stderr.
pub fn print_summary(summary: &BatchSummary, colors: ColorMode) {
    let stdout = io::stdout();
    let stderr = io::stderr();
    for report in &summary.files {
        let (stream, message) = render(report);
        // Broken pipes are not worth a panic
        let _ = match stream {
            Stream::Stdout => {
                let message = paint(message, Color::Green, colors.stdout);
                writeln!(stdout.lock(), "{message}")
            }
            Stream::Stderr => {
                let message = paint(message, Color::Red, colors.stderr);
                writeln!(stderr.lock(), "{message}")
            }
        };
    }
}

pub fn print_json(summary: &BatchSummary) -> Result<(), String> {
    let json = serde_json::to_string_pretty(summary).map_err(|e| e.to_string())?;
    writeln!(io::stdout().lock(), "{json}").map_err(|e| e.to_string())
}

fn paint(message: String, color: Color, enabled: bool) -> String {
    if enabled {
        message.with(color).to_string()
    } else {
        message
    }
}
