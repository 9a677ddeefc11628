//! Handles all user-facing output for the CLI.
//!
//! Results go to stdout, diagnostics to stderr. Colour is used only when the
//! stream is a terminal.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    engine::{print_error, BatchEntry},
    test_harness::{TestReport, TestResult},
};

fn stdout() -> StandardStream {
    let choice = if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn write_colored(stream: &mut StandardStream, color: Color, bold: bool, text: &str) {
    let _ = stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = write!(stream, "{text}");
    let _ = stream.reset();
}

/// Prints the answer to a single prompted expression.
pub fn print_result(value: i64) {
    let mut out = stdout();
    write_colored(&mut out, Color::Green, true, "Result:");
    let _ = writeln!(out, " {value}");
}

/// Prints a bare value, one per line.
pub fn print_value(value: i64) {
    let mut out = stdout();
    let _ = writeln!(out, "{value}");
}

/// Prints `input = value` for a successful batch line, or the diagnostic on
/// stderr for a failed one.
pub fn print_batch_entry(entry: BatchEntry) {
    match entry.outcome {
        Ok(value) => {
            let mut out = stdout();
            let _ = write!(out, "{} ", entry.input);
            write_colored(&mut out, Color::Cyan, false, "=");
            let _ = writeln!(out, " {value}");
        }
        Err(e) => print_error(e),
    }
}

pub fn print_test_report(report: &TestReport) {
    let mut out = stdout();

    for result in &report.results {
        match result {
            TestResult::Pass { name } => {
                write_colored(&mut out, Color::Green, false, "✓");
                let _ = writeln!(out, " {name}");
            }
            TestResult::Fail { name, reason } => {
                write_colored(&mut out, Color::Red, false, "✗");
                let _ = writeln!(out, " {name}: {reason}");
            }
            TestResult::Skip { name } => {
                write_colored(&mut out, Color::Yellow, false, "-");
                let _ = writeln!(out, " {name} (skipped)");
            }
        }
    }

    let _ = writeln!(out);
    write_colored(&mut out, Color::White, true, "Summary:");
    let _ = writeln!(
        out,
        " {} passed, {} failed, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped()
    );
}
