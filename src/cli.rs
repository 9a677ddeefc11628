//! The tally command-line interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process,
};

use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    config::EngineConfig,
    engine::{print_error, ExecutionPipeline},
    repl, test_harness,
    syntax::Strictness,
    TallyError,
};

pub mod output;

// ============================================================================
// CLI ARGUMENTS - Command-line argument definitions
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "tally",
    version,
    about = "Evaluate integer arithmetic expressions.",
    long_about = "Evaluate integer arithmetic expressions built from digits, + - * /, \
                  unary minus and parentheses. With no subcommand, prompts for one \
                  expression on stdin."
)]
pub struct TallyArgs {
    #[command(subcommand)]
    pub command: Option<ArgsCommand>,

    /// Keep the legacy behaviour: unclosed groups, missing operands and
    /// trailing input are tolerated instead of reported.
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Maximum nesting depth of parenthesised groups.
    #[arg(long, global = true, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Maximum length of one input line, in bytes.
    #[arg(long, global = true, value_name = "N")]
    pub max_input_len: Option<usize>,

    /// YAML configuration file; command-line flags override its values.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log more; repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Evaluate each expression given on the command line.
    Eval {
        /// Expressions to evaluate, e.g. "(1+3*(-4))/2".
        #[arg(required = true, allow_hyphen_values = true)]
        expressions: Vec<String>,
    },
    /// Evaluate every non-blank line of a file.
    Run {
        /// The file holding one expression per line.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Start an interactive session.
    Repl,
    /// Run a YAML expectation suite, or the built-in self-check.
    Test {
        /// The YAML suite to run.
        file: Option<PathBuf>,
    },
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = TallyArgs::parse();
    init_logging(args.verbose);

    let config = build_config(&args).unwrap_or_else(|e| {
        print_error(e);
        process::exit(1);
    });
    info!(mode = %config.strictness, max_depth = config.max_depth, "configured");
    let pipeline = ExecutionPipeline::new(config);

    let succeeded = match args.command {
        None => prompt_once(&pipeline),
        Some(ArgsCommand::Eval { expressions }) => eval_expressions(&pipeline, &expressions),
        Some(ArgsCommand::Run { file }) => run_file(&pipeline, &file),
        Some(ArgsCommand::Repl) => match repl::run_repl(pipeline) {
            Ok(()) => true,
            Err(e) => {
                print_error(e);
                false
            }
        },
        Some(ArgsCommand::Test { file }) => run_test_suite(&pipeline, file.as_deref()),
    };

    if !succeeded {
        process::exit(1);
    }
}

/// Layers defaults, the optional config file and command-line flags.
pub fn build_config(args: &TallyArgs) -> Result<EngineConfig, TallyError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if args.lenient {
        config.strictness = Strictness::Lenient;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(max_input_len) = args.max_input_len {
        config.max_input_len = max_input_len;
    }
    config.validated()
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(io::stderr)
        .try_init();
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn prompt_once(pipeline: &ExecutionPipeline) -> bool {
    if atty::is(atty::Stream::Stdin) {
        print!("{}", pipeline.config().prompt);
        let _ = io::stdout().flush();
    }

    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        print_error(TallyError::Io {
            message: "failed to read an expression from stdin".to_string(),
            ctx: Default::default(),
            source: Some(e),
        });
        return false;
    }

    match pipeline.evaluate_source(&line) {
        Ok(value) => {
            output::print_result(value);
            true
        }
        Err(e) => {
            print_error(e);
            false
        }
    }
}

fn eval_expressions(pipeline: &ExecutionPipeline, expressions: &[String]) -> bool {
    let mut succeeded = true;
    for (index, expression) in expressions.iter().enumerate() {
        match pipeline.evaluate_line(&format!("argument {}", index + 1), expression) {
            Ok(value) => output::print_value(value),
            Err(e) => {
                print_error(e);
                succeeded = false;
            }
        }
    }
    succeeded
}

fn run_file(pipeline: &ExecutionPipeline, file: &Path) -> bool {
    let text = match ExecutionPipeline::read_file(file) {
        Ok(text) => text,
        Err(e) => {
            print_error(e);
            return false;
        }
    };

    let entries = pipeline.evaluate_batch(&text);
    let succeeded = entries.iter().all(|entry| entry.is_ok());
    for entry in entries {
        output::print_batch_entry(entry);
    }
    succeeded
}

fn run_test_suite(pipeline: &ExecutionPipeline, file: Option<&Path>) -> bool {
    let cases = match file {
        Some(path) => match test_harness::load_test_cases(path) {
            Ok(cases) => cases,
            Err(e) => {
                print_error(e);
                return false;
            }
        },
        None => test_harness::builtin_cases(),
    };

    let report = test_harness::run_test_cases(pipeline, &cases);
    output::print_test_report(&report);
    report.is_success()
}
