//! Execution pipeline: the I/O-facing layer around the evaluator.
//!
//! Applies the configured input bound, evaluates single lines or whole
//! batches, reads files and logs each evaluation.

use std::path::Path;

use miette::Report;
use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    diagnostics::to_error_source,
    err_ctx,
    syntax::{calculate_named, strip_terminator, EvalOptions, Span, Strictness},
    TallyError,
};

/// One evaluated line of a batch.
#[derive(Debug)]
pub struct BatchEntry {
    /// 1-based line number in the batch text.
    pub line_number: usize,
    pub input: String,
    pub outcome: Result<i64, TallyError>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionPipeline {
    config: EngineConfig,
}

impl ExecutionPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn eval_options(&self) -> EvalOptions {
        self.config.eval_options()
    }

    pub fn set_strictness(&mut self, strictness: Strictness) {
        self.config.strictness = strictness;
    }

    /// Evaluates one line with the configured options.
    pub fn evaluate_source(&self, line: &str) -> Result<i64, TallyError> {
        self.evaluate_line("expression", line)
    }

    /// Evaluates one line, naming it `name` in diagnostics.
    pub fn evaluate_line(&self, name: &str, line: &str) -> Result<i64, TallyError> {
        self.evaluate_with(name, line, &self.eval_options())
    }

    /// Evaluates one line with explicit options.
    ///
    /// Lines longer than `max_input_len` (terminator excluded) are rejected
    /// before validation.
    pub fn evaluate_with(
        &self,
        name: &str,
        line: &str,
        options: &EvalOptions,
    ) -> Result<i64, TallyError> {
        let body = strip_terminator(line);
        let limit = self.config.max_input_len;
        if body.len() > limit {
            let source = to_error_source(name, body);
            return Err(err_ctx!(
                InputTooLong { limit: limit },
                &source,
                Span::new(limit, body.len()),
                format!("split the expression or raise max_input_len above {limit}")
            ));
        }

        debug!(source = name, input = body, mode = %options.strictness, "evaluating");
        let result = calculate_named(name, line, options);
        match &result {
            Ok(value) => debug!(source = name, value, "evaluated"),
            Err(e) => debug!(source = name, error = %e, "evaluation failed"),
        }
        result
    }

    /// Evaluates every non-blank line of `text` independently.
    pub fn evaluate_batch(&self, text: &str) -> Vec<BatchEntry> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let line_number = index + 1;
                let outcome = self.evaluate_line(&format!("line {line_number}"), line);
                if let Err(e) = &outcome {
                    warn!(line = line_number, error = %e, "batch line failed");
                }
                BatchEntry {
                    line_number,
                    input: line.to_string(),
                    outcome,
                }
            })
            .collect()
    }

    pub fn read_file(path: &Path) -> Result<String, TallyError> {
        std::fs::read_to_string(path).map_err(|e| TallyError::Io {
            message: format!("failed to read '{}'", path.display()),
            ctx: Default::default(),
            source: Some(e),
        })
    }
}

/// Renders an error as a `miette` report on stderr.
pub fn print_error(error: TallyError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}
