//! Syntax module: validation and recursive-descent evaluation of arithmetic
//! expressions.
//!
//! Precedence, highest first: parentheses, unary minus, `*` and `/`, then
//! `+` and `-`. Every binary level is left-associative.

use std::str::FromStr;

use serde::Deserialize;

use crate::{diagnostics::to_error_source, TallyError};

pub mod cursor;
pub mod evaluator;
pub mod validator;

pub use cursor::{Cursor, Parsed, Span};
pub use evaluator::{EvalOptions, Evaluator, DEFAULT_MAX_DEPTH};
pub use validator::{is_grammar_char, strip_terminator, validate};

/// How malformed input is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Unbalanced parentheses, missing operands and trailing input are errors.
    #[default]
    Strict,
    /// Legacy behaviour: those cases degrade to a best-effort number.
    Lenient,
}

impl Strictness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strictness::Strict => "strict",
            Strictness::Lenient => "lenient",
        }
    }
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Strictness::Strict),
            "lenient" => Ok(Strictness::Lenient),
            other => Err(format!(
                "unknown mode '{other}', expected 'strict' or 'lenient'"
            )),
        }
    }
}

/// Evaluates `text` with the default (strict) options.
///
/// # Example
/// ```rust
/// assert_eq!(tally::calculate("(1+3*(-4))/2").unwrap(), -5);
/// assert!(tally::calculate("1/0").is_err());
/// ```
pub fn calculate(text: &str) -> Result<i64, TallyError> {
    calculate_with(text, &EvalOptions::default())
}

/// Evaluates `text` with explicit options.
pub fn calculate_with(text: &str, options: &EvalOptions) -> Result<i64, TallyError> {
    calculate_named("expression", text, options)
}

/// Evaluates `text`, naming it `name` in diagnostics.
///
/// Validation runs first; nothing is evaluated if it fails. Strict mode
/// strips one trailing line terminator before validating, lenient mode keeps
/// the text as given and only exempts its final character.
pub fn calculate_named(name: &str, text: &str, options: &EvalOptions) -> Result<i64, TallyError> {
    let body = match options.strictness {
        Strictness::Strict => strip_terminator(text),
        Strictness::Lenient => text,
    };
    let source = to_error_source(name, body);

    validate(body, options.strictness, &source)?;
    Evaluator::with_source(body, source, *options).evaluate()
}
