//! # Diagnostics
//!
//! This module defines the unified, `miette`-based diagnostic system for tally.
//! Every failure produced by validation, evaluation, the I/O glue or the
//! configuration loader is a [`TallyError`].
//!
//! # Error Construction Macros
//!
//! - Use `err_ctx!` for errors that point into the expression text.
//!   - `err_ctx!(DivisionByZero, src, span)`
//!   - `err_ctx!(InvalidCharacter { found: c }, src, span, help)`
//!
//! - Use `err_msg!` for message-only errors that have no source position.
//!   - `err_msg!(Config, "max_depth must be at least 1")`
//!
//! Pass `src` as a `&SourceArc` and `span` as a [`Span`]; the macros clone the
//! source handle themselves.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Coarse classification of a [`TallyError`], by the phase that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Characters outside the grammar's alphabet.
    Validation,
    /// Structural problems: parentheses, missing operands, leftovers.
    Parse,
    /// Arithmetic failures: division by zero, overflow.
    Eval,
    /// Problems reading input or files.
    Input,
    /// Invalid configuration.
    Config,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Validation => "validation",
            ErrorType::Parse => "parse",
            ErrorType::Eval => "eval",
            ErrorType::Input => "input",
            ErrorType::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal error context for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    /// The expression text the error points into (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Every way an evaluation can fail.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("Invalid character '{found}' in expression")]
    InvalidCharacter { found: char, ctx: ErrorContext },
    #[error("Division by zero")]
    DivisionByZero { ctx: ErrorContext },
    #[error("Unbalanced parenthesis")]
    UnbalancedParenthesis { ctx: ErrorContext },
    #[error("Missing operand")]
    MissingOperand { ctx: ErrorContext },
    #[error("Unexpected trailing input")]
    TrailingInput { ctx: ErrorContext },
    #[error("Integer overflow")]
    Overflow { ctx: ErrorContext },
    #[error("Parentheses nested deeper than {limit} levels")]
    RecursionLimit { limit: usize, ctx: ErrorContext },
    #[error("Input longer than {limit} bytes")]
    InputTooLong { limit: usize, ctx: ErrorContext },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<std::io::Error>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl TallyError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            TallyError::InvalidCharacter { ctx, .. }
            | TallyError::DivisionByZero { ctx }
            | TallyError::UnbalancedParenthesis { ctx }
            | TallyError::MissingOperand { ctx }
            | TallyError::TrailingInput { ctx }
            | TallyError::Overflow { ctx }
            | TallyError::RecursionLimit { ctx, .. }
            | TallyError::InputTooLong { ctx, .. }
            | TallyError::Io { ctx, .. }
            | TallyError::Config { ctx, .. } => ctx,
        }
    }

    /// Returns the phase classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            TallyError::InvalidCharacter { .. } => ErrorType::Validation,
            TallyError::UnbalancedParenthesis { .. }
            | TallyError::MissingOperand { .. }
            | TallyError::TrailingInput { .. }
            | TallyError::RecursionLimit { .. } => ErrorType::Parse,
            TallyError::DivisionByZero { .. } | TallyError::Overflow { .. } => ErrorType::Eval,
            TallyError::InputTooLong { .. } | TallyError::Io { .. } => ErrorType::Input,
            TallyError::Config { .. } => ErrorType::Config,
        }
    }

    /// Short machine name of the variant, used in diagnostic codes.
    pub fn code_suffix(&self) -> &'static str {
        match self {
            TallyError::InvalidCharacter { .. } => "invalid_character",
            TallyError::DivisionByZero { .. } => "division_by_zero",
            TallyError::UnbalancedParenthesis { .. } => "unbalanced_parenthesis",
            TallyError::MissingOperand { .. } => "missing_operand",
            TallyError::TrailingInput { .. } => "trailing_input",
            TallyError::Overflow { .. } => "overflow",
            TallyError::RecursionLimit { .. } => "recursion_limit",
            TallyError::InputTooLong { .. } => "input_too_long",
            TallyError::Io { .. } => "io",
            TallyError::Config { .. } => "config",
        }
    }

    /// The primary span, if the error points into the expression text.
    pub fn span(&self) -> Option<Span> {
        self.get_ctx().span
    }

    fn label_text(&self) -> String {
        match self {
            TallyError::InvalidCharacter { found, .. } => format!("'{found}' is not allowed here"),
            TallyError::DivisionByZero { .. } => "this divisor evaluates to zero".to_string(),
            TallyError::UnbalancedParenthesis { .. } => "unmatched parenthesis".to_string(),
            TallyError::MissingOperand { .. } => "expected a number or '('".to_string(),
            TallyError::TrailingInput { .. } => "not part of the expression".to_string(),
            TallyError::Overflow { .. } => "result does not fit in 64 bits".to_string(),
            TallyError::RecursionLimit { .. } => "nesting limit reached here".to_string(),
            TallyError::InputTooLong { .. } => "input is cut off here".to_string(),
            TallyError::Io { message, .. } | TallyError::Config { message, .. } => message.clone(),
        }
    }
}

impl Diagnostic for TallyError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!(
            "tally::{}::{}",
            self.error_type(),
            self.code_suffix()
        )))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        // A label without source text has nothing to point at.
        ctx.source.as_ref()?;
        let span = ctx.span?;
        let label = LabeledSpan::new(Some(self.label_text()), span.start, span.len());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Wraps an expression text as a named source for error contexts.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Constructs a `TallyError` that points into the expression text.
///
/// Accepts the variant (with its extra fields, if any), the source handle,
/// the span and an optional help message.
#[macro_export]
macro_rules! err_ctx {
    // Variant with fields, src, span, help
    ($variant:ident { $($field:ident : $value:expr),* $(,)? }, $src:expr, $span:expr, $help:expr) => {
        $crate::TallyError::$variant {
            $($field: $value,)*
            ctx: $crate::diagnostics::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
        }
    };
    // Variant with fields, src, span
    ($variant:ident { $($field:ident : $value:expr),* $(,)? }, $src:expr, $span:expr) => {
        $crate::TallyError::$variant {
            $($field: $value,)*
            ctx: $crate::diagnostics::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
        }
    };
    // Unit variant, src, span, help
    ($variant:ident, $src:expr, $span:expr, $help:expr) => {
        $crate::TallyError::$variant {
            ctx: $crate::diagnostics::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
        }
    };
    // Unit variant, src, span
    ($variant:ident, $src:expr, $span:expr) => {
        $crate::TallyError::$variant {
            ctx: $crate::diagnostics::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
        }
    };
}

/// Constructs a message-only `Io` or `Config` error with no context.
#[macro_export]
macro_rules! err_msg {
    // Message with format arguments
    ($variant:ident, $msg:expr, $($arg:expr),+) => {
        $crate::TallyError::$variant {
            message: format!($msg, $($arg),+),
            ctx: $crate::diagnostics::ErrorContext::none(),
            source: None,
        }
    };
    // Message only
    ($variant:ident, $msg:expr) => {
        $crate::TallyError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::diagnostics::ErrorContext::none(),
            source: None,
        }
    };
}
