//! # tally
//!
//! Evaluates integer arithmetic expressions: `+ - * /`, unary minus and
//! parenthesised groups. Evaluation is a single recursive-descent pass over
//! the text; no tree is built.
//!
//! ```rust
//! use tally::{calculate, calculate_with, EvalOptions, TallyError};
//!
//! assert_eq!(calculate("(1*(-2))*(-2)-1*(2+4*2)/3+1").unwrap(), 2);
//! assert!(matches!(calculate("(1+2"), Err(TallyError::UnbalancedParenthesis { .. })));
//! assert_eq!(calculate_with("(1+2", &EvalOptions::lenient()).unwrap(), 3);
//! ```

pub use crate::diagnostics::{ErrorContext, ErrorType, TallyError};
pub use crate::syntax::{
    calculate, calculate_named, calculate_with, Cursor, EvalOptions, Evaluator, Parsed, Span,
    Strictness,
};

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod repl;
pub mod syntax;
pub mod test_harness;
