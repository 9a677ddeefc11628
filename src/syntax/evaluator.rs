//! Recursive-descent evaluator.
//!
//! Evaluates directly over the expression text; no tree is built. Each level
//! takes a [`Cursor`] by value and returns the computed integer together with
//! the cursor just past what it consumed.
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := primary (('*' | '/') primary)*
//! primary    := '-'? (digit+ | '(' expression ')')
//! ```

use tracing::trace;

use crate::{
    diagnostics::{to_error_source, SourceArc},
    err_ctx,
    syntax::{Cursor, Parsed, Span, Strictness},
    TallyError,
};

/// Nesting depth allowed for parenthesised groups unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Per-evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    pub strictness: Strictness,
    pub max_depth: usize,
}

impl EvalOptions {
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn lenient() -> Self {
        Self {
            strictness: Strictness::Lenient,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self::strict()
    }
}

/// Evaluates one expression text.
///
/// Holds no mutable state: the same evaluator may be asked for any grammar
/// level at any cursor, any number of times.
pub struct Evaluator<'src> {
    text: &'src [u8],
    source: SourceArc,
    options: EvalOptions,
}

impl<'src> Evaluator<'src> {
    pub fn new(text: &'src str, options: EvalOptions) -> Self {
        Self::with_source(text, to_error_source("expression", text), options)
    }

    /// Uses `source` for diagnostics instead of wrapping `text` again.
    pub fn with_source(text: &'src str, source: SourceArc, options: EvalOptions) -> Self {
        Self {
            text: text.as_bytes(),
            source,
            options,
        }
    }

    pub fn options(&self) -> EvalOptions {
        self.options
    }

    /// Evaluates the whole text from the first byte.
    ///
    /// In strict mode the expression must consume the entire text; a leftover
    /// `)` is reported as unbalanced and anything else as trailing input.
    pub fn evaluate(&self) -> Result<i64, TallyError> {
        let (value, at) = self.evaluate_expression(Cursor::start())?;

        if self.options.is_strict() && !at.is_at_end(self.text) {
            return Err(match at.peek(self.text) {
                Some(b')') => err_ctx!(
                    UnbalancedParenthesis,
                    &self.source,
                    at.span(self.text),
                    "this ')' has no matching '('"
                ),
                _ => err_ctx!(
                    TrailingInput,
                    &self.source,
                    Span::new(at.offset(), self.text.len()),
                    "an operator is needed between operands"
                ),
            });
        }

        Ok(value)
    }

    /// Parses one signed literal or parenthesised group.
    pub fn get_natural(&self, at: Cursor) -> Parsed<i64> {
        self.primary(at, 0)
    }

    /// Parses a chain of primaries joined by `*` and `/`.
    pub fn evaluate_term(&self, at: Cursor) -> Parsed<i64> {
        self.term(at, 0)
    }

    /// Parses a chain of terms joined by `+` and `-`.
    pub fn evaluate_expression(&self, at: Cursor) -> Parsed<i64> {
        self.expression(at, 0)
    }

    fn expression(&self, at: Cursor, depth: usize) -> Parsed<i64> {
        let start = at;
        let (mut result, mut at) = self.term(at, depth)?;

        while let Some(op @ (b'+' | b'-')) = at.peek(self.text) {
            let (operand, next) = self.term(at.advance(1), depth)?;
            let combined = if op == b'+' {
                result.checked_add(operand)
            } else {
                result.checked_sub(operand)
            };
            result = combined.ok_or_else(|| self.overflow(start, next))?;
            trace!(op = %char::from(op), operand, result, "applied");
            at = next;
        }

        Ok((result, at))
    }

    fn term(&self, at: Cursor, depth: usize) -> Parsed<i64> {
        let start = at;
        let (mut result, mut at) = self.primary(at, depth)?;

        while let Some(op @ (b'*' | b'/')) = at.peek(self.text) {
            let divisor_at = at.advance(1);
            let (operand, next) = self.primary(divisor_at, depth)?;
            let combined = if op == b'*' {
                result.checked_mul(operand)
            } else if operand == 0 {
                return Err(err_ctx!(
                    DivisionByZero,
                    &self.source,
                    Span::new(divisor_at.offset(), next.offset()),
                    "the right operand of '/' must not be zero"
                ));
            } else {
                // Rust integer division already truncates toward zero.
                result.checked_div(operand)
            };
            result = combined.ok_or_else(|| self.overflow(start, next))?;
            trace!(op = %char::from(op), operand, result, "applied");
            at = next;
        }

        Ok((result, at))
    }

    fn primary(&self, at: Cursor, depth: usize) -> Parsed<i64> {
        let start = at;
        let (negative, at) = match at.peek(self.text) {
            Some(b'-') => (true, at.advance(1)),
            _ => (false, at),
        };

        let (magnitude, at) = match at.peek(self.text) {
            Some(b'(') => self.group(at, depth)?,
            Some(b'0'..=b'9') => self.literal(at)?,
            _ if self.options.is_strict() => {
                return Err(err_ctx!(
                    MissingOperand,
                    &self.source,
                    at.span(self.text),
                    "expected a number, '-' or '(' here"
                ));
            }
            // Legacy behaviour: an absent operand reads as zero.
            _ => (0, at),
        };

        if negative {
            let value = magnitude
                .checked_neg()
                .ok_or_else(|| self.overflow(start, at))?;
            Ok((value, at))
        } else {
            Ok((magnitude, at))
        }
    }

    fn group(&self, open: Cursor, depth: usize) -> Parsed<i64> {
        if depth >= self.options.max_depth {
            return Err(err_ctx!(
                RecursionLimit {
                    limit: self.options.max_depth
                },
                &self.source,
                open.span(self.text)
            ));
        }

        let (value, at) = self.expression(open.advance(1), depth + 1)?;
        match at.peek(self.text) {
            Some(b')') => Ok((value, at.advance(1))),
            _ if self.options.is_strict() => Err(err_ctx!(
                UnbalancedParenthesis,
                &self.source,
                open.span(self.text),
                "this '(' is never closed"
            )),
            // Legacy behaviour: whatever sits where ')' belongs is skipped.
            _ => Ok((value, at.skip_one(self.text))),
        }
    }

    fn literal(&self, start: Cursor) -> Parsed<i64> {
        let mut at = start;
        let mut value: i64 = 0;

        while let Some(digit @ b'0'..=b'9') = at.peek(self.text) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(digit - b'0')))
                .ok_or_else(|| self.overflow(start, at.advance(1)))?;
            at = at.advance(1);
        }

        Ok((value, at))
    }

    fn overflow(&self, from: Cursor, to: Cursor) -> TallyError {
        let end = to.offset().min(self.text.len());
        err_ctx!(
            Overflow,
            &self.source,
            Span::new(from.offset(), end),
            "values are limited to 64-bit signed integers"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(text: &str) -> Evaluator<'_> {
        Evaluator::new(text, EvalOptions::lenient())
    }

    fn strict(text: &str) -> Evaluator<'_> {
        Evaluator::new(text, EvalOptions::strict())
    }

    fn natural(text: &str) -> i64 {
        lenient(text).get_natural(Cursor::start()).unwrap().0
    }

    #[test]
    fn get_natural_reads_signed_literals_and_groups() {
        assert_eq!(natural("-1"), -1);
        assert_eq!(natural("8.0"), 8);
        assert_eq!(natural("2f"), 2);
        assert_eq!(natural("xf"), 0);
        assert_eq!(natural("(1)"), 1);
        assert_eq!(natural("(1+1)"), 2);
        assert_eq!(natural("((-1)+1)"), 0);
    }

    #[test]
    fn get_natural_stops_after_the_literal() {
        let (value, at) = strict("123+4").get_natural(Cursor::start()).unwrap();
        assert_eq!(value, 123);
        assert_eq!(at, Cursor::new(3));

        let (value, at) = strict("-(2)*3").get_natural(Cursor::start()).unwrap();
        assert_eq!(value, -2);
        assert_eq!(at, Cursor::new(4));
    }

    #[test]
    fn get_natural_starts_at_the_given_cursor() {
        let (value, at) = strict("1+23").get_natural(Cursor::new(2)).unwrap();
        assert_eq!(value, 23);
        assert_eq!(at, Cursor::new(4));
    }

    #[test]
    fn evaluate_term_chains_products_and_quotients() {
        let term = |text| lenient(text).evaluate_term(Cursor::start()).unwrap().0;
        assert_eq!(term("1*2"), 2);
        assert_eq!(term("-3*4"), -12);
        assert_eq!(term("-1*-4"), 4);
        assert_eq!(term("0*-4"), 0);
        assert_eq!(term("7/2"), 3);
        assert_eq!(term("-7/2"), -3);
        assert_eq!(term("2*3+1"), 6);
    }

    #[test]
    fn evaluate_expression_respects_precedence() {
        let expr = |text| lenient(text).evaluate_expression(Cursor::start()).unwrap().0;
        assert_eq!(expr("1+2"), 3);
        assert_eq!(expr("3+2*1"), 5);
        assert_eq!(expr("1*4+2"), 6);
        assert_eq!(expr("4*4-3*2"), 10);
        assert_eq!(expr("0*4-3*2+1"), -5);
        assert_eq!(expr("10-2-3"), 5);
    }

    #[test]
    fn division_by_zero_points_at_the_divisor() {
        let err = strict("8/(2-2)").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::DivisionByZero { .. }));
        assert_eq!(err.span(), Some(Span::new(2, 7)));

        // An empty divisor reads as zero in lenient mode.
        let err = lenient("4/").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::DivisionByZero { .. }));
    }

    #[test]
    fn strict_mode_reports_structural_problems() {
        let err = strict("(1+2").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::UnbalancedParenthesis { .. }));
        assert_eq!(err.span(), Some(Span::new(0, 1)));

        let err = strict("1+2)").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::UnbalancedParenthesis { .. }));
        assert_eq!(err.span(), Some(Span::new(3, 4)));

        let err = strict("1+").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::MissingOperand { .. }));
        assert_eq!(err.span(), Some(Span::new(2, 2)));

        let err = strict("(1)2").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::TrailingInput { .. }));
        assert_eq!(err.span(), Some(Span::new(3, 4)));
    }

    #[test]
    fn lenient_mode_keeps_legacy_fallbacks() {
        assert_eq!(lenient("(1*(-1+2*1)/3").evaluate().unwrap(), 0);
        assert_eq!(lenient("1+2)").evaluate().unwrap(), 3);
        assert_eq!(lenient("").evaluate().unwrap(), 0);
        assert_eq!(lenient("(2").evaluate().unwrap(), 2);
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let err = strict("9223372036854775807+1").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::Overflow { .. }));

        let err = strict("99999999999999999999").evaluate().unwrap_err();
        assert!(matches!(err, TallyError::Overflow { .. }));

        assert_eq!(
            strict("9223372036854775807").evaluate().unwrap(),
            i64::MAX
        );
    }

    #[test]
    fn nesting_is_bounded() {
        let options = EvalOptions {
            max_depth: 3,
            ..EvalOptions::strict()
        };
        assert_eq!(Evaluator::new("(((1)))", options).evaluate().unwrap(), 1);

        let err = Evaluator::new("((((1))))", options).evaluate().unwrap_err();
        assert!(matches!(err, TallyError::RecursionLimit { limit: 3, .. }));
        assert_eq!(err.span(), Some(Span::new(3, 4)));
    }
}
