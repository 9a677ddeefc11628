//! Character-level validation run before any evaluation.

use crate::{
    diagnostics::SourceArc,
    err_ctx,
    syntax::{Span, Strictness},
    TallyError,
};

const ALPHABET_HELP: &str = "only digits 0-9, + - * / and parentheses are allowed";

/// Returns true for every character the grammar can consume.
pub fn is_grammar_char(c: char) -> bool {
    matches!(c, '0'..='9' | '+' | '-' | '*' | '/' | '(' | ')')
}

/// Strips a single trailing line terminator (`\n` or `\r\n`).
pub fn strip_terminator(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Fails with `InvalidCharacter` on the first character outside the grammar.
///
/// `Strict` checks every character of `text`, which the caller has already
/// stripped of its terminator. `Lenient` keeps the legacy rule and skips the
/// final character unconditionally.
pub fn validate(text: &str, strictness: Strictness, source: &SourceArc) -> Result<(), TallyError> {
    let checked = match strictness {
        Strictness::Strict => text,
        Strictness::Lenient => match text.char_indices().last() {
            Some((last, _)) => &text[..last],
            None => text,
        },
    };

    match checked.char_indices().find(|&(_, c)| !is_grammar_char(c)) {
        Some((offset, found)) => Err(err_ctx!(
            InvalidCharacter { found: found },
            source,
            Span::new(offset, offset + found.len_utf8()),
            ALPHABET_HELP
        )),
        None => Ok(()),
    }
}
