//! Tally REPL (Read-Eval-Print Loop)
//!
//! Evaluates one expression per line. A line that leaves a parenthesis open
//! continues on the next one; an empty line evaluates whatever is pending.

use std::io::{self, BufRead, Write};

use crate::{
    diagnostics::to_error_source,
    engine::{print_error, ExecutionPipeline},
    err_ctx,
    syntax::{Span, Strictness},
    TallyError,
};

const PROMPT: &str = "tally> ";
const CONTINUATION_PROMPT: &str = "   ... ";

/// REPL state that persists across lines.
pub struct ReplState {
    pipeline: ExecutionPipeline,
    line_number: usize,
}

impl ReplState {
    pub fn new(pipeline: ExecutionPipeline) -> Self {
        Self {
            pipeline,
            line_number: 1,
        }
    }

    pub fn strictness(&self) -> Strictness {
        self.pipeline.config().strictness
    }

    fn next_source_name(&mut self) -> String {
        let name = format!("<repl:{}>", self.line_number);
        self.line_number += 1;
        name
    }

    /// Evaluates one complete expression, naming it after its input number.
    pub fn eval_line(&mut self, input: &str) -> Result<i64, TallyError> {
        let source_name = self.next_source_name();
        self.pipeline.evaluate_line(&source_name, input)
    }

    /// Evaluates an expression gathered across continuation lines.
    ///
    /// A number may not run on from one line into the next: `(1` followed by
    /// `2)` is two operands, not `(12)`.
    fn eval_pending(&mut self, pending: &Pending) -> Result<i64, TallyError> {
        let Some(at) = pending.split_literal() else {
            return self.eval_line(&pending.text);
        };

        let source = to_error_source(&self.next_source_name(), &pending.text);
        let end = pending.text[at..]
            .find(|c: char| !c.is_ascii_digit())
            .map_or(pending.text.len(), |n| at + n);
        Err(err_ctx!(
            TrailingInput,
            &source,
            Span::new(at, end),
            "numbers on separate lines need an operator between them"
        ))
    }

    /// Drives a session over arbitrary streams. Values are written to `out`,
    /// diagnostics to stderr. Prompts are shown only when `interactive`.
    pub fn run_session<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        out: &mut W,
        interactive: bool,
    ) -> io::Result<()> {
        let mut pending = Pending::default();

        loop {
            if interactive {
                let prompt = if pending.is_empty() {
                    PROMPT
                } else {
                    CONTINUATION_PROMPT
                };
                write!(out, "{prompt}")?;
                out.flush()?;
            }

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                if !pending.is_empty() {
                    self.report(&pending, out)?;
                }
                break;
            }
            let line = line.trim();

            // Commands are honoured mid-expression; the pending text is kept.
            if line.starts_with(':') {
                match self.handle_command(line, out)? {
                    ReplCommand::Continue => continue,
                    ReplCommand::Quit => break,
                }
            }

            if line.is_empty() {
                if !pending.is_empty() {
                    self.report(&pending, out)?;
                    pending.clear();
                }
                continue;
            }

            pending.push(line);
            if open_groups(&pending.text) <= 0 {
                self.report(&pending, out)?;
                pending.clear();
            }
        }

        Ok(())
    }

    fn report<W: Write>(&mut self, pending: &Pending, out: &mut W) -> io::Result<()> {
        match self.eval_pending(pending) {
            Ok(value) => writeln!(out, "{value}"),
            Err(e) => {
                print_error(e);
                Ok(())
            }
        }
    }

    /// Handles special commands that start with ':'.
    fn handle_command<W: Write>(&mut self, command: &str, out: &mut W) -> io::Result<ReplCommand> {
        let mut words = command.split_whitespace();
        match (words.next().map(str::to_ascii_lowercase).as_deref(), words.next()) {
            (Some(":help" | ":h"), _) => {
                writeln!(out, "Tally REPL commands:")?;
                writeln!(out, "  :help, :h               Show this help")?;
                writeln!(out, "  :quit, :q               Exit the REPL")?;
                writeln!(out, "  :mode [strict|lenient]  Show or change how malformed input is treated")?;
                writeln!(out)?;
                writeln!(out, "Enter expressions such as (1+3*(-4))/2 to evaluate them.")?;
            }
            (Some(":quit" | ":q"), _) => return Ok(ReplCommand::Quit),
            (Some(":mode"), None) => writeln!(out, "mode: {}", self.strictness())?,
            (Some(":mode"), Some(mode)) => match mode.parse::<Strictness>() {
                Ok(strictness) => {
                    self.pipeline.set_strictness(strictness);
                    writeln!(out, "mode: {strictness}")?;
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            _ => writeln!(
                out,
                "Unknown command: {command}. Type :help for available commands."
            )?,
        }
        Ok(ReplCommand::Continue)
    }
}

/// Expression text gathered across continuation lines.
#[derive(Debug, Default)]
struct Pending {
    text: String,
    /// Byte offsets where a continuation line was appended.
    joins: Vec<usize>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn push(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.joins.push(self.text.len());
        }
        self.text.push_str(line);
    }

    fn clear(&mut self) {
        self.text.clear();
        self.joins.clear();
    }

    /// First join where a digit run would continue across the line break.
    fn split_literal(&self) -> Option<usize> {
        let bytes = self.text.as_bytes();
        self.joins.iter().copied().find(|&at| {
            at > 0
                && bytes[at - 1].is_ascii_digit()
                && bytes.get(at).is_some_and(u8::is_ascii_digit)
        })
    }
}

/// REPL command results
enum ReplCommand {
    Continue,
    Quit,
}

/// Opening minus closing parentheses in `input`.
fn open_groups(input: &str) -> isize {
    input.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Main REPL entry point on the process's stdin and stdout.
pub fn run_repl(pipeline: ExecutionPipeline) -> Result<(), TallyError> {
    let interactive = atty::is(atty::Stream::Stdin);
    let mut state = ReplState::new(pipeline);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if interactive {
        println!("Tally REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit");
        println!();
    }

    state
        .run_session(stdin.lock(), &mut stdout, interactive)
        .map_err(|e| TallyError::Io {
            message: "REPL input failed".to_string(),
            ctx: Default::default(),
            source: Some(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str) -> String {
        let mut state = ReplState::new(ExecutionPipeline::default());
        let mut out = Vec::new();
        state.run_session(input.as_bytes(), &mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn evaluates_one_expression_per_line() {
        assert_eq!(session("1+2\n4*4-3*2\n"), "3\n10\n");
    }

    #[test]
    fn open_groups_continue_on_the_next_line() {
        assert_eq!(session("(1+3*\n(-4))/2\n"), "-5\n");
        assert_eq!(open_groups("(1+(2"), 2);
        assert_eq!(open_groups("1)"), -1);
    }

    #[test]
    fn numbers_do_not_run_on_across_lines() {
        assert_eq!(session("(1\n2)\n(1+\n2)\n"), "3\n");

        let mut pending = Pending::default();
        pending.push("(1");
        pending.push("23)");
        assert_eq!(pending.split_literal(), Some(2));
        let mut state = ReplState::new(ExecutionPipeline::default());
        let err = state.eval_pending(&pending).unwrap_err();
        assert!(matches!(err, TallyError::TrailingInput { .. }));
        assert_eq!(err.span(), Some(Span::new(2, 4)));
    }

    #[test]
    fn commands_work_while_a_group_is_open() {
        assert_eq!(session("(1+\n:mode\n2)\n"), "mode: strict\n3\n");
        assert_eq!(session("(1+\n:quit\n2)\n"), "");
    }

    #[test]
    fn prompts_are_shown_only_when_interactive() {
        let mut state = ReplState::new(ExecutionPipeline::default());
        let mut out = Vec::new();
        state.run_session("(1+\n2)\n".as_bytes(), &mut out, true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{PROMPT}{CONTINUATION_PROMPT}3\n{PROMPT}")
        );
    }

    #[test]
    fn errors_do_not_end_the_session() {
        assert_eq!(session("1/0\n2/2\n"), "1\n");
    }

    #[test]
    fn mode_command_switches_strictness() {
        let out = session(":mode\n(2\n\n:mode lenient\n(2\n\n:q\n7\n");
        assert_eq!(out, "mode: strict\nmode: lenient\n2\n");
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert!(session(":frobnicate\n").starts_with("Unknown command: :frobnicate."));
    }
}
