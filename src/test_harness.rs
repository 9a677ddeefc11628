//! Expectation harness for expression suites.
//!
//! Cases are written in YAML:
//! ```yaml
//! - name: "precedence"
//!   input: "3+2*1"
//!   expected: 5
//! - name: "zero divisor"
//!   input: "1/(2-2)"
//!   expect_error: division_by_zero    # a diagnostic code suffix
//! - name: "legacy unclosed group"
//!   input: "(1*(-1+2*1)/3"
//!   strictness: lenient               # optional, overrides the engine mode
//!   expected: 0
//!   skip: false                       # optional, defaults to false
//! ```
//!
//! With no file, [`builtin_cases`] supplies a self-check suite.

use std::path::Path;

use serde::Deserialize;

use crate::{
    engine::ExecutionPipeline,
    syntax::{EvalOptions, Strictness},
    TallyError,
};

/// One expectation: an input and either its value or the error it raises.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    #[serde(default)]
    pub expected: Option<i64>,
    #[serde(default)]
    pub expect_error: Option<String>,
    #[serde(default)]
    pub strictness: Option<Strictness>,
    #[serde(default)]
    pub skip: bool,
}

impl TestCase {
    fn expect_value(name: &str, input: &str, expected: i64) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            expected: Some(expected),
            expect_error: None,
            strictness: Some(Strictness::Strict),
            skip: false,
        }
    }

    fn expect_error(name: &str, input: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            expected: None,
            expect_error: Some(code.to_string()),
            strictness: Some(Strictness::Strict),
            skip: false,
        }
    }

    fn lenient(mut self) -> Self {
        self.strictness = Some(Strictness::Lenient);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Pass { name: String },
    Fail { name: String, reason: String },
    Skip { name: String },
}

impl TestResult {
    pub fn name(&self) -> &str {
        match self {
            TestResult::Pass { name } | TestResult::Fail { name, .. } | TestResult::Skip { name } => {
                name
            }
        }
    }
}

/// Outcome of a whole suite.
#[derive(Debug, Default, Clone)]
pub struct TestReport {
    pub results: Vec<TestResult>,
}

impl TestReport {
    pub fn passed(&self) -> usize {
        self.count(|r| matches!(r, TestResult::Pass { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, TestResult::Fail { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, TestResult::Skip { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&TestResult) -> bool) -> usize {
        self.results.iter().filter(|r| pred(r)).count()
    }
}

/// Loads a YAML list of cases.
pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>, TallyError> {
    let content = ExecutionPipeline::read_file(path)?;
    parse_test_cases(&content).map_err(|e| match e {
        TallyError::Config {
            message, source, ..
        } => TallyError::Config {
            message: format!("{}: {message}", path.display()),
            ctx: Default::default(),
            source,
        },
        other => other,
    })
}

pub fn parse_test_cases(content: &str) -> Result<Vec<TestCase>, TallyError> {
    let cases: Vec<TestCase> =
        serde_yaml::from_str(content).map_err(|e| TallyError::Config {
            message: format!("invalid test suite: {e}"),
            ctx: Default::default(),
            source: Some(Box::new(e)),
        })?;

    for case in &cases {
        if case.expected.is_some() == case.expect_error.is_some() {
            return Err(crate::err_msg!(
                Config,
                "case '{}' must set exactly one of 'expected' or 'expect_error'",
                case.name
            ));
        }
    }
    Ok(cases)
}

/// Runs one case against the pipeline's settings.
pub fn run_test_case(pipeline: &ExecutionPipeline, case: &TestCase) -> TestResult {
    let name = case.name.clone();
    if case.skip {
        return TestResult::Skip { name };
    }

    let options = EvalOptions {
        strictness: case.strictness.unwrap_or(pipeline.config().strictness),
        ..pipeline.eval_options()
    };

    match (
        pipeline.evaluate_with(&case.name, &case.input, &options),
        &case.expected,
        &case.expect_error,
    ) {
        (Ok(actual), Some(expected), _) if actual == *expected => TestResult::Pass { name },
        (Ok(actual), Some(expected), _) => TestResult::Fail {
            name,
            reason: format!("expected {expected}, got {actual}"),
        },
        (Ok(actual), None, Some(code)) => TestResult::Fail {
            name,
            reason: format!("expected error '{code}', got {actual}"),
        },
        (Err(e), _, Some(code)) if e.code_suffix() == code.as_str() => TestResult::Pass { name },
        (Err(e), _, Some(code)) => TestResult::Fail {
            name,
            reason: format!("expected error '{code}', got '{}'", e.code_suffix()),
        },
        (Err(e), _, None) => TestResult::Fail {
            name,
            reason: format!("unexpected error: {e}"),
        },
        (Ok(actual), None, None) => TestResult::Fail {
            name,
            reason: format!("case has no expectation (evaluated to {actual})"),
        },
    }
}

pub fn run_test_cases(pipeline: &ExecutionPipeline, cases: &[TestCase]) -> TestReport {
    TestReport {
        results: cases
            .iter()
            .map(|case| run_test_case(pipeline, case))
            .collect(),
    }
}

/// Self-check suite covering precedence, signs, grouping and both modes.
///
/// Every case pins its own mode, so the suite passes whatever the engine's.
pub fn builtin_cases() -> Vec<TestCase> {
    vec![
        TestCase::expect_value("addition", "1+2", 3),
        TestCase::expect_value("product binds tighter", "3+2*1", 5),
        TestCase::expect_value("product then sum", "1*4+2", 6),
        TestCase::expect_value("difference of products", "4*4-3*2", 10),
        TestCase::expect_value("leading zero product", "0*4-3*2+1", -5),
        TestCase::expect_value("unary minus on both sides", "-1*-4", 4),
        TestCase::expect_value("truncating division", "7/2", 3),
        TestCase::expect_value("truncating negative division", "-7/2", -3),
        TestCase::expect_value("self division", "2/2", 1),
        TestCase::expect_value("grouped divisor", "1+2/(1*3)-2", -1),
        TestCase::expect_value("nested groups", "(1+3*(-4))/2", -5),
        TestCase::expect_value("mixed chain", "(1*(-2))*(-2)-1*(2+4*2)/3+1", 2),
        TestCase::expect_error("zero divisor", "1/0", "division_by_zero"),
        TestCase::expect_error("grouped zero divisor", "1/(2-2)", "division_by_zero"),
        TestCase::expect_error("letters", "1+a", "invalid_character"),
        TestCase::expect_error("whitespace", "1 + 2", "invalid_character"),
        TestCase::expect_error("unclosed group", "(1+2", "unbalanced_parenthesis"),
        TestCase::expect_error("stray close", "1+2)", "unbalanced_parenthesis"),
        TestCase::expect_error("dangling operator", "1+", "missing_operand"),
        TestCase::expect_error("empty input", "", "missing_operand"),
        TestCase::expect_error("juxtaposed operands", "(1)2", "trailing_input"),
        TestCase::expect_error("too large", "9223372036854775807+1", "overflow"),
        TestCase::expect_value("legacy unclosed group", "(1*(-1+2*1)/3", 0).lenient(),
        TestCase::expect_value("legacy empty input", "", 0).lenient(),
        TestCase::expect_value("legacy trailing text", "1+2)", 3).lenient(),
    ]
}
