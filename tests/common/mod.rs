//! Shared helpers for the integration tests.

#![allow(dead_code)]

use tally::{calculate, calculate_with, EvalOptions, TallyError};

pub fn value_of(text: &str) -> i64 {
    calculate(text).unwrap_or_else(|e| panic!("'{text}' failed: {e}"))
}

pub fn lenient_value_of(text: &str) -> i64 {
    calculate_with(text, &EvalOptions::lenient())
        .unwrap_or_else(|e| panic!("'{text}' failed in lenient mode: {e}"))
}

pub fn error_of(text: &str) -> TallyError {
    match calculate(text) {
        Ok(value) => panic!("'{text}' evaluated to {value} but was expected to fail"),
        Err(e) => e,
    }
}
