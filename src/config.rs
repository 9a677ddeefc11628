//! Engine configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults, an
//! optional YAML file, and command-line flags.
//!
//! ```yaml
//! strictness: lenient
//! max_depth: 64
//! max_input_len: 100
//! prompt: "> "
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::{
    err_msg,
    syntax::{EvalOptions, Strictness, DEFAULT_MAX_DEPTH},
    TallyError,
};

/// Longest accepted input line, in bytes.
pub const DEFAULT_MAX_INPUT_LEN: usize = 100;

pub const DEFAULT_PROMPT: &str = "Enter an arithmetic expression: ";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub strictness: Strictness,
    pub max_depth: usize,
    pub max_input_len: usize,
    /// Printed before the single expression read when no subcommand is
    /// given. The REPL keeps its own `tally> ` prompt.
    pub prompt: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::Strict,
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, TallyError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| TallyError::Config {
            message: format!("invalid configuration: {e}"),
            ctx: Default::default(),
            source: Some(Box::new(e)),
        })?;
        config.validated()
    }

    pub fn load(path: &Path) -> Result<Self, TallyError> {
        let text = std::fs::read_to_string(path).map_err(|e| TallyError::Io {
            message: format!("failed to read config file '{}'", path.display()),
            ctx: Default::default(),
            source: Some(e),
        })?;
        Self::from_yaml(&text)
    }

    /// Rejects settings the engine cannot honour.
    pub fn validated(self) -> Result<Self, TallyError> {
        if self.max_depth == 0 {
            return Err(err_msg!(Config, "max_depth must be at least 1"));
        }
        if self.max_input_len == 0 {
            return Err(err_msg!(Config, "max_input_len must be at least 1"));
        }
        Ok(self)
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            strictness: self.strictness,
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.eval_options(), EvalOptions::strict());
    }

    #[test]
    fn partial_documents_override_only_their_keys() {
        let config = EngineConfig::from_yaml("strictness: lenient\nmax_depth: 8\n").unwrap();
        assert_eq!(config.strictness, Strictness::Lenient);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_input_len, DEFAULT_MAX_INPUT_LEN);
        assert_eq!(config.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml("colour: always"),
            Err(TallyError::Config { .. })
        ));
        assert!(matches!(
            EngineConfig::from_yaml("strictness: sloppy"),
            Err(TallyError::Config { .. })
        ));
        assert!(matches!(
            EngineConfig::from_yaml("max_depth: 0"),
            Err(TallyError::Config { .. })
        ));
    }
}
