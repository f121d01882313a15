//! Keystroke validation for the amount fields.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Longest raw input accepted into a field.
pub const MAX_INPUT_LEN: usize = 16;

/// Digits, an optional point, then at most four fractional digits.
static AMOUNT_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.?[0-9]{0,4}$").expect("amount grammar is a valid regex"));

/// A leftover placeholder zero followed by one freshly typed digit.
static PLACEHOLDER_ZERO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[0-9]$").expect("placeholder grammar is a valid regex"));

/// Why a raw field value was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputRejection {
    #[error("input is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("not a decimal amount: {0:?}")]
    Malformed(String),
}

/// Validates raw field text into canonical decimal strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputValidator {
    max_len: usize,
}

impl InputValidator {
    /// Create a validator with a custom length guard.
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Accept or reject the full text a field would hold after a keystroke.
    ///
    /// Empty text is accepted and clears the field. `"05"` becomes `"5"`:
    /// a digit typed after a lone zero replaces it.
    pub fn validate(&self, raw: &str) -> Result<String, InputRejection> {
        if raw.is_empty() {
            return Ok(String::new());
        }

        let len = raw.chars().count();
        if len > self.max_len {
            debug!(len, max = self.max_len, "Input rejected: too long");
            return Err(InputRejection::TooLong {
                len,
                max: self.max_len,
            });
        }

        if !AMOUNT_GRAMMAR.is_match(raw) {
            debug!(raw, "Input rejected: malformed");
            return Err(InputRejection::Malformed(raw.to_string()));
        }

        if PLACEHOLDER_ZERO.is_match(raw) {
            return Ok(raw[1..].to_string());
        }

        Ok(raw.to_string())
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(MAX_INPUT_LEN)
    }
}

/// Validate with the default length guard.
pub fn validate(raw: &str) -> Result<String, InputRejection> {
    InputValidator::default().validate(raw)
}
