//! Error types for RatePair.

use thiserror::Error;

/// Main error type for RatePair operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConverterError {
    /// Raw input failed the numeric grammar or the length guard.
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { message: String, field: String },

    /// No rate snapshot has ever loaded; the converter is disabled.
    #[error("Converter temporarily unavailable")]
    RatesUnavailable,

    /// Rate provider failed.
    #[error("Rate provider error: {0}")]
    RateProvider(String),

    /// A rate could not be used for arithmetic.
    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// Timeout.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ConverterError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConverterError::RatesUnavailable
                | ConverterError::RateProvider(_)
                | ConverterError::Timeout(_)
        )
    }

    /// Get suggested retry delay in milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ConverterError::RatesUnavailable => Some(1000),
            ConverterError::RateProvider(_) => Some(500),
            ConverterError::Timeout(_) => Some(1000),
            _ => None,
        }
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConverterError::InvalidInput { .. } => "INVALID_INPUT",
            ConverterError::RatesUnavailable => "RATES_UNAVAILABLE",
            ConverterError::RateProvider(_) => "RATE_PROVIDER_ERROR",
            ConverterError::InvalidRate(_) => "INVALID_RATE",
            ConverterError::Timeout(_) => "TIMEOUT",
            ConverterError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type alias for RatePair operations.
pub type Result<T> = std::result::Result<T, ConverterError>;
