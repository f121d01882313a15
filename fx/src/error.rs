//! FX engine error types.

use ratepair_common::{ConverterError, CurrencyPair};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the FX engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    /// No successful rate snapshot is held yet.
    #[error("Rates not loaded")]
    RatesNotLoaded,

    /// A field value could not be parsed as a decimal.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A rate was zero or negative.
    #[error("Invalid {subject}: {rate}")]
    InvalidRate { subject: String, rate: Decimal },

    /// Rate not available for the requested currency pair.
    #[error("Rate not available for {0}")]
    RateNotAvailable(CurrencyPair),

    /// Provider returned an error.
    #[error("Rate provider error: {0}")]
    ProviderError(String),

    /// Provider did not answer in time.
    #[error("Rate fetch timed out after {0}ms")]
    Timeout(u64),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

impl From<FxError> for ConverterError {
    fn from(err: FxError) -> Self {
        match err {
            FxError::RatesNotLoaded | FxError::RateNotAvailable(_) => {
                ConverterError::RatesUnavailable
            }
            FxError::InvalidAmount(value) => ConverterError::InvalidInput {
                message: format!("not a decimal: {value}"),
                field: "amount".to_string(),
            },
            e @ FxError::InvalidRate { .. } => ConverterError::InvalidRate(e.to_string()),
            FxError::ProviderError(msg) => ConverterError::RateProvider(msg),
            e @ FxError::Timeout(_) => ConverterError::Timeout(e.to_string()),
        }
    }
}
