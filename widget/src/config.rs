//! Widget configuration.

use std::str::FromStr;
use std::time::Duration;

use ratepair_common::{constants, Currency, CurrencyPair, DurationExt, MainCurrency};
use ratepair_fx::input::MAX_INPUT_LEN;
use ratepair_fx::{InputValidator, StalenessPolicy};

/// Which staleness threshold to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalenessMode {
    /// Three hours.
    #[default]
    Corrected,
    /// 18 minutes, the threshold older releases used.
    Legacy,
}

impl FromStr for StalenessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corrected" => Ok(StalenessMode::Corrected),
            "legacy" => Ok(StalenessMode::Legacy),
            other => Err(format!("unknown staleness mode: {other}")),
        }
    }
}

/// Main widget configuration.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Currency pair shown by the widget.
    pub pair: CurrencyPair,
    /// Main currency on startup.
    pub default_main: MainCurrency,
    /// Longest raw text a field accepts.
    pub max_input_len: usize,
    /// Staleness threshold selection.
    pub staleness: StalenessMode,
    /// Explicit threshold, overriding `staleness`.
    pub staleness_override: Option<Duration>,
    /// Upper bound on a single rate fetch.
    pub fetch_timeout: Duration,
    /// Log level.
    pub log_level: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            pair: CurrencyPair::default(),
            default_main: MainCurrency::Base,
            max_input_len: MAX_INPUT_LEN,
            staleness: StalenessMode::Corrected,
            staleness_override: None,
            fetch_timeout: constants::rate_fetch_timeout().as_std(),
            log_level: "info".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("RATEPAIR_BASE") {
            config.pair.base = Currency::new(base);
        }

        if let Ok(quote) = std::env::var("RATEPAIR_QUOTE") {
            config.pair.quote = Currency::new(quote);
        }

        if let Ok(main) = std::env::var("RATEPAIR_MAIN") {
            if let Ok(main) = main.parse() {
                config.default_main = main;
            }
        }

        if let Ok(len) = std::env::var("RATEPAIR_MAX_INPUT_LEN") {
            if let Ok(len) = len.parse() {
                config.max_input_len = len;
            }
        }

        if let Ok(mode) = std::env::var("RATEPAIR_STALENESS") {
            if let Ok(mode) = mode.parse() {
                config.staleness = mode;
            }
        }

        if let Ok(ms) = std::env::var("RATEPAIR_STALENESS_MS") {
            if let Ok(ms) = ms.parse() {
                config.staleness_override = Some(Duration::from_millis(ms));
            }
        }

        if let Ok(ms) = std::env::var("RATEPAIR_FETCH_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.fetch_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.pair.base.code().is_empty() || self.pair.quote.code().is_empty() {
            return Err("Currency codes cannot be empty".to_string());
        }

        if self.pair.base == self.pair.quote {
            return Err(format!("Pair {} converts a currency into itself", self.pair));
        }

        if self.max_input_len == 0 {
            return Err("Max input length cannot be 0".to_string());
        }

        if self.staleness_override.is_some_and(|d| d.is_zero()) {
            return Err("Staleness threshold cannot be zero".to_string());
        }

        if self.fetch_timeout.is_zero() {
            return Err("Fetch timeout cannot be zero".to_string());
        }

        Ok(())
    }

    /// The staleness policy this configuration selects.
    pub fn staleness_policy(&self) -> StalenessPolicy {
        if let Some(threshold) = self.staleness_override {
            if let Ok(threshold) = chrono::Duration::from_std(threshold) {
                return StalenessPolicy::with_threshold(threshold);
            }
        }

        match self.staleness {
            StalenessMode::Corrected => StalenessPolicy::corrected(),
            StalenessMode::Legacy => StalenessPolicy::legacy(),
        }
    }

    pub fn validator(&self) -> InputValidator {
        InputValidator::new(self.max_input_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WidgetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pair.to_string(), "USD/BYN");
        assert_eq!(config.validator().max_len(), 16);
        assert_eq!(config.staleness_policy(), StalenessPolicy::corrected());
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = WidgetConfig::default();
        config.pair.quote = Currency::usd();
        assert!(config.validate().is_err());

        let mut config = WidgetConfig::default();
        config.max_input_len = 0;
        assert!(config.validate().is_err());

        let mut config = WidgetConfig::default();
        config.staleness_override = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_staleness_selection() {
        let mut config = WidgetConfig {
            staleness: StalenessMode::Legacy,
            ..Default::default()
        };
        assert_eq!(config.staleness_policy(), StalenessPolicy::legacy());

        config.staleness_override = Some(Duration::from_secs(60));
        assert_eq!(
            config.staleness_policy().threshold(),
            chrono::Duration::seconds(60)
        );
    }

    #[test]
    fn test_staleness_mode_parse() {
        assert_eq!("LEGACY".parse::<StalenessMode>(), Ok(StalenessMode::Legacy));
        assert!("fresh".parse::<StalenessMode>().is_err());
    }
}
