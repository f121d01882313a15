//! The rate store: latest snapshot, fetch status and staleness.

use chrono::Duration;
use ratepair_common::{constants, is_older_than, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FxError, FxResult};

/// A bank's pair of rates for one currency pair.
///
/// `buy_rate` drives conversions while the base currency is main,
/// `sell_rate` while the quote currency is main.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
}

impl RateQuote {
    /// Create a quote, rejecting rates that are not strictly positive.
    pub fn new(buy_rate: Decimal, sell_rate: Decimal) -> FxResult<Self> {
        let quote = Self {
            buy_rate,
            sell_rate,
        };
        quote.check()?;
        Ok(quote)
    }

    /// Ensure both rates are usable as multipliers and divisors.
    pub fn check(&self) -> FxResult<()> {
        for (name, rate) in [("buy rate", self.buy_rate), ("sell rate", self.sell_rate)] {
            if rate <= Decimal::ZERO {
                return Err(FxError::InvalidRate {
                    subject: name.to_string(),
                    rate,
                });
            }
        }
        Ok(())
    }
}

/// A successfully fetched quote and when it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub quote: RateQuote,
    pub fetched_at: Timestamp,
}

/// Result of one rate fetch, as delivered to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A fetch has started.
    Loading,
    /// A fetch completed with fresh rates.
    Success {
        buy_rate: Decimal,
        sell_rate: Decimal,
        fetched_at: Timestamp,
    },
    /// A fetch failed.
    Failure { message: String },
}

impl FetchOutcome {
    pub fn success(buy_rate: Decimal, sell_rate: Decimal, fetched_at: Timestamp) -> Self {
        FetchOutcome::Success {
            buy_rate,
            sell_rate,
            fetched_at,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        FetchOutcome::Failure {
            message: message.into(),
        }
    }

    /// Build the outcome of a provider call completed at `fetched_at`.
    pub fn from_fetch(result: FxResult<RateQuote>, fetched_at: Timestamp) -> Self {
        match result {
            Ok(quote) => Self::success(quote.buy_rate, quote.sell_rate, fetched_at),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// When a snapshot counts as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    threshold: Duration,
}

impl StalenessPolicy {
    /// Stale after three hours.
    pub fn corrected() -> Self {
        Self::with_threshold(constants::rate_staleness_threshold())
    }

    /// Stale after 18 minutes, the threshold the widget historically used.
    pub fn legacy() -> Self {
        Self::with_threshold(constants::legacy_rate_staleness_threshold())
    }

    pub fn with_threshold(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Check whether rates fetched at `fetched_at` are stale at `now`.
    pub fn is_stale(&self, fetched_at: Timestamp, now: Timestamp) -> bool {
        is_older_than(fetched_at, now, self.threshold)
    }
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::corrected()
    }
}

/// Latest rate snapshot plus fetch status.
///
/// Only fetch outcomes change the store. A failure keeps the previous
/// snapshot so callers can keep converting with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateStore {
    snapshot: Option<RateSnapshot>,
    loading: bool,
    error: Option<String>,
}

impl RateStore {
    /// An empty store waiting for its first fetch.
    pub fn new() -> Self {
        Self {
            snapshot: None,
            loading: true,
            error: None,
        }
    }

    /// Fold a fetch outcome into the store.
    pub fn apply(mut self, outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Loading => {
                self.loading = true;
                self.error = None;
            }
            FetchOutcome::Success {
                buy_rate,
                sell_rate,
                fetched_at,
            } => {
                self.loading = false;
                match RateQuote::new(buy_rate, sell_rate) {
                    Ok(quote) => {
                        info!(%buy_rate, %sell_rate, %fetched_at, "Rates updated");
                        self.snapshot = Some(RateSnapshot { quote, fetched_at });
                        self.error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "Discarding fetched rates");
                        self.error = Some(e.to_string());
                    }
                }
            }
            FetchOutcome::Failure { message } => {
                warn!(
                    error = %message,
                    has_snapshot = self.snapshot.is_some(),
                    "Rate fetch failed"
                );
                self.loading = false;
                self.error = Some(message);
            }
        }
        self
    }

    /// Check whether the snapshot needs refreshing. An empty store is stale.
    pub fn is_stale(&self, now: Timestamp, policy: &StalenessPolicy) -> bool {
        match &self.snapshot {
            Some(snapshot) => {
                let stale = policy.is_stale(snapshot.fetched_at, now);
                if stale {
                    debug!(fetched_at = %snapshot.fetched_at, "Rates are stale");
                }
                stale
            }
            None => true,
        }
    }

    /// The current quote, or `RatesNotLoaded`.
    pub fn quote(&self) -> FxResult<RateQuote> {
        self.snapshot
            .map(|s| s.quote)
            .ok_or(FxError::RatesNotLoaded)
    }

    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn buy_rate(&self) -> Option<Decimal> {
        self.snapshot.map(|s| s.quote.buy_rate)
    }

    pub fn sell_rate(&self) -> Option<Decimal> {
        self.snapshot.map(|s| s.quote.sell_rate)
    }

    pub fn fetched_at(&self) -> Option<Timestamp> {
        self.snapshot.map(|s| s.fetched_at)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new()
    }
}
