//! Simulated bank rate source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use ratepair_common::CurrencyPair;
use ratepair_fx::{FxError, FxResult, RateBook, RateProvider, RateQuote};

/// Faults a scenario can inject into the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FaultType {
    /// Every fetch fails.
    BankOffline,
    /// Every fetch answers after a delay.
    SlowResponse { delay_ms: u64 },
}

/// A bank whose quote and availability the scenario controls.
///
/// Without an explicit quote it defers to an upstream provider, such as a
/// rates file.
pub struct SimulatedBank {
    name: String,
    quote: Mutex<Option<RateQuote>>,
    upstream: Option<Arc<dyn RateProvider>>,
    fault: Mutex<Option<FaultType>>,
    fetches: Mutex<u64>,
}

impl SimulatedBank {
    /// A bank quoting fixed rates.
    pub fn with_quote(name: impl Into<String>, quote: RateQuote) -> Self {
        Self {
            name: name.into(),
            quote: Mutex::new(Some(quote)),
            upstream: None,
            fault: Mutex::new(None),
            fetches: Mutex::new(0),
        }
    }

    /// A bank relaying another provider.
    pub fn with_upstream(name: impl Into<String>, upstream: Arc<dyn RateProvider>) -> Self {
        Self {
            name: name.into(),
            quote: Mutex::new(None),
            upstream: Some(upstream),
            fault: Mutex::new(None),
            fetches: Mutex::new(0),
        }
    }

    pub fn set_quote(&self, quote: RateQuote) {
        *self.quote.lock() = Some(quote);
    }

    pub fn inject_fault(&self, fault: FaultType) {
        *self.fault.lock() = Some(fault);
    }

    pub fn clear_fault(&self) {
        *self.fault.lock() = None;
    }

    /// Number of fetches served so far.
    pub fn fetches(&self) -> u64 {
        *self.fetches.lock()
    }

    /// Count the request and apply any injected fault.
    async fn serve(&self) -> FxResult<()> {
        *self.fetches.lock() += 1;

        let fault = *self.fault.lock();
        match fault {
            Some(FaultType::BankOffline) => {
                debug!(bank = %self.name, "Bank offline");
                Err(FxError::ProviderError(format!("{} is offline", self.name)))
            }
            Some(FaultType::SlowResponse { delay_ms }) => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RateProvider for SimulatedBank {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> FxResult<RateQuote> {
        self.serve().await?;

        let quote = *self.quote.lock();
        match (quote, &self.upstream) {
            (Some(quote), _) => Ok(quote),
            (None, Some(upstream)) => upstream.fetch_rates().await,
            (None, None) => Err(FxError::ProviderError(format!("{} has no rates", self.name))),
        }
    }

    async fn fetch_book(&self, pair: &CurrencyPair) -> FxResult<RateBook> {
        self.serve().await?;

        let quote = *self.quote.lock();
        match (quote, &self.upstream) {
            (Some(quote), _) => RateBook::from_quote(pair, &quote),
            (None, Some(upstream)) => upstream.fetch_book(pair).await,
            (None, None) => Err(FxError::ProviderError(format!("{} has no rates", self.name))),
        }
    }
}
