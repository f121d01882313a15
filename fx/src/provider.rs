//! Rate provider trait and implementations.

use std::path::PathBuf;

use async_trait::async_trait;
use ratepair_common::{Currency, CurrencyPair};
use tracing::debug;

use crate::book::RateBook;
use crate::error::{FxError, FxResult};
use crate::rates::RateQuote;

/// Source of buy/sell rates for the configured currency pair.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current quote.
    async fn fetch_rates(&self) -> FxResult<RateQuote>;

    /// Fetch every rate the source publishes.
    ///
    /// Sources that only know one pair answer with the two directions of
    /// `pair`.
    async fn fetch_book(&self, pair: &CurrencyPair) -> FxResult<RateBook> {
        let quote = self.fetch_rates().await?;
        RateBook::from_quote(pair, &quote)
    }
}

/// Always answers with the same quote.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    name: String,
    quote: RateQuote,
}

impl StaticRateProvider {
    pub fn new(name: impl Into<String>, quote: RateQuote) -> Self {
        Self {
            name: name.into(),
            quote,
        }
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> FxResult<RateQuote> {
        Ok(self.quote)
    }
}

/// Reads rates from a JSON file on every fetch.
///
/// The file holds either a single quote, `{ "buy_rate": "2.5", "sell_rate": "2.4" }`,
/// or a bank rate document with keys like `USD_in` and `USD_EUR_out`
/// (see [`RateBook::from_bank_document`]).
#[derive(Debug, Clone)]
pub struct JsonFileRateProvider {
    path: PathBuf,
    pair: CurrencyPair,
    home: Currency,
}

impl JsonFileRateProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let pair = CurrencyPair::default();
        Self {
            path: path.into(),
            home: pair.quote.clone(),
            pair,
        }
    }

    /// Quote `pair` from a bank document.
    pub fn with_pair(mut self, pair: CurrencyPair) -> Self {
        self.pair = pair;
        self
    }

    /// Currency that single-code bank keys (`USD_in`) are quoted against.
    pub fn with_home(mut self, home: Currency) -> Self {
        self.home = home;
        self
    }

    /// Parse a quote document.
    pub fn parse(contents: &str) -> FxResult<RateQuote> {
        let quote: RateQuote = serde_json::from_str(contents)
            .map_err(|e| FxError::ProviderError(format!("malformed rate document: {e}")))?;
        quote.check()?;
        Ok(quote)
    }

    /// Parse either document shape into a rate book.
    pub fn parse_book(
        contents: &str,
        pair: &CurrencyPair,
        home: &Currency,
    ) -> FxResult<RateBook> {
        match Self::parse(contents) {
            Ok(quote) => RateBook::from_quote(pair, &quote),
            Err(e @ FxError::InvalidRate { .. }) => Err(e),
            Err(_) => RateBook::from_bank_document(contents, home),
        }
    }

    async fn read(&self) -> FxResult<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FxError::ProviderError(format!("cannot read {}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl RateProvider for JsonFileRateProvider {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch_rates(&self) -> FxResult<RateQuote> {
        let quote = self.fetch_book(&self.pair).await?.quote_for(&self.pair)?;
        debug!(
            path = %self.path.display(),
            buy_rate = %quote.buy_rate,
            sell_rate = %quote.sell_rate,
            "Read rates from file"
        );
        Ok(quote)
    }

    async fn fetch_book(&self, pair: &CurrencyPair) -> FxResult<RateBook> {
        let contents = self.read().await?;
        Self::parse_book(&contents, pair, &self.home)
    }
}

#[cfg(any(test, feature = "test-utils"))]
type ScriptedFetch = (std::time::Duration, FxResult<RateQuote>);

/// Mock rate provider for testing.
///
/// Answers queued responses in order, then falls back to a fixed quote
/// (or an error when none is set).
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    script: parking_lot::Mutex<std::collections::VecDeque<ScriptedFetch>>,
    fallback: parking_lot::Mutex<Option<RateQuote>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            fallback: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Answer with `quote` once the script runs out.
    pub fn set_rate(&self, quote: RateQuote) {
        *self.fallback.lock() = Some(quote);
    }

    /// Queue a response.
    pub fn push(&self, result: FxResult<RateQuote>) {
        self.push_delayed(std::time::Duration::ZERO, result);
    }

    /// Queue a response that arrives after `delay`.
    pub fn push_delayed(&self, delay: std::time::Duration, result: FxResult<RateQuote>) {
        self.script.lock().push_back((delay, result));
    }

    /// Number of fetches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> FxResult<RateQuote> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let next = self.script.lock().pop_front();
        match next {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => (*self.fallback.lock())
                .ok_or_else(|| FxError::ProviderError(format!("{} has no rates", self.name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn quote() -> RateQuote {
        RateQuote::new(dec!(2.5), dec!(2.4)).unwrap()
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticRateProvider::new("fixed", quote());
        assert_eq!(provider.name(), "fixed");
        assert_eq!(provider.fetch_rates().await.unwrap(), quote());
    }

    #[tokio::test]
    async fn test_mock_provider_script_then_fallback() {
        let provider = MockRateProvider::new("mock");
        provider.push(Err(FxError::ProviderError("down".into())));
        provider.set_rate(quote());

        assert_err!(provider.fetch_rates().await);
        assert_eq!(assert_ok!(provider.fetch_rates().await), quote());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_provider_without_rates_fails() {
        let provider = MockRateProvider::new("empty");
        let result = provider.fetch_rates().await;
        assert!(matches!(result, Err(FxError::ProviderError(_))));
    }

    #[test]
    fn test_parse_rate_document() {
        let parsed = JsonFileRateProvider::parse(r#"{ "buy_rate": "2.5", "sell_rate": "2.4" }"#);
        assert_eq!(parsed, Ok(quote()));

        let negative = JsonFileRateProvider::parse(r#"{ "buy_rate": "-1", "sell_rate": "2.4" }"#);
        assert!(matches!(negative, Err(FxError::InvalidRate { .. })));

        let garbage = JsonFileRateProvider::parse("not json");
        assert!(matches!(garbage, Err(FxError::ProviderError(_))));
    }

    #[tokio::test]
    async fn test_json_file_provider_reads_file() {
        let path = std::env::temp_dir().join(format!("ratepair-rates-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{ "buy_rate": "2.5", "sell_rate": "2.4" }"#)
            .await
            .unwrap();

        let provider = JsonFileRateProvider::new(path.clone());
        let result = provider.fetch_rates().await;
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(result.unwrap(), quote());
    }

    #[tokio::test]
    async fn test_json_file_provider_reads_bank_document() {
        let path = std::env::temp_dir().join(format!("ratepair-bank-{}.json", std::process::id()));
        let document = r#"[{ "USD_in": "2.5", "USD_out": "2.4", "EUR_in": "2.9", "EUR_out": "2.8",
            "USD_EUR_in": "0.9", "USD_EUR_out": "0.85" }]"#;
        tokio::fs::write(&path, document).await.unwrap();

        let provider = JsonFileRateProvider::new(path.clone());
        let quote_result = provider.fetch_rates().await;
        let book_result = provider.fetch_book(&CurrencyPair::default()).await;

        let eur_provider = JsonFileRateProvider::new(path.clone())
            .with_pair(CurrencyPair::new(Currency::eur(), Currency::byn()));
        let eur_quote = eur_provider.fetch_rates().await;
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(quote_result.unwrap(), quote());
        assert_eq!(eur_quote.unwrap(), RateQuote::new(dec!(2.9), dec!(2.8)).unwrap());

        let book = book_result.unwrap();
        assert_eq!(book.convert("10", &Currency::usd(), &Currency::eur()).unwrap(), "9");
    }

    #[tokio::test]
    async fn test_default_book_covers_one_pair() {
        let provider = StaticRateProvider::new("fixed", quote());
        let book = provider.fetch_book(&CurrencyPair::default()).await.unwrap();

        assert_eq!(book.len(), 2);
        assert_eq!(book.quote_for(&CurrencyPair::default()).unwrap(), quote());
    }

    #[test]
    fn test_parse_book_prefers_quote_shape() {
        let pair = CurrencyPair::default();
        let book = JsonFileRateProvider::parse_book(
            r#"{ "buy_rate": "2.5", "sell_rate": "2.4" }"#,
            &pair,
            &Currency::byn(),
        )
        .unwrap();
        assert_eq!(book.quote_for(&pair).unwrap(), quote());

        let negative = JsonFileRateProvider::parse_book(
            r#"{ "buy_rate": "-1", "sell_rate": "2.4" }"#,
            &pair,
            &Currency::byn(),
        );
        assert!(matches!(negative, Err(FxError::InvalidRate { .. })));
    }

    #[tokio::test]
    async fn test_json_file_provider_missing_file() {
        let provider = JsonFileRateProvider::new("/nonexistent/ratepair/rates.json");
        assert!(matches!(
            provider.fetch_rates().await,
            Err(FxError::ProviderError(_))
        ));
    }
}
