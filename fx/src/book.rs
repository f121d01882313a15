//! Ordered-pair rate book for converting between more than two currencies.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use ratepair_common::{format_amount, Currency, CurrencyPair, Timestamp};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::conversion::{parse_amount, round4};
use crate::error::{FxError, FxResult};
use crate::rates::RateQuote;

/// A bank rate key: `USD_in` quotes against the home currency, `USD_EUR_out`
/// quotes a cross pair. `in` reads base to quote, `out` quote to base.
static BANK_RATE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{3})(?:_([A-Z]{3}))?_(in|out)$").expect("bank rate key is a valid regex")
});

/// How a rate applies when converting along an ordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "rate")]
pub enum DirectedRate {
    /// `to = from * rate`
    Multiply(Decimal),
    /// `to = from / rate`
    Divide(Decimal),
}

impl DirectedRate {
    fn rate(&self) -> Decimal {
        match self {
            DirectedRate::Multiply(rate) | DirectedRate::Divide(rate) => *rate,
        }
    }

    /// The same quotation read in the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            DirectedRate::Multiply(rate) => DirectedRate::Divide(rate),
            DirectedRate::Divide(rate) => DirectedRate::Multiply(rate),
        }
    }

    /// Factor that takes the source amount to the target amount.
    fn multiplier(&self) -> Option<Decimal> {
        match self {
            DirectedRate::Multiply(rate) => Some(*rate),
            DirectedRate::Divide(rate) => Decimal::ONE.checked_div(*rate),
        }
    }

    /// Divisor that takes the source amount to the target amount.
    fn divisor(&self) -> Option<Decimal> {
        match self {
            DirectedRate::Multiply(rate) => Decimal::ONE.checked_div(*rate),
            DirectedRate::Divide(rate) => Some(*rate),
        }
    }

    /// Apply to an amount, rounded to four fractional digits.
    pub fn apply(&self, amount: Decimal) -> Option<Decimal> {
        let converted = match self {
            DirectedRate::Multiply(rate) => amount.checked_mul(*rate),
            DirectedRate::Divide(rate) => amount.checked_div(*rate),
        };
        converted.map(round4)
    }
}

/// Rates keyed by ordered currency pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateBook {
    rates: HashMap<CurrencyPair, DirectedRate>,
    fetched_at: Option<Timestamp>,
}

impl RateBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a book from a two-currency quote.
    ///
    /// Selling the base currency multiplies by the buy rate; selling the
    /// quote currency divides by the sell rate.
    pub fn from_quote(pair: &CurrencyPair, quote: &RateQuote) -> FxResult<Self> {
        quote.check()?;
        let mut book = Self::new();
        book.insert(pair.clone(), DirectedRate::Multiply(quote.buy_rate))?;
        book.insert(pair.inverse(), DirectedRate::Divide(quote.sell_rate))?;
        Ok(book)
    }

    /// Build a book from a bank rate document.
    ///
    /// The document is a JSON object (or an array whose first element is one)
    /// of keys such as `USD_in`, `USD_out`, `USD_EUR_in`, `RUB_EUR_out`.
    /// Single-code keys quote against `home`. For a key `A_B`:
    ///
    /// - `A_B_in` converts `A` into `B` by multiplying,
    /// - `A_B_out` converts `B` into `A` by dividing.
    ///
    /// Other keys and entries quoted at zero are skipped.
    pub fn from_bank_document(contents: &str, home: &Currency) -> FxResult<Self> {
        let document: Value = serde_json::from_str(contents)
            .map_err(|e| FxError::ProviderError(format!("malformed rate document: {e}")))?;

        let entries = match &document {
            Value::Array(items) => items.first().and_then(Value::as_object),
            Value::Object(map) => Some(map),
            _ => None,
        }
        .ok_or_else(|| FxError::ProviderError("rate document holds no rate object".to_string()))?;

        let mut book = Self::new();
        for (key, value) in entries {
            let Some(captures) = BANK_RATE_KEY.captures(key) else {
                continue;
            };

            let rate = parse_rate(key, value)?;
            if rate <= Decimal::ZERO {
                warn!(key = %key, %rate, "Skipping non-positive bank rate");
                continue;
            }

            let base = Currency::new(&captures[1]);
            let quote = captures
                .get(2)
                .map(|m| Currency::new(m.as_str()))
                .unwrap_or_else(|| home.clone());
            let pair = CurrencyPair::new(base, quote);

            match &captures[3] {
                "in" => book.insert(pair, DirectedRate::Multiply(rate))?,
                _ => book.insert(pair.inverse(), DirectedRate::Divide(rate))?,
            }
        }

        if book.is_empty() {
            return Err(FxError::ProviderError(
                "rate document holds no usable rates".to_string(),
            ));
        }

        debug!(pairs = book.len(), %home, "Parsed bank rate document");
        Ok(book)
    }

    /// The two-currency quote for `pair`, as the conversion engine reads it.
    ///
    /// `buy_rate` multiplies base amounts into quote amounts, `sell_rate`
    /// divides quote amounts back into base amounts.
    pub fn quote_for(&self, pair: &CurrencyPair) -> FxResult<RateQuote> {
        let forward = self.rate(&pair.base, &pair.quote)?;
        let backward = self.rate(&pair.quote, &pair.base)?;

        let invalid = |rate: DirectedRate| FxError::InvalidRate {
            subject: format!("{pair} rate"),
            rate: rate.rate(),
        };
        let buy_rate = forward.multiplier().ok_or_else(|| invalid(forward))?;
        let sell_rate = backward.divisor().ok_or_else(|| invalid(backward))?;

        RateQuote::new(buy_rate, sell_rate)
    }

    /// Add or replace the rate for converting `pair.base` into `pair.quote`.
    pub fn insert(&mut self, pair: CurrencyPair, rate: DirectedRate) -> FxResult<()> {
        if rate.rate() <= Decimal::ZERO {
            return Err(FxError::InvalidRate {
                subject: format!("{pair} rate"),
                rate: rate.rate(),
            });
        }
        self.rates.insert(pair, rate);
        Ok(())
    }

    pub fn with_fetched_at(mut self, fetched_at: Timestamp) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    pub fn fetched_at(&self) -> Option<Timestamp> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Look up how to convert `from` into `to`.
    ///
    /// A direct entry wins; otherwise the entry for the reverse pair is read
    /// backwards.
    pub fn rate(&self, from: &Currency, to: &Currency) -> FxResult<DirectedRate> {
        if from == to {
            return Ok(DirectedRate::Multiply(Decimal::ONE));
        }

        let pair = CurrencyPair::new(from.clone(), to.clone());
        if let Some(rate) = self.rates.get(&pair) {
            return Ok(*rate);
        }

        self.rates
            .get(&pair.inverse())
            .map(|rate| rate.reversed())
            .ok_or(FxError::RateNotAvailable(pair))
    }

    /// Convert a canonical amount string. Empty input converts to empty.
    pub fn convert(&self, value: &str, from: &Currency, to: &Currency) -> FxResult<String> {
        if value.is_empty() {
            return Ok(String::new());
        }

        let amount = parse_amount(value)?;
        let rate = self.rate(from, to)?;
        let converted = rate.apply(amount).ok_or_else(|| FxError::InvalidRate {
            subject: format!("{from}/{to} rate"),
            rate: rate.rate(),
        })?;

        debug!(%from, %to, value, converted = %converted, "Converted via rate book");
        Ok(format_amount(converted))
    }

    /// All ordered pairs with an entry, sorted by code.
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        let mut pairs: Vec<CurrencyPair> = self.rates.keys().cloned().collect();
        pairs.sort_by(|a, b| (&a.base, &a.quote).cmp(&(&b.base, &b.quote)));
        pairs
    }
}

fn parse_rate(key: &str, value: &Value) -> FxResult<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(FxError::ProviderError(format!(
                "rate {key} is not a number: {other}"
            )))
        }
    };
    text.parse::<Decimal>()
        .map_err(|_| FxError::ProviderError(format!("rate {key} is not a number: {text:?}")))
}
