//! Sell/buy field synchronization.

use std::fmt;

use ratepair_common::{format_amount, round_amount, MainCurrency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FxError, FxResult};
use crate::rates::{RateQuote, RateStore};

/// One of the two amount fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Amount in the main currency.
    Sell,
    /// Amount in the other currency.
    Buy,
}

impl Field {
    pub fn counterpart(self) -> Self {
        match self {
            Field::Sell => Field::Buy,
            Field::Buy => Field::Sell,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Sell => write!(f, "sell"),
            Field::Buy => write!(f, "buy"),
        }
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sell" => Ok(Field::Sell),
            "buy" => Ok(Field::Buy),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

/// A validated value that was just typed into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub field: Field,
    pub value: String,
}

impl FieldEdit {
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// The two displayed amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPair {
    pub sell: String,
    pub buy: String,
}

impl FieldPair {
    pub fn new(sell: impl Into<String>, buy: impl Into<String>) -> Self {
        Self {
            sell: sell.into(),
            buy: buy.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Sell => &self.sell,
            Field::Buy => &self.buy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sell.is_empty() && self.buy.is_empty()
    }
}

/// Round to four fractional digits, half away from zero.
pub fn round4(value: Decimal) -> Decimal {
    round_amount(value)
}

/// Parse a canonical field string. A trailing point (`"10."`) is allowed.
pub fn parse_amount(value: &str) -> FxResult<Decimal> {
    value
        .trim_end_matches('.')
        .parse::<Decimal>()
        .map_err(|_| FxError::InvalidAmount(value.to_string()))
}

/// The rate a main currency selects.
pub fn rate_for(quote: &RateQuote, main: MainCurrency) -> Decimal {
    match main {
        MainCurrency::Base => quote.buy_rate,
        MainCurrency::Quote => quote.sell_rate,
    }
}

/// Derive the counterpart amount for a value typed into `field`.
///
/// The main currency picks the rate; quote-currency amounts are base-currency
/// amounts times that rate. The sell field always holds the main currency, so:
///
/// | field | main  | result                 |
/// |-------|-------|------------------------|
/// | sell  | base  | `value * buy_rate`     |
/// | sell  | quote | `value / sell_rate`    |
/// | buy   | quote | `value * sell_rate`    |
/// | buy   | base  | `value / buy_rate`     |
pub fn counterpart_amount(
    amount: Decimal,
    field: Field,
    quote: &RateQuote,
    main: MainCurrency,
) -> FxResult<Decimal> {
    let rate = rate_for(quote, main);
    let holds_base = matches!(
        (field, main),
        (Field::Sell, MainCurrency::Base) | (Field::Buy, MainCurrency::Quote)
    );

    let derived = if holds_base {
        amount.checked_mul(rate)
    } else {
        amount.checked_div(rate)
    };

    derived.map(round4).ok_or_else(|| FxError::InvalidRate {
        subject: format!("{main} rate"),
        rate,
    })
}

/// Apply a validated edit and derive the other field.
///
/// An empty value clears both fields without touching the rates. The edited
/// field keeps the exact text the user typed.
pub fn convert(edit: &FieldEdit, rates: &RateStore, main: MainCurrency) -> FxResult<FieldPair> {
    if edit.value.is_empty() {
        return Ok(FieldPair::default());
    }

    let quote = rates.quote()?;
    let amount = parse_amount(&edit.value)?;
    let derived = format_amount(counterpart_amount(amount, edit.field, &quote, main)?);

    debug!(
        field = %edit.field,
        value = %edit.value,
        %main,
        derived = %derived,
        "Converted field"
    );

    Ok(match edit.field {
        Field::Sell => FieldPair::new(edit.value.clone(), derived),
        Field::Buy => FieldPair::new(derived, edit.value.clone()),
    })
}
