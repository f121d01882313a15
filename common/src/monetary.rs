//! Monetary types for RatePair.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional digits kept in every displayed amount.
pub const AMOUNT_SCALE: u32 = 4;

/// Round an amount to [`AMOUNT_SCALE`] fractional digits.
///
/// Midpoints round away from zero, which for the non-negative amounts a
/// converter handles is the familiar half-up rule.
pub fn round_amount(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Render an amount as a plain decimal string without trailing zeros.
pub fn format_amount(value: Decimal) -> String {
    round_amount(value).to_string()
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn byn() -> Self {
        Self::new("BYN")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn rub() -> Self {
        Self::new("RUB")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An ordered currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency (the one being bought or sold).
    pub base: Currency,
    /// Quote currency (pricing currency).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }

    /// The currency a main-currency flag points at.
    pub fn currency_for(&self, main: MainCurrency) -> &Currency {
        match main {
            MainCurrency::Base => &self.base,
            MainCurrency::Quote => &self.quote,
        }
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self::new(Currency::usd(), Currency::byn())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Which side of the pair the widget treats as native.
///
/// The sell field is always denominated in the main currency and the buy
/// field in the other one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MainCurrency {
    /// The pair's base currency (USD in the default pair).
    #[default]
    Base,
    /// The pair's quote currency (BYN in the default pair).
    Quote,
}

impl MainCurrency {
    /// The other side of the pair.
    pub fn flipped(self) -> Self {
        match self {
            MainCurrency::Base => MainCurrency::Quote,
            MainCurrency::Quote => MainCurrency::Base,
        }
    }
}

impl fmt::Display for MainCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainCurrency::Base => write!(f, "base"),
            MainCurrency::Quote => write!(f, "quote"),
        }
    }
}

impl std::str::FromStr for MainCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" | "a" => Ok(MainCurrency::Base),
            "quote" | "b" => Ok(MainCurrency::Quote),
            other => Err(format!("unknown main currency: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_amount_half_up() {
        let value = Decimal::from_str_exact("4.16665").unwrap();
        assert_eq!(round_amount(value), Decimal::from_str_exact("4.1667").unwrap());

        let value = Decimal::from_str_exact("4.16664").unwrap();
        assert_eq!(round_amount(value), Decimal::from_str_exact("4.1666").unwrap());
    }

    #[test]
    fn test_format_amount_drops_trailing_zeros() {
        let value = Decimal::from_str_exact("25.0000").unwrap();
        assert_eq!(format_amount(value), "25");

        let value = Decimal::from_str_exact("1.50").unwrap();
        assert_eq!(format_amount(value), "1.5");
    }

    #[test]
    fn test_currency_normalizes_code() {
        assert_eq!(Currency::new(" usd "), Currency::usd());
        assert_eq!(Currency::from("byn").code(), "BYN");
    }

    #[test]
    fn test_pair_inverse_and_main() {
        let pair = CurrencyPair::default();
        assert_eq!(pair.to_string(), "USD/BYN");
        assert_eq!(pair.inverse().to_string(), "BYN/USD");
        assert_eq!(pair.currency_for(MainCurrency::Base), &Currency::usd());
        assert_eq!(pair.currency_for(MainCurrency::Quote), &Currency::byn());
    }

    #[test]
    fn test_main_currency_flip() {
        assert_eq!(MainCurrency::default(), MainCurrency::Base);
        assert_eq!(MainCurrency::Base.flipped(), MainCurrency::Quote);
        assert_eq!(MainCurrency::Base.flipped().flipped(), MainCurrency::Base);
    }

    #[test]
    fn test_main_currency_parse() {
        assert_eq!("quote".parse::<MainCurrency>(), Ok(MainCurrency::Quote));
        assert_eq!("A".parse::<MainCurrency>(), Ok(MainCurrency::Base));
        assert!("sideways".parse::<MainCurrency>().is_err());
    }

    #[test]
    fn test_main_currency_serde() {
        let json = serde_json::to_string(&MainCurrency::Quote).unwrap();
        assert_eq!(json, "\"quote\"");
    }
}
