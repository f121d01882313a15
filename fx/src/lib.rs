//! RatePair FX Engine
//!
//! The conversion core of a two-field currency converter.
//!
//! # Features
//!
//! - Keystroke validation into canonical decimal strings
//! - Sell/buy field synchronization driven by the main currency
//! - Rate store with fetch-outcome reducer and staleness policy
//! - Main-currency toggle with recomputation
//! - Ordered-pair rate book for more than two currencies
//!
//! # Example
//!
//! ```rust,ignore
//! use ratepair_fx::{convert, validate, Field, FieldEdit, RateStore, FetchOutcome};
//! use ratepair_common::MainCurrency;
//!
//! let rates = RateStore::new().apply(FetchOutcome::success(dec!(2.5), dec!(2.4), now()));
//! let value = validate("10")?;
//! let pair = convert(&FieldEdit::new(Field::Sell, value), &rates, MainCurrency::Base)?;
//! assert_eq!(pair.buy, "25");
//! ```

pub mod book;
pub mod conversion;
pub mod error;
pub mod input;
pub mod provider;
pub mod rates;
pub mod toggle;

pub use book::{DirectedRate, RateBook};
pub use conversion::{convert, round4, Field, FieldEdit, FieldPair};
pub use error::{FxError, FxResult};
pub use input::{validate, InputRejection, InputValidator};
pub use provider::{JsonFileRateProvider, RateProvider, StaticRateProvider};
pub use rates::{FetchOutcome, RateQuote, RateSnapshot, RateStore, StalenessPolicy};
pub use toggle::{toggle, ToggleOutcome};
