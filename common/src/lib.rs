//! RatePair Common Types
//!
//! Shared types used across the RatePair workspace: currencies and the
//! two-currency pair, amount rounding, timing constants with an injectable
//! clock, and the workspace-wide error type.

pub mod monetary;
pub mod error;
pub mod time;

pub use monetary::*;
pub use error::*;
pub use time::*;
