//! Widget status and the view handed to renderers.

use ratepair_common::{Currency, MainCurrency, Timestamp};
use ratepair_fx::{FieldPair, RateStore};
use serde::{Deserialize, Serialize};

/// Whether the widget can convert, and what warning to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStatus {
    /// First fetch still in flight.
    Loading,
    /// First fetch failed; nothing to convert with.
    Unavailable,
    /// Latest fetch failed but earlier rates are still held.
    Outdated,
    /// Rates loaded.
    Ready,
}

impl WidgetStatus {
    /// Derive the status from the rate store.
    pub fn from_rates(rates: &RateStore) -> Self {
        match (rates.has_snapshot(), rates.error().is_some()) {
            (false, true) => WidgetStatus::Unavailable,
            (false, false) => WidgetStatus::Loading,
            (true, true) => WidgetStatus::Outdated,
            (true, false) => WidgetStatus::Ready,
        }
    }

    /// Check if the fields are enabled.
    pub fn accepts_input(&self) -> bool {
        matches!(self, WidgetStatus::Outdated | WidgetStatus::Ready)
    }

    /// Warning shown next to the fields.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            WidgetStatus::Unavailable => Some("converter temporarily unavailable"),
            WidgetStatus::Outdated => Some("data is outdated"),
            WidgetStatus::Loading | WidgetStatus::Ready => None,
        }
    }
}

/// Everything a renderer needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetView {
    pub main: MainCurrency,
    pub sell_currency: Currency,
    pub buy_currency: Currency,
    pub fields: FieldPair,
    pub status: WidgetStatus,
    pub enabled: bool,
    pub warning: Option<String>,
    pub fetched_at: Option<Timestamp>,
}
