//! Serial event loop around a [`ConverterWidget`].

use std::sync::Arc;
use std::time::Duration;

use ratepair_common::{Clock, Result};
use ratepair_fx::{FetchOutcome, Field, RateProvider};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::WidgetConfig;
use crate::controller::ConverterWidget;
use crate::refresh::{RefreshHandle, TokioRefresher};

/// A discrete thing that happened to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The full text of a field after a keystroke.
    Input { field: Field, raw: String },
    /// The main-currency button was clicked.
    Toggle,
    /// A rate fetch finished.
    Fetched(FetchOutcome),
}

/// Applies events to one widget, one at a time.
///
/// Fetch outcomes that completed while an event was being handled are folded
/// in before the next event, so a refresh started by edit N is first seen by
/// edit N + 1. Outcomes are applied in arrival order; a slow fetch that lands
/// after a faster, later one overwrites it.
pub struct WidgetRuntime<R: RefreshHandle> {
    widget: ConverterWidget<R>,
    outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl WidgetRuntime<TokioRefresher> {
    /// Build a widget wired to `provider` and mount it.
    pub fn start(
        config: &WidgetConfig,
        provider: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (refresher, outcomes) =
            TokioRefresher::new(provider, clock.clone(), config.fetch_timeout);
        let mut widget = ConverterWidget::new(config, clock, refresher);
        widget.initialize();
        Self::new(widget, outcomes)
    }
}

impl<R: RefreshHandle> WidgetRuntime<R> {
    pub fn new(
        widget: ConverterWidget<R>,
        outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    ) -> Self {
        Self { widget, outcomes }
    }

    /// Handle one event after applying any fetches that already completed.
    pub fn handle(&mut self, event: WidgetEvent) -> Result<()> {
        self.drain_fetches();

        match event {
            WidgetEvent::Input { field, raw } => self.widget.input(field, &raw).map(|_| ()),
            WidgetEvent::Toggle => self.widget.toggle().map(|_| ()),
            WidgetEvent::Fetched(outcome) => {
                self.widget.apply_fetch(outcome);
                Ok(())
            }
        }
    }

    /// Apply every fetch outcome already waiting. Returns how many were applied.
    pub fn drain_fetches(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes.try_recv() {
            self.widget.apply_fetch(outcome);
            applied += 1;
        }
        if applied > 0 {
            debug!(applied, "Applied completed fetches");
        }
        applied
    }

    /// Wait up to `timeout` for the next fetch to complete and apply it.
    pub async fn await_fetch(&mut self, timeout: Duration) -> Option<FetchOutcome> {
        match tokio::time::timeout(timeout, self.outcomes.recv()).await {
            Ok(Some(outcome)) => {
                self.widget.apply_fetch(outcome.clone());
                Some(outcome)
            }
            Ok(None) | Err(_) => None,
        }
    }

    pub fn widget(&self) -> &ConverterWidget<R> {
        &self.widget
    }
}
