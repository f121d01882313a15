//! Converter widget controller.

use std::sync::Arc;

use ratepair_common::{Clock, ConverterError, Currency, CurrencyPair, MainCurrency, Result};
use ratepair_fx::{
    convert, toggle, FetchOutcome, Field, FieldEdit, FieldPair, InputValidator, RateStore,
    StalenessPolicy, ToggleOutcome,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::WidgetConfig;
use crate::refresh::RefreshHandle;
use crate::state::{WidgetStatus, WidgetView};

/// Owns the field values, main currency and rates for one widget session.
///
/// Every operation runs to completion synchronously. Rate fetches are only
/// requested here; their outcomes come back through [`Self::apply_fetch`].
pub struct ConverterWidget<R: RefreshHandle> {
    session_id: Uuid,
    pair: CurrencyPair,
    validator: InputValidator,
    policy: StalenessPolicy,
    clock: Arc<dyn Clock>,
    refresher: R,
    rates: RateStore,
    main: MainCurrency,
    fields: FieldPair,
}

impl<R: RefreshHandle> ConverterWidget<R> {
    /// Create a widget. No fetch is started until [`Self::initialize`].
    pub fn new(config: &WidgetConfig, clock: Arc<dyn Clock>, refresher: R) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            pair: config.pair.clone(),
            validator: config.validator(),
            policy: config.staleness_policy(),
            clock,
            refresher,
            rates: RateStore::new(),
            main: config.default_main,
            fields: FieldPair::default(),
        }
    }

    /// Mount the widget: always fetch rates once.
    #[instrument(skip(self), fields(session = %self.session_id, pair = %self.pair))]
    pub fn initialize(&mut self) {
        info!(main = %self.main, "Initializing converter");
        self.request_refresh();
    }

    /// Handle the full text of `field` after a keystroke.
    ///
    /// Rejected text leaves both fields untouched. Accepted text replaces the
    /// edited field and derives the other one from the current rates.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub fn input(&mut self, field: Field, raw: &str) -> Result<FieldPair> {
        let status = self.status();
        if !status.accepts_input() {
            debug!(?status, "Input ignored: converter disabled");
            return Err(ConverterError::RatesUnavailable);
        }

        let value = self
            .validator
            .validate(raw)
            .map_err(|rejection| ConverterError::InvalidInput {
                message: rejection.to_string(),
                field: field.to_string(),
            })?;

        self.refresh_if_stale();

        let fields = convert(&FieldEdit::new(field, value), &self.rates, self.main)?;
        self.fields = fields.clone();
        Ok(fields)
    }

    /// Flip the main currency and recompute the buy field.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub fn toggle(&mut self) -> Result<ToggleOutcome> {
        self.refresh_if_stale();

        let outcome = toggle(self.main, &self.fields, &self.rates)?;
        info!(
            main = %outcome.main,
            currency = %self.pair.currency_for(outcome.main),
            "Main currency switched"
        );
        self.main = outcome.main;
        self.fields = outcome.fields.clone();
        Ok(outcome)
    }

    /// Fold a completed (or started) fetch into the rate store.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome) {
        let before = self.status();
        self.rates = std::mem::take(&mut self.rates).apply(outcome);
        let after = self.status();

        if before != after {
            match after.warning() {
                Some(warning) => {
                    warn!(session = %self.session_id, ?after, warning, "Converter status changed")
                }
                None => info!(session = %self.session_id, ?after, "Converter status changed"),
            }
        }
    }

    pub fn status(&self) -> WidgetStatus {
        WidgetStatus::from_rates(&self.rates)
    }

    pub fn fields(&self) -> &FieldPair {
        &self.fields
    }

    pub fn main(&self) -> MainCurrency {
        self.main
    }

    pub fn rates(&self) -> &RateStore {
        &self.rates
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Currency a field is denominated in under the current main currency.
    pub fn currency_of(&self, field: Field) -> &Currency {
        match field {
            Field::Sell => self.pair.currency_for(self.main),
            Field::Buy => self.pair.currency_for(self.main.flipped()),
        }
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> WidgetView {
        let status = self.status();
        WidgetView {
            main: self.main,
            sell_currency: self.currency_of(Field::Sell).clone(),
            buy_currency: self.currency_of(Field::Buy).clone(),
            fields: self.fields.clone(),
            status,
            enabled: status.accepts_input(),
            warning: status.warning().map(str::to_string),
            fetched_at: self.rates.fetched_at(),
        }
    }

    fn refresh_if_stale(&mut self) -> bool {
        let now = self.clock.now();
        if !self.rates.is_stale(now, &self.policy) {
            return false;
        }

        warn!(
            fetched_at = ?self.rates.fetched_at(),
            threshold_ms = self.policy.threshold().num_milliseconds(),
            "Rates stale, refreshing"
        );
        self.request_refresh();
        true
    }

    fn request_refresh(&mut self) {
        self.apply_fetch(FetchOutcome::Loading);
        self.refresher.request_refresh();
    }
}
