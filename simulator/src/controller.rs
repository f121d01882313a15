//! Session controller: drives a widget from scenario steps or typed commands.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Duration as ChronoDuration;
use ratepair_common::{Clock, Currency, CurrencyPair, ManualClock};
use ratepair_fx::{validate, Field, RateProvider, RateQuote};
use ratepair_widget::{TokioRefresher, WidgetConfig, WidgetEvent, WidgetRuntime, WidgetView};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::bank::SimulatedBank;
use crate::metrics::SessionMetrics;
use crate::scenario::{AssertCondition, Scenario, ScenarioStep};

/// How long to wait for a rate fetch before giving up.
const FETCH_WAIT: Duration = Duration::from_secs(15);

/// Controls one widget session.
pub struct SessionController {
    runtime: WidgetRuntime<TokioRefresher>,
    pair: CurrencyPair,
    bank: Arc<SimulatedBank>,
    clock: Arc<ManualClock>,
    metrics: SessionMetrics,
}

impl SessionController {
    /// Mount a widget against `bank` and wait for its first fetch.
    pub async fn start(config: &WidgetConfig, bank: Arc<SimulatedBank>) -> anyhow::Result<Self> {
        let clock = Arc::new(ManualClock::default());
        let runtime = WidgetRuntime::start(config, bank.clone(), clock.clone());

        let mut controller = Self {
            runtime,
            pair: config.pair.clone(),
            bank,
            clock,
            metrics: SessionMetrics::new(),
        };

        if controller.runtime.await_fetch(FETCH_WAIT).await.is_some() {
            controller.metrics.record_fetches(1);
        }
        let widget = controller.runtime.widget();
        info!(
            session = %widget.session_id(),
            pair = %widget.pair(),
            status = ?widget.status(),
            "Widget mounted"
        );

        Ok(controller)
    }

    /// Run a scenario. Returns the number of failed assertions.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<u64> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        for (index, step) in scenario.steps.iter().enumerate() {
            self.execute_step(index, step).await?;
            tokio::task::yield_now().await;
        }

        Ok(self.metrics.failed_assertions)
    }

    async fn execute_step(&mut self, index: usize, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Type { field, text } => self.edit(*field, text),
            ScenarioStep::Toggle => self.toggle(),
            ScenarioStep::Advance { minutes } => {
                self.clock.advance(ChronoDuration::minutes(*minutes));
                info!(minutes, now = %self.clock.now(), "Clock advanced");
            }
            ScenarioStep::SetRates {
                buy_rate,
                sell_rate,
            } => {
                let quote = parse_quote(buy_rate, sell_rate)?;
                self.bank.set_quote(quote);
                info!(%buy_rate, %sell_rate, "Bank rates changed");
            }
            ScenarioStep::InjectFault { fault_type } => {
                self.bank.inject_fault(*fault_type);
                info!(?fault_type, "Fault injected");
            }
            ScenarioStep::ClearFault => {
                self.bank.clear_fault();
                info!("Fault cleared");
            }
            ScenarioStep::AwaitFetch => {
                match self.runtime.await_fetch(FETCH_WAIT).await {
                    Some(outcome) => {
                        self.metrics.record_fetches(1);
                        info!(?outcome, "Fetch completed");
                    }
                    None => warn!("No fetch completed in time"),
                }
            }
            ScenarioStep::CrossConvert {
                amount,
                from,
                to,
                expect,
            } => {
                let from = Currency::new(from.as_str());
                let to = Currency::new(to.as_str());
                match self.cross(amount, &from, &to).await {
                    Ok(converted) if converted == *expect => {
                        info!(step = index, %amount, %from, %to, %converted, "Cross conversion");
                    }
                    Ok(converted) => {
                        self.metrics.record_failed_assertion();
                        warn!(step = index, %expect, %converted, "Cross conversion mismatch");
                    }
                    Err(e) => {
                        self.metrics.record_failed_assertion();
                        warn!(step = index, error = %e, "Cross conversion failed");
                    }
                }
            }
            ScenarioStep::Assert { condition } => self.check(index, condition),
        }
        Ok(())
    }

    /// Convert between any two currencies the bank publishes.
    pub async fn cross(
        &self,
        amount: &str,
        from: &Currency,
        to: &Currency,
    ) -> anyhow::Result<String> {
        let value = validate(amount)?;
        let book = self.bank.fetch_book(&self.pair).await?;
        Ok(book.convert(&value, from, to)?)
    }

    /// Type the full text of a field.
    pub fn edit(&mut self, field: Field, text: &str) {
        let applied = self.runtime.drain_fetches();
        self.metrics.record_fetches(applied);

        let event = WidgetEvent::Input {
            field,
            raw: text.to_string(),
        };
        match self.runtime.handle(event) {
            Ok(()) => {
                self.metrics.record_accepted();
                let fields = self.runtime.widget().fields();
                info!(
                    %field,
                    text,
                    derived = fields.get(field.counterpart()),
                    "Edit accepted"
                );
            }
            Err(e) if e.is_retryable() => {
                self.metrics.record_disabled();
                warn!(
                    %field,
                    text,
                    code = e.error_code(),
                    retry_after_ms = ?e.retry_after_ms(),
                    "Edit ignored: converter unavailable"
                );
            }
            Err(e) => {
                self.metrics.record_rejected();
                info!(%field, text, code = e.error_code(), error = %e, "Edit rejected");
            }
        }
    }

    /// Click the main-currency button.
    pub fn toggle(&mut self) {
        let applied = self.runtime.drain_fetches();
        self.metrics.record_fetches(applied);

        match self.runtime.handle(WidgetEvent::Toggle) {
            Ok(()) => {
                self.metrics.record_toggle();
                let widget = self.runtime.widget();
                info!(
                    main = %widget.main(),
                    sell_currency = %widget.currency_of(Field::Sell),
                    buy = %widget.fields().buy,
                    "Toggled"
                );
            }
            Err(e) => warn!(error = %e, "Toggle failed"),
        }
    }

    fn check(&mut self, index: usize, condition: &AssertCondition) {
        let widget = self.runtime.widget();
        let failure = match condition {
            AssertCondition::FieldsEqual { sell, buy } => {
                let fields = widget.fields();
                (fields.sell != *sell || fields.buy != *buy).then(|| {
                    format!(
                        "expected fields ({sell:?}, {buy:?}), got ({:?}, {:?})",
                        fields.sell, fields.buy
                    )
                })
            }
            AssertCondition::MainIs { main } => (widget.main() != *main)
                .then(|| format!("expected main {main}, got {}", widget.main())),
            AssertCondition::StatusIs { status } => (widget.status() != *status)
                .then(|| format!("expected status {status:?}, got {:?}", widget.status())),
        };

        match failure {
            Some(reason) => {
                self.metrics.record_failed_assertion();
                warn!(step = index, %reason, "Assertion failed");
            }
            None => info!(step = index, ?condition, "Assertion passed"),
        }
    }

    /// Apply one interactive command. Returns `false` on `quit`.
    pub async fn command(&mut self, line: &str) -> anyhow::Result<bool> {
        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("quit") | Some("exit") => return Ok(false),
            Some("toggle") => self.toggle(),
            Some("status") => {}
            Some("advance") => {
                let minutes: i64 = parts
                    .next()
                    .context("usage: advance <minutes>")?
                    .parse()
                    .context("minutes must be an integer")?;
                self.clock.advance(ChronoDuration::minutes(minutes));
            }
            Some("cross") => {
                let usage = "usage: cross <amount> <from> <to>";
                let amount = parts.next().context(usage)?;
                let from = Currency::new(parts.next().context(usage)?);
                let to = Currency::new(parts.next().context(usage)?);
                let converted = self.cross(amount, &from, &to).await?;
                println!("{amount} {from} = {converted} {to}");
            }
            Some(word) => {
                let field = Field::from_str(word).map_err(|e| anyhow::anyhow!(e))?;
                self.edit(field, parts.next().unwrap_or(""));
            }
        }

        let applied = self.runtime.drain_fetches();
        self.metrics.record_fetches(applied);
        Ok(true)
    }

    pub fn view(&self) -> WidgetView {
        self.runtime.widget().view()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn bank_fetches(&self) -> u64 {
        self.bank.fetches()
    }
}

/// Parse a buy/sell rate pair given as strings.
pub fn parse_quote(buy_rate: &str, sell_rate: &str) -> anyhow::Result<RateQuote> {
    let buy: Decimal = buy_rate
        .parse()
        .with_context(|| format!("invalid buy rate {buy_rate:?}"))?;
    let sell: Decimal = sell_rate
        .parse()
        .with_context(|| format!("invalid sell rate {sell_rate:?}"))?;
    Ok(RateQuote::new(buy, sell)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn controller() -> SessionController {
        let bank = Arc::new(SimulatedBank::with_quote(
            "BANK",
            RateQuote::new(dec!(2.5), dec!(2.4)).unwrap(),
        ));
        SessionController::start(&WidgetConfig::default(), bank)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_builtin_scenarios_pass() {
        for name in Scenario::builtin_names() {
            let mut controller = controller().await;
            let scenario = Scenario::load(name).unwrap();
            let failed = controller.run_scenario(&scenario).await.unwrap();
            assert_eq!(failed, 0, "scenario {name} failed");
        }
    }

    #[tokio::test]
    async fn test_interactive_commands() {
        let mut controller = controller().await;

        assert!(controller.command("sell 10").await.unwrap());
        assert_eq!(controller.view().fields.buy, "25");

        assert!(controller.command("toggle").await.unwrap());
        assert_eq!(controller.view().sell_currency.code(), "BYN");

        assert!(controller.command("buy 1.2.3").await.unwrap());
        assert_eq!(controller.metrics().rejected_edits, 1);

        assert!(controller.command("cross 10 USD BYN").await.unwrap());
        assert!(controller.command("cross 10 USD").await.is_err());

        assert!(controller.command("sideways 1").await.is_err());
        assert!(!controller.command("quit").await.unwrap());
    }

    #[tokio::test]
    async fn test_cross_conversion_through_bank_document() {
        let path = std::env::temp_dir()
            .join(format!("ratepair-sim-bank-{}.json", std::process::id()));
        let document = r#"[{ "USD_in": "2.5", "USD_out": "2.4", "EUR_in": "2.9", "EUR_out": "2.8",
            "USD_EUR_in": "0.9", "USD_EUR_out": "0.85" }]"#;
        tokio::fs::write(&path, document).await.unwrap();

        let upstream = Arc::new(ratepair_fx::JsonFileRateProvider::new(path.clone()));
        let bank = Arc::new(SimulatedBank::with_upstream("FILE", upstream));
        let mut controller = SessionController::start(&WidgetConfig::default(), bank)
            .await
            .unwrap();

        let usd_eur = controller.cross("10", &Currency::usd(), &Currency::eur()).await;
        let eur_usd = controller.cross("8.5", &Currency::eur(), &Currency::usd()).await;
        let malformed = controller.cross("1.23456", &Currency::usd(), &Currency::eur()).await;
        assert!(controller.command("sell 10").await.unwrap());
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(usd_eur.unwrap(), "9");
        assert_eq!(eur_usd.unwrap(), "10");
        assert!(malformed.is_err());
        assert_eq!(controller.view().fields.buy, "25");
    }

    #[test]
    fn test_parse_quote() {
        assert_eq!(
            parse_quote("2.5", "2.4").unwrap(),
            RateQuote::new(dec!(2.5), dec!(2.4)).unwrap()
        );
        assert!(parse_quote("abc", "2.4").is_err());
        assert!(parse_quote("0", "2.4").is_err());
    }
}
