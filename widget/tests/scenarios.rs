use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use ratepair_common::{ConverterError, ManualClock, MainCurrency};
use ratepair_fx::provider::MockRateProvider;
use ratepair_fx::{FetchOutcome, Field, FieldPair, FxError, RateQuote};
use ratepair_widget::{WidgetConfig, WidgetEvent, WidgetRuntime, WidgetStatus, TokioRefresher};
use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};

const WAIT: Duration = Duration::from_secs(30);

fn quote(buy: rust_decimal::Decimal, sell: rust_decimal::Decimal) -> RateQuote {
    RateQuote::new(buy, sell).unwrap()
}

fn input(field: Field, raw: &str) -> WidgetEvent {
    WidgetEvent::Input {
        field,
        raw: raw.to_string(),
    }
}

struct Setup {
    runtime: WidgetRuntime<TokioRefresher>,
    provider: Arc<MockRateProvider>,
    clock: Arc<ManualClock>,
}

async fn mounted(config: WidgetConfig) -> Setup {
    let provider = Arc::new(MockRateProvider::new("bank"));
    provider.push(Ok(quote(dec!(2.5), dec!(2.4))));
    let clock = Arc::new(ManualClock::default());

    let mut runtime = WidgetRuntime::start(&config, provider.clone(), clock.clone());
    assert!(runtime.await_fetch(WAIT).await.is_some());
    assert_eq!(runtime.widget().status(), WidgetStatus::Ready);

    Setup {
        runtime,
        provider,
        clock,
    }
}

#[tokio::test]
async fn converts_sell_with_base_main() {
    let mut s = mounted(WidgetConfig::default()).await;

    assert_ok!(s.runtime.handle(input(Field::Sell, "10")));
    assert_eq!(s.runtime.widget().fields(), &FieldPair::new("10", "25"));
}

#[tokio::test]
async fn converts_sell_with_quote_main() {
    let config = WidgetConfig {
        default_main: MainCurrency::Quote,
        ..Default::default()
    };
    let mut s = mounted(config).await;

    assert_ok!(s.runtime.handle(input(Field::Sell, "10")));
    assert_eq!(s.runtime.widget().fields(), &FieldPair::new("10", "4.1667"));
}

#[tokio::test]
async fn collapses_placeholder_zero() {
    let mut s = mounted(WidgetConfig::default()).await;

    assert_ok!(s.runtime.handle(input(Field::Sell, "0")));
    assert_ok!(s.runtime.handle(input(Field::Sell, "05")));
    assert_eq!(s.runtime.widget().fields().sell, "5");
}

#[tokio::test]
async fn rejects_edits_when_first_fetch_fails() {
    let provider = Arc::new(MockRateProvider::new("bank"));
    provider.push(Err(FxError::ProviderError("bank offline".into())));
    let clock = Arc::new(ManualClock::default());

    let mut runtime = WidgetRuntime::start(&WidgetConfig::default(), provider, clock);
    runtime.await_fetch(WAIT).await;

    let view = runtime.widget().view();
    assert_eq!(view.status, WidgetStatus::Unavailable);
    assert!(!view.enabled);
    assert_eq!(view.warning.as_deref(), Some("converter temporarily unavailable"));

    let result = runtime.handle(input(Field::Sell, "10"));
    assert_eq!(assert_err!(result), ConverterError::RatesUnavailable);
    assert!(runtime.widget().fields().is_empty());
}

#[tokio::test]
async fn toggle_with_empty_sell_leaves_buy() {
    let mut s = mounted(WidgetConfig::default()).await;

    assert_ok!(s.runtime.handle(WidgetEvent::Toggle));
    assert_eq!(s.runtime.widget().main(), MainCurrency::Quote);
    assert!(s.runtime.widget().fields().buy.is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_converting_with_warning() {
    let mut s = mounted(WidgetConfig::default()).await;

    assert_ok!(s.runtime.handle(WidgetEvent::Fetched(FetchOutcome::failure("bank offline"))));
    assert_eq!(s.runtime.widget().status(), WidgetStatus::Outdated);

    assert_ok!(s.runtime.handle(input(Field::Buy, "24")));
    assert_eq!(s.runtime.widget().fields(), &FieldPair::new("9.6", "24"));
}

#[tokio::test]
async fn stale_refresh_applies_from_next_edit() {
    let mut s = mounted(WidgetConfig::default()).await;
    s.provider.push(Ok(quote(dec!(3), dec!(2.9))));
    s.clock.advance(ChronoDuration::hours(4));

    assert_ok!(s.runtime.handle(input(Field::Sell, "10")));
    assert_eq!(s.runtime.widget().fields().buy, "25");

    while s.provider.calls() < 2 {
        tokio::task::yield_now().await;
    }
    let outcome = s.runtime.await_fetch(WAIT).await;
    assert!(matches!(outcome, Some(FetchOutcome::Success { .. })));

    assert_ok!(s.runtime.handle(input(Field::Sell, "10")));
    assert_eq!(s.runtime.widget().fields().buy, "30");
    assert_eq!(s.provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn late_fetch_overwrites_newer_rates() {
    let mut s = mounted(WidgetConfig::default()).await;
    s.clock.advance(ChronoDuration::hours(4));

    s.provider
        .push_delayed(Duration::from_secs(5), Ok(quote(dec!(2), dec!(1.9))));
    assert_ok!(s.runtime.handle(input(Field::Sell, "1")));
    while s.provider.calls() < 2 {
        tokio::task::yield_now().await;
    }

    s.provider
        .push_delayed(Duration::from_secs(1), Ok(quote(dec!(3), dec!(2.9))));
    assert_ok!(s.runtime.handle(input(Field::Sell, "1")));
    while s.provider.calls() < 3 {
        tokio::task::yield_now().await;
    }

    assert!(s.runtime.await_fetch(WAIT).await.is_some());
    assert_eq!(s.runtime.widget().rates().buy_rate(), Some(dec!(3)));

    assert!(s.runtime.await_fetch(WAIT).await.is_some());
    assert_eq!(s.runtime.widget().rates().buy_rate(), Some(dec!(2)));

    assert_ok!(s.runtime.handle(input(Field::Sell, "10")));
    assert_eq!(s.runtime.widget().fields().buy, "20");
}

#[tokio::test]
async fn clearing_a_field_clears_both() {
    let mut s = mounted(WidgetConfig::default()).await;

    assert_ok!(s.runtime.handle(input(Field::Sell, "10")));
    assert_ok!(s.runtime.handle(input(Field::Buy, "")));
    assert_eq!(s.runtime.widget().fields(), &FieldPair::default());
}
