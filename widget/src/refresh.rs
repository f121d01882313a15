//! Fire-and-forget rate refreshes.

use std::sync::Arc;
use std::time::Duration;

use ratepair_common::Clock;
use ratepair_fx::{FetchOutcome, FxError, RateProvider};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Starts a rate fetch without waiting for it.
///
/// The outcome is delivered back to the widget later; it never affects the
/// edit that triggered it.
pub trait RefreshHandle: Send + Sync {
    fn request_refresh(&self);
}

impl<T: RefreshHandle + ?Sized> RefreshHandle for Arc<T> {
    fn request_refresh(&self) {
        (**self).request_refresh()
    }
}

/// Runs provider fetches on the tokio runtime and sends the outcomes to a channel.
pub struct TokioRefresher {
    provider: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
}

impl TokioRefresher {
    /// Create a refresher and the receiving end of its outcome channel.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (outcomes, rx) = mpsc::unbounded_channel();
        (
            Self {
                provider,
                clock,
                timeout,
                outcomes,
            },
            rx,
        )
    }
}

impl RefreshHandle for TokioRefresher {
    fn request_refresh(&self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "No async runtime; rate refresh skipped");
                let _ = self
                    .outcomes
                    .send(FetchOutcome::failure("no async runtime for rate refresh"));
                return;
            }
        };

        let provider = self.provider.clone();
        let clock = self.clock.clone();
        let timeout = self.timeout;
        let outcomes = self.outcomes.clone();

        handle.spawn(async move {
            debug!(provider = provider.name(), "Fetching rates");
            let result = match tokio::time::timeout(timeout, provider.fetch_rates()).await {
                Ok(result) => result,
                Err(_) => Err(FxError::Timeout(timeout.as_millis() as u64)),
            };

            let outcome = FetchOutcome::from_fetch(result, clock.now());
            if outcomes.send(outcome).is_err() {
                debug!("Widget dropped; discarding fetch outcome");
            }
        });
    }
}
