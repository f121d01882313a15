//! Session metrics.

/// Counters collected while driving the widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetrics {
    /// Edits the widget accepted.
    pub accepted_edits: u64,
    /// Edits rejected by validation.
    pub rejected_edits: u64,
    /// Edits ignored because the converter was disabled.
    pub disabled_edits: u64,
    /// Main-currency toggles.
    pub toggles: u64,
    /// Fetch outcomes applied.
    pub fetches_applied: u64,
    /// Failed assertions.
    pub failed_assertions: u64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&mut self) {
        self.accepted_edits += 1;
    }

    pub fn record_rejected(&mut self) {
        self.rejected_edits += 1;
    }

    pub fn record_disabled(&mut self) {
        self.disabled_edits += 1;
    }

    pub fn record_toggle(&mut self) {
        self.toggles += 1;
    }

    pub fn record_fetches(&mut self, applied: usize) {
        self.fetches_applied += applied as u64;
    }

    pub fn record_failed_assertion(&mut self) {
        self.failed_assertions += 1;
    }

    /// Total edits attempted.
    pub fn total_edits(&self) -> u64 {
        self.accepted_edits + self.rejected_edits + self.disabled_edits
    }

    /// Share of attempted edits that were accepted, between 0 and 1.
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.total_edits();
        if total == 0 {
            return 0.0;
        }
        self.accepted_edits as f64 / total as f64
    }

    /// Human-readable session summary, one line per counter.
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!("Edits: {}", self.total_edits()),
            format!("Accepted: {}", self.accepted_edits),
            format!("Rejected: {}", self.rejected_edits),
            format!("Ignored while unavailable: {}", self.disabled_edits),
            format!("Toggles: {}", self.toggles),
            format!("Fetches applied: {}", self.fetches_applied),
            format!("Acceptance rate: {:.1}%", self.acceptance_rate() * 100.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_rate() {
        let mut metrics = SessionMetrics::new();
        assert_eq!(metrics.acceptance_rate(), 0.0);

        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_rejected();

        assert_eq!(metrics.total_edits(), 4);
        assert_eq!(metrics.acceptance_rate(), 0.75);
    }

    #[test]
    fn test_summary_reports_percent() {
        let mut metrics = SessionMetrics::new();
        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_rejected();
        metrics.record_toggle();

        let summary = metrics.summary();
        assert!(summary.contains(&"Acceptance rate: 75.0%".to_string()));
        assert!(summary.contains(&"Edits: 4".to_string()));
        assert!(summary.contains(&"Toggles: 1".to_string()));
    }
}
