use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    Success,
    Failure { reason: String },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    /// Shortcode of the item, or the raw input when it never resolved to one.
    pub label: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Aggregate outcome of one run, in processing order.
///
/// `attempted == succeeded + failed == entries.len()` holds after every
/// update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    attempted: usize,
    succeeded: usize,
    failed: usize,
    interrupted: bool,
    entries: Vec<SummaryEntry>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, label: impl Into<String>) {
        self.record(label.into(), ItemOutcome::Success);
    }

    pub fn record_failure(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.record(
            label.into(),
            ItemOutcome::Failure {
                reason: reason.into(),
            },
        );
    }

    fn record(&mut self, label: String, outcome: ItemOutcome) {
        self.attempted += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.entries.push(SummaryEntry { label, outcome });
    }

    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}
