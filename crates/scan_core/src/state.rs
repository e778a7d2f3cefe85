use crate::summary::ScanSummary;
use crate::{CardSummary, JobRecord, RecordPolicy, Relevance, RelevanceClassifier, SeenSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Accepted records across all keywords.
    pub max_records: usize,
    pub max_pages_per_keyword: u32,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_records: 600,
            max_pages_per_keyword: 18,
        }
    }
}

/// The card whose detail pane is currently being extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingCard {
    pub(crate) card: CardSummary,
    pub(crate) relevance: Relevance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Counters {
    pub(crate) keywords: usize,
    pub(crate) pages: usize,
    pub(crate) cards: usize,
    pub(crate) opened: usize,
    pub(crate) skipped: usize,
    pub(crate) duplicates: usize,
    pub(crate) sync_failures: usize,
}

/// Everything the pagination loop decides on. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanState {
    pub(crate) classifier: RelevanceClassifier,
    pub(crate) policy: RecordPolicy,
    pub(crate) limits: ScanLimits,
    pub(crate) seen: SeenSet,
    pub(crate) keyword: Option<String>,
    pub(crate) page: u32,
    pub(crate) pending: Option<PendingCard>,
    pub(crate) buffer: Vec<JobRecord>,
    pub(crate) counters: Counters,
    pub(crate) stopped: bool,
}

impl ScanState {
    pub fn new(
        classifier: RelevanceClassifier,
        policy: RecordPolicy,
        limits: ScanLimits,
        seen: SeenSet,
    ) -> Self {
        Self {
            classifier,
            policy,
            limits,
            seen,
            ..Self::default()
        }
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            keyword: self.keyword.clone(),
            page: self.page,
            accepted: self.buffer.len(),
            max_records: self.limits.max_records,
            keywords: self.counters.keywords,
            pages: self.counters.pages,
            cards: self.counters.cards,
            opened: self.counters.opened,
            skipped: self.counters.skipped,
            duplicates: self.counters.duplicates,
            sync_failures: self.counters.sync_failures,
            stopped: self.stopped,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn buffered(&self) -> &[JobRecord] {
        &self.buffer
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Hand the run's accepted records to the flush step.
    pub fn into_buffer(self) -> Vec<JobRecord> {
        self.buffer
    }

    pub(crate) fn cap_reached(&self) -> bool {
        self.buffer.len() >= self.limits.max_records
    }

    /// Marks the run stopped once the record cap is met, including a cap of 0.
    pub(crate) fn halt_at_cap(&mut self) -> bool {
        if self.cap_reached() {
            self.stopped = true;
        }
        self.stopped
    }
}
