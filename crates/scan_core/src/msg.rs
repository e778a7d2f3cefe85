use crate::{CardSummary, JobRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A new search keyword is about to be loaded.
    KeywordStarted(String),
    /// The results list of `page` (1-indexed) rendered with `card_count` cards.
    PageLoaded { page: u32, card_count: usize },
    /// A card was read from a freshly fetched list.
    CardListed { index: usize, card: CardSummary },
    /// Fields were extracted for the card last opened.
    DetailExtracted(JobRecord),
    /// The card last opened could not be attributed or read.
    DetailFailed { reason: DetailFailure },
    /// Every card of the current page was handled.
    PageFinished { has_next: bool },
    /// The page could not be loaded or read at all.
    PageFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailFailure {
    /// The pane never matched the clicked card.
    SyncFailed { ticks: u32 },
    /// Click or read failed in a recoverable way.
    Transient(String),
}
