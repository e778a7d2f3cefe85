use std::fmt;

use crate::Relevance;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Click the card and extract its detail pane.
    OpenDetail { index: usize, relevance: Relevance },
    /// The card or record was dropped.
    Skipped { title: String, reason: SkipReason },
    /// The record was buffered.
    Accepted {
        title: String,
        url: String,
        verified: bool,
    },
    /// Trigger the next-page control.
    AdvancePage,
    /// Stop paginating the current keyword.
    EndKeyword { reason: EndReason },
    /// The record cap is reached; nothing more may be opened.
    StopRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingUrl,
    AlreadySeen,
    Excluded { term: String },
    NotRelevant,
    InvalidRecord,
    Duplicate,
    NotConfirmed,
    SyncFailed,
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    NoResults,
    LastPage,
    PageCap,
    PageError(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingUrl => write!(f, "card has no usable link"),
            SkipReason::AlreadySeen => write!(f, "url already collected"),
            SkipReason::Excluded { term } => write!(f, "excluded by '{term}'"),
            SkipReason::NotRelevant => write!(f, "no relevant title term"),
            SkipReason::InvalidRecord => write!(f, "record fails policy"),
            SkipReason::Duplicate => write!(f, "duplicate of a collected job"),
            SkipReason::NotConfirmed => write!(f, "no technical term in description"),
            SkipReason::SyncFailed => write!(f, "detail pane never matched"),
            SkipReason::Unreadable(message) => write!(f, "detail unreadable: {message}"),
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::NoResults => write!(f, "no results"),
            EndReason::LastPage => write!(f, "no next page"),
            EndReason::PageCap => write!(f, "page cap reached"),
            EndReason::PageError(message) => write!(f, "page error: {message}"),
        }
    }
}
