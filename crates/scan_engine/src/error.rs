use thiserror::Error;

use crate::persist::PersistError;
use crate::store::StoreError;

/// Recovery policy attached to every scan failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The field falls back to the sentinel or the card is skipped.
    Transient,
    /// The card is abandoned without a partial record.
    SyncFailed,
    /// The current keyword ends; the run moves on.
    PageLevel,
    /// The run stops after flushing what it has.
    Fatal,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("browser failure: {0}")]
    Browser(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("results list did not load: {0}")]
    ResultsMissing(String),
    #[error("element not found: {0}")]
    MissingElement(String),
    #[error("element could not be clicked: {0}")]
    Click(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("detail pane never matched after {ticks} polls")]
    SyncFailed { ticks: u32 },
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl ScanError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ScanError::MissingElement(_) | ScanError::Click(_) | ScanError::Script(_) => {
                ErrorClass::Transient
            }
            ScanError::SyncFailed { .. } => ErrorClass::SyncFailed,
            ScanError::Navigation(_) | ScanError::ResultsMissing(_) => ErrorClass::PageLevel,
            ScanError::Browser(_)
            | ScanError::Selector { .. }
            | ScanError::Config(_)
            | ScanError::Store(_)
            | ScanError::Persist(_) => ErrorClass::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}
