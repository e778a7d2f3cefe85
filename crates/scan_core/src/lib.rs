//! Scan core: pure job-scan domain and the pagination state machine.
mod effect;
mod msg;
mod record;
mod relevance;
mod salary;
mod seen;
mod state;
mod summary;
mod sync;
mod update;

pub use effect::{Effect, EndReason, SkipReason};
pub use msg::{DetailFailure, Msg};
pub use record::{
    canonical_job_url, collapse_whitespace, dedupe_qualifications, is_unavailable,
    or_unavailable, CardSummary, JobRecord, RecordPolicy, QUALIFICATION_SEPARATOR, UNAVAILABLE,
};
pub use relevance::{FilterConfig, MatchMode, Relevance, RelevanceClassifier, TitleVerdict};
pub use salary::normalize_salary;
pub use seen::{signature_of, SeenSet, Signature};
pub use state::{ScanLimits, ScanState};
pub use summary::ScanSummary;
pub use sync::{
    loose_match, run_sync, CardIdentity, CardSynchronizer, PaneSnapshot, SyncPolicy, SyncState,
};
pub use update::update;
