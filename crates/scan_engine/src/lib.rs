//! Scan engine: browser session, field extraction, pagination driver and
//! the output side (CSV store, summaries, liveness pass).
mod chrome;
mod decode;
mod detail;
mod driver;
mod error;
mod extract;
mod flush;
mod persist;
mod search;
mod session;
mod store;
mod summarize;
mod verify;

pub use chrome::{BrowserOptions, ChromeSession, DEFAULT_IDLE_TIMEOUT};
pub use decode::{decode_body, DecodedBody};
pub use detail::{synchronize, DetailReader};
pub use driver::{
    local_clock, thread_sleeper, Clock, DriverSettings, KeywordEnd, KeywordReport, ScanDriver,
    Sleeper, Timing,
};
pub use error::{ErrorClass, ScanError};
pub use extract::{CardList, DetailFields, PageSelectors, SelectorConfig};
pub use flush::{flush, FlushSummary};
pub use persist::{backup_name, ensure_dir, write_backup, AtomicFileWriter, PersistError};
pub use search::{Provider, SearchQuery};
pub use session::{with_scoped, Closable, ResultsSession, ScopedTab};
pub use store::{JobStore, Layout, StoreError, StoredRows, WriteMode};
pub use summarize::{
    ChunkedSummarizer, HttpTextModel, PassthroughSummarizer, SummarizeError, Summarizer,
    SummarizerSettings, TextModel,
};
pub use verify::{
    check_all, verify_file, verify_store, DeadReason, LinkProbe, Liveness, LivenessChecker,
    VerifyError, VerifyReport, VerifySettings,
};
