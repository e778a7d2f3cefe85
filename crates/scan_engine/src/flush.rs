use scan_core::{is_unavailable, JobRecord, UNAVAILABLE};
use scan_logging::{scan_info, scan_warn};

use crate::store::{JobStore, StoreError};
use crate::summarize::Summarizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushSummary {
    pub buffered: usize,
    /// Dropped because their URL was not absolute http(s).
    pub discarded: usize,
    pub written: usize,
}

/// Summarize and append the run's accepted records. Runs once, after the
/// browser session has been released.
pub fn flush(
    records: Vec<JobRecord>,
    summarizer: &dyn Summarizer,
    store: &JobStore,
) -> Result<FlushSummary, StoreError> {
    let mut summary = FlushSummary {
        buffered: records.len(),
        ..FlushSummary::default()
    };
    if records.is_empty() {
        scan_info!("no new jobs to append");
        return Ok(summary);
    }

    let total = records.len();
    let mut ready = Vec::with_capacity(total);
    for mut record in records {
        if !record.is_persistable() {
            scan_warn!("dropping '{}': url {:?} is not absolute", record.title, record.url);
            summary.discarded += 1;
            continue;
        }
        if !is_unavailable(&record.description) {
            record.description = summarizer.summarize(&record.description);
        }
        if record.salary.trim().is_empty() {
            record.salary = UNAVAILABLE.to_string();
        }
        ready.push(record);
    }
    scan_info!("summarized {} of {total} new jobs", ready.len());

    summary.written = store.append(&ready)?;
    scan_info!(
        "appended {} jobs to {}",
        summary.written,
        store.path().display()
    );
    Ok(summary)
}
