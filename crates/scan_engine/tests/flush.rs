use pretty_assertions::assert_eq;
use scan_core::{JobRecord, UNAVAILABLE};
use scan_engine::{flush, FlushSummary, JobStore, Layout, PassthroughSummarizer, Summarizer};
use tempfile::TempDir;

struct Shouting;

impl Summarizer for Shouting {
    fn summarize(&self, description: &str) -> String {
        description.to_uppercase()
    }
}

fn job(title: &str, url: &str, description: &str) -> JobRecord {
    let mut record = JobRecord::new(title, url);
    record.description = description.into();
    record.company = "Acme".into();
    record
}

#[test]
fn summarizes_and_appends_persistable_records() {
    let temp = TempDir::new().unwrap();
    let store = JobStore::new(temp.path().join("jobs.csv"), Layout::Standard);
    let records = vec![
        job("A", "https://www.simplyhired.ca/job/a", "python work"),
        job("B", "/job/relative", "sql work"),
        job("C", "https://www.simplyhired.ca/job/c", UNAVAILABLE),
    ];

    let summary = flush(records, &Shouting, &store).unwrap();

    assert_eq!(
        summary,
        FlushSummary {
            buffered: 3,
            discarded: 1,
            written: 2,
        }
    );
    let stored = store.load_records().unwrap();
    let descriptions: Vec<&str> = stored.iter().map(|r| r.description.as_str()).collect();
    assert_eq!(descriptions, vec!["PYTHON WORK", UNAVAILABLE]);
}

#[test]
fn empty_buffer_creates_no_file() {
    let temp = TempDir::new().unwrap();
    let store = JobStore::new(temp.path().join("jobs.csv"), Layout::Standard);

    let summary = flush(Vec::new(), &PassthroughSummarizer, &store).unwrap();

    assert_eq!(summary, FlushSummary::default());
    assert!(!store.path().exists());
}
