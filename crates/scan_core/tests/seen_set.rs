use scan_core::{signature_of, JobRecord, SeenSet, UNAVAILABLE};

fn record(url: &str, title: &str, company: &str) -> JobRecord {
    let mut record = JobRecord::new(title, url);
    record.company = company.to_string();
    record
}

#[test]
fn url_and_signature_are_independent_axes() {
    let seen = SeenSet::from_records([&record("https://a.example/job/1", "Data Analyst", "Acme")]);

    assert!(seen.is_duplicate(&record("https://a.example/job/1", "Other", "Other")));
    assert!(seen.is_duplicate(&record("https://a.example/job/2", "data analyst", " ACME ")));
    assert!(!seen.is_duplicate(&record("https://a.example/job/3", "Data Analyst", "Globex")));
}

#[test]
fn sentinel_company_never_forms_a_signature() {
    assert_eq!(signature_of("Data Analyst", UNAVAILABLE), None);
    assert_eq!(signature_of("", "Acme"), None);

    let seen = SeenSet::from_records([&record("https://a.example/job/1", "Data Analyst", UNAVAILABLE)]);
    assert!(!seen.is_duplicate(&record("https://a.example/job/2", "Data Analyst", UNAVAILABLE)));
}

#[test]
fn blank_urls_are_not_tracked() {
    let mut seen = SeenSet::new();
    seen.insert_identity("  ", "t", "c");
    assert_eq!(seen.url_count(), 0);
    assert!(!seen.contains_url(""));
    assert!(!seen.is_empty());
}
