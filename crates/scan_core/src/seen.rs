use std::collections::HashSet;

use crate::record::{is_unavailable, JobRecord};

/// Lowercased `(title, company)` pair used as a secondary duplicate key.
pub type Signature = (String, String);

/// Signature for a title/company pair; `None` when either side is unknown.
pub fn signature_of(title: &str, company: &str) -> Option<Signature> {
    if is_unavailable(title) || is_unavailable(company) {
        return None;
    }
    Some((title.trim().to_lowercase(), company.trim().to_lowercase()))
}

/// Identifiers of every job already persisted or accepted during this run.
///
/// Insert-only: a run never forgets a job it has seen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeenSet {
    urls: HashSet<String>,
    signatures: HashSet<Signature>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a JobRecord>) -> Self {
        let mut seen = Self::new();
        for record in records {
            seen.insert(record);
        }
        seen
    }

    pub fn contains_url(&self, url: &str) -> bool {
        let url = url.trim();
        !url.is_empty() && self.urls.contains(url)
    }

    pub fn contains_signature(&self, title: &str, company: &str) -> bool {
        signature_of(title, company).is_some_and(|sig| self.signatures.contains(&sig))
    }

    /// A record matching either identity axis is a duplicate.
    pub fn is_duplicate(&self, record: &JobRecord) -> bool {
        self.contains_url(&record.url) || self.contains_signature(&record.title, &record.company)
    }

    pub fn insert(&mut self, record: &JobRecord) {
        self.insert_identity(&record.url, &record.title, &record.company);
    }

    /// Register identifiers without a full record, e.g. when loading prior output.
    pub fn insert_identity(&mut self, url: &str, title: &str, company: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.urls.insert(url.to_string());
        }
        if let Some(sig) = signature_of(title, company) {
            self.signatures.insert(sig);
        }
    }

    pub fn url_count(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.signatures.is_empty()
    }
}
