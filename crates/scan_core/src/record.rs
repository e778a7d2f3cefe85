use serde::{Deserialize, Serialize};
use url::Url;

/// Marker stored in place of data that could not be obtained.
pub const UNAVAILABLE: &str = "N/A";

/// Separator used when qualifications are flattened into a single cell.
pub const QUALIFICATION_SEPARATOR: &str = "; ";

/// True for blank values and the [`UNAVAILABLE`] sentinel.
pub fn is_unavailable(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == UNAVAILABLE
}

/// Returns the trimmed value, or the sentinel when there is nothing to keep.
pub fn or_unavailable(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => UNAVAILABLE.to_string(),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a card href against the site base and strip query and fragment.
///
/// Returns `None` for empty hrefs and anything that does not end up as an
/// absolute http(s) URL.
pub fn canonical_job_url(base: &Url, href: &str) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("javascript:") {
        return None;
    }
    let mut url = base.join(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Trim, drop empties and dedupe while keeping first-seen order.
pub fn dedupe_qualifications<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let cleaned = collapse_whitespace(item.as_ref());
        if cleaned.is_empty() || out.iter().any(|existing| existing == &cleaned) {
            continue;
        }
        out.push(cleaned);
    }
    out
}

/// Data readable from the static results list, before any click.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardSummary {
    pub title: String,
    /// Canonical absolute URL; empty when the card carried no usable link.
    pub url: String,
    pub company: String,
    pub location: String,
    /// Raw salary text shown on the card, if any.
    pub salary_text: String,
}

impl CardSummary {
    pub fn identity(&self) -> crate::CardIdentity {
        crate::CardIdentity {
            title: self.title.clone(),
            company: self.company.clone(),
        }
    }
}

/// Requirements a record must meet before it may be buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPolicy {
    pub require_company: bool,
}

/// One scraped job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub url: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub qualifications: Vec<String>,
    pub description: String,
    pub date_posted: String,
    pub scraped_at: String,
}

impl JobRecord {
    /// A record with every optional field set to the sentinel.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            company: UNAVAILABLE.to_string(),
            location: UNAVAILABLE.to_string(),
            salary: UNAVAILABLE.to_string(),
            qualifications: Vec::new(),
            description: UNAVAILABLE.to_string(),
            date_posted: UNAVAILABLE.to_string(),
            scraped_at: String::new(),
        }
    }

    /// Qualifications as stored in the output file.
    pub fn qualifications_joined(&self) -> String {
        if self.qualifications.is_empty() {
            UNAVAILABLE.to_string()
        } else {
            self.qualifications.join(QUALIFICATION_SEPARATOR)
        }
    }

    /// Inverse of [`JobRecord::qualifications_joined`].
    pub fn split_qualifications(cell: &str) -> Vec<String> {
        if is_unavailable(cell) {
            return Vec::new();
        }
        dedupe_qualifications(cell.split(';'))
    }

    /// The url must be a non-empty absolute http(s) URL.
    pub fn is_persistable(&self) -> bool {
        let url = self.url.trim();
        !url.is_empty()
            && Url::parse(url)
                .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
                .unwrap_or(false)
    }

    pub fn satisfies(&self, policy: &RecordPolicy) -> bool {
        self.is_persistable() && !(policy.require_company && is_unavailable(&self.company))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_href_is_resolved_and_query_dropped() {
        let base = Url::parse("https://www.simplyhired.ca").unwrap();
        assert_eq!(
            canonical_job_url(&base, "/job/abc123?q=data&tk=1#top").as_deref(),
            Some("https://www.simplyhired.ca/job/abc123")
        );
        assert_eq!(canonical_job_url(&base, "   "), None);
        assert_eq!(canonical_job_url(&base, "mailto:jobs@example.com"), None);
    }

    #[test]
    fn qualifications_dedupe_preserves_order() {
        let items = dedupe_qualifications(["SQL", " SQL ", "", "Python"]);
        assert_eq!(items, vec!["SQL", "Python"]);

        let mut record = JobRecord::new("t", "https://example.com/job/1");
        record.qualifications = items;
        assert_eq!(record.qualifications_joined(), "SQL; Python");
    }

    #[test]
    fn empty_qualifications_store_sentinel() {
        let record = JobRecord::new("t", "https://example.com/job/1");
        assert_eq!(record.qualifications_joined(), UNAVAILABLE);
        assert!(JobRecord::split_qualifications(UNAVAILABLE).is_empty());
    }

    #[test]
    fn relative_or_empty_urls_are_not_persistable() {
        assert!(!JobRecord::new("t", "").is_persistable());
        assert!(!JobRecord::new("t", "/job/1").is_persistable());
        assert!(JobRecord::new("t", "https://example.com/job/1").is_persistable());
    }

    #[test]
    fn company_policy_rejects_sentinel_company() {
        let record = JobRecord::new("t", "https://example.com/job/1");
        assert!(record.satisfies(&RecordPolicy::default()));
        assert!(!record.satisfies(&RecordPolicy {
            require_company: true
        }));
    }
}
