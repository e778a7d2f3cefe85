//! Scripted stand-in for a live results page.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use scan_core::{FilterConfig, RecordPolicy, RelevanceClassifier, ScanLimits, ScanState, SeenSet, SyncPolicy};
use scan_engine::{
    DriverSettings, PageSelectors, Provider, ResultsSession, ScanDriver, ScanError, SearchQuery,
    SelectorConfig, Timing,
};

pub const BASE: &str = "https://www.simplyhired.ca";
pub const NOW: &str = "2025-03-01 09:30:00";

#[derive(Debug, Clone, Default)]
pub struct FakeJob {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub card_salary: Option<String>,
    pub compensation: Option<String>,
    pub qualifications: Vec<String>,
    pub posted: Option<String>,
    pub description: String,
}

impl FakeJob {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            company: format!("Company {id}"),
            location: "Toronto, ON".to_string(),
            description: format!("Role {id}: build dashboards and models in python."),
            ..Self::default()
        }
    }

    pub fn url(&self) -> String {
        format!("{BASE}/job/{}", self.id)
    }

    fn card_html(&self) -> String {
        let salary = self
            .card_salary
            .as_ref()
            .map(|s| format!(r#"<span data-testid="searchSerpJobSalary">{s}</span>"#))
            .unwrap_or_default();
        format!(
            r#"<li><div class="SerpJob-jobCard css-1"><h2><a class="chakra-button jobTitle" href="/job/{id}?tk=abc">{title}</a></h2><span data-testid="companyName">{company}</span><span data-testid="searchSerpJobLocation">{location}</span>{salary}</div></li>"#,
            id = self.id,
            title = self.title,
            company = self.company,
            location = self.location,
        )
    }

    pub fn pane_html(&self) -> String {
        let compensation = self
            .compensation
            .as_ref()
            .map(|c| {
                format!(
                    r#"<div data-testid="viewJobBodyJobCompensation"><span>Pay</span><span data-testid="detailText">{c}</span></div>"#
                )
            })
            .unwrap_or_default();
        let quals: String = self
            .qualifications
            .iter()
            .map(|q| {
                format!(
                    r#"<li data-testid="viewJobQualificationItem"><span data-testid="detailText">{q}</span></li>"#
                )
            })
            .collect();
        let posted = self
            .posted
            .as_ref()
            .map(|p| format!(r#"<span data-testid="viewJobBodyJobPostingTimestamp">{p}</span>"#))
            .unwrap_or_default();
        format!(
            r#"<div data-testid="viewJobBodyContainer"><h2 data-testid="viewJobTitle">{title}</h2><span data-testid="viewJobCompanyName">{company}</span>{compensation}<ul>{quals}</ul>{posted}<div data-testid="viewJobBodyJobFullDescriptionContent"><p>{description}</p></div></div>"#,
            title = self.title,
            company = self.company,
            description = self.description,
        )
    }
}

#[derive(Debug, Default)]
pub struct FakeBoard {
    pub pages: Vec<Vec<FakeJob>>,
    pub page: usize,
    shown: Option<FakeJob>,
    selected: Option<FakeJob>,
    stale_left: u32,
    /// Reads after each click that still show the previous job.
    pub stale_reads: u32,
    /// Job ids whose pane never replaces the previous one.
    pub never_sync: HashSet<String>,
    /// After this many clicks every read fails as if the browser died.
    pub die_after_clicks: Option<usize>,
    /// After the first click the current page keeps only this many cards.
    pub shrink_to: Option<usize>,
    pub results_missing: bool,
    /// Markup served for isolated-tab loads, by canonical url.
    pub isolated: HashMap<String, String>,
    pub isolated_loads: usize,
    pub clicks: Vec<String>,
    pub navigations: Vec<String>,
    pub html_reads: usize,
}

impl FakeBoard {
    pub fn with_pages(pages: Vec<Vec<FakeJob>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn render(&self) -> String {
        let cards: String = self
            .pages
            .get(self.page)
            .map(|jobs| jobs.iter().map(FakeJob::card_html).collect())
            .unwrap_or_default();
        let pane = self.shown.as_ref().map(FakeJob::pane_html).unwrap_or_default();
        let next = if self.page + 1 < self.pages.len() {
            r##"<a aria-label="Next page" href="#">Next</a>"##
        } else {
            ""
        };
        format!(r#"<html><body><ul id="job-list">{cards}</ul>{pane}{next}</body></html>"#)
    }
}

impl ResultsSession for FakeBoard {
    fn navigate(&mut self, url: &str) -> Result<(), ScanError> {
        self.navigations.push(url.to_string());
        self.page = 0;
        self.shown = None;
        self.selected = None;
        Ok(())
    }

    fn wait_for(&mut self, css: &str, _timeout: Duration) -> Result<(), ScanError> {
        if self.results_missing {
            return Err(ScanError::ResultsMissing(css.to_string()));
        }
        Ok(())
    }

    fn html(&mut self) -> Result<String, ScanError> {
        self.html_reads += 1;
        if self
            .die_after_clicks
            .is_some_and(|limit| self.clicks.len() >= limit)
        {
            return Err(ScanError::Browser("connection is closed".into()));
        }
        if self.stale_left > 0 {
            self.stale_left -= 1;
        } else if let Some(selected) = &self.selected {
            if !self.never_sync.contains(&selected.id) {
                self.shown = Some(selected.clone());
            }
        }
        Ok(self.render())
    }

    fn click_card(&mut self, _card_css: &str, url: &str, index: usize) -> Result<(), ScanError> {
        let jobs = self.pages.get(self.page).cloned().unwrap_or_default();
        let job = jobs
            .iter()
            .find(|job| job.url() == url)
            .or_else(|| jobs.get(index))
            .cloned()
            .ok_or_else(|| ScanError::Click(url.to_string()))?;
        self.clicks.push(job.id.clone());
        self.selected = Some(job);
        self.stale_left = self.stale_reads;
        if let Some(keep) = self.shrink_to.take() {
            if let Some(jobs) = self.pages.get_mut(self.page) {
                jobs.truncate(keep);
            }
        }
        Ok(())
    }

    fn scroll_to_bottom(&mut self, _css: &str) -> Result<(), ScanError> {
        Ok(())
    }

    fn click_if_present(&mut self, _css: &str) -> Result<bool, ScanError> {
        if self.page + 1 < self.pages.len() {
            self.page += 1;
            self.shown = None;
            self.selected = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn isolated_html(
        &mut self,
        url: &str,
        ready_css: &[&str],
        _wait: Duration,
    ) -> Result<String, ScanError> {
        self.isolated_loads += 1;
        self.isolated
            .get(url)
            .cloned()
            .ok_or_else(|| ScanError::MissingElement(ready_css.join(" | ")))
    }
}

pub fn fast_settings() -> DriverSettings {
    DriverSettings {
        timing: Timing {
            sync: SyncPolicy {
                poll_interval: Duration::from_millis(300),
                max_polls: 6,
            },
            settle_delay: Duration::ZERO,
            description_attempts: 2,
            description_interval: Duration::ZERO,
            results_timeout: Duration::from_secs(1),
            page_delay: Duration::ZERO,
            card_jitter: Duration::ZERO..=Duration::ZERO,
            salary_retries: 2,
            salary_wait: Duration::ZERO,
        },
        strict_description: true,
        open_url_fallback: true,
    }
}

pub fn driver(board: FakeBoard, settings: DriverSettings) -> ScanDriver<FakeBoard> {
    scan_logging::initialize_for_tests();
    let selectors = PageSelectors::compile(&SelectorConfig::default()).unwrap();
    ScanDriver::new(board, selectors, settings, Provider::default())
        .unwrap()
        .with_sleeper(Arc::new(|_| {}))
        .with_clock(Arc::new(|| NOW.to_string()))
}

pub fn state(max_records: usize, max_pages: u32) -> ScanState {
    ScanState::new(
        RelevanceClassifier::new(FilterConfig::default()),
        RecordPolicy::default(),
        ScanLimits {
            max_records,
            max_pages_per_keyword: max_pages,
        },
        SeenSet::new(),
    )
}

pub fn query(keyword: &str) -> SearchQuery {
    SearchQuery {
        keyword: keyword.to_string(),
        location: "Toronto, ON".to_string(),
        radius: 50,
    }
}
