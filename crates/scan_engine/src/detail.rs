//! Detail-pane handling for one clicked card: wait until the pane shows that
//! card, then read each field through its own fallback chain.

use std::cell::RefCell;

use scan_core::{
    dedupe_qualifications, is_unavailable, normalize_salary, or_unavailable, run_sync,
    CardSummary, CardSynchronizer, JobRecord, PaneSnapshot, SyncState, UNAVAILABLE,
};
use scan_logging::{scan_debug, scan_warn};

use crate::driver::{Clock, DriverSettings, Sleeper};
use crate::extract::{DetailFields, PageSelectors};
use crate::{ResultsSession, ScanError};

/// Poll the pane until it can be attributed to `card`.
///
/// Read failures count as unsynced ticks; a fatal one stops polling and is returned.
pub fn synchronize<S: ResultsSession>(
    session: &mut S,
    selectors: &PageSelectors,
    card: &CardSummary,
    previous_text: Option<&str>,
    settings: &DriverSettings,
    sleep: &Sleeper,
) -> Result<PaneSnapshot, ScanError> {
    let mut machine = CardSynchronizer::new(
        card.identity(),
        previous_text.map(str::to_string),
        settings.timing.sync,
    );
    let fatal: RefCell<Option<ScanError>> = RefCell::new(None);
    let mut last = PaneSnapshot::default();

    let state = run_sync(
        &mut machine,
        || {
            if fatal.borrow().is_some() {
                return None;
            }
            match session.html() {
                Ok(html) => {
                    let snapshot = selectors.pane_snapshot(&html)?;
                    last = snapshot.clone();
                    Some(snapshot)
                }
                Err(err) if err.is_fatal() => {
                    *fatal.borrow_mut() = Some(err);
                    None
                }
                Err(err) => {
                    scan_debug!("pane read failed: {err}");
                    None
                }
            }
        },
        |interval| {
            if fatal.borrow().is_none() {
                sleep(interval);
            }
        },
    );

    if let Some(err) = fatal.into_inner() {
        return Err(err);
    }
    match state {
        SyncState::Synced { ticks } => {
            scan_debug!("pane synced for '{}' after {ticks} polls", card.title);
            Ok(last)
        }
        SyncState::SyncFailed { ticks } => Err(ScanError::SyncFailed { ticks }),
        other => Err(ScanError::Script(format!("sync stopped in {other:?}"))),
    }
}

/// Reads a synced pane into a [`JobRecord`].
pub struct DetailReader<'a, S: ResultsSession> {
    pub session: &'a mut S,
    pub selectors: &'a PageSelectors,
    pub settings: &'a DriverSettings,
    pub sleep: &'a Sleeper,
    pub clock: &'a Clock,
}

impl<S: ResultsSession> DetailReader<'_, S> {
    /// `previous_description` is the description of the last extracted card.
    pub fn read(
        &mut self,
        card: &CardSummary,
        previous_description: Option<&str>,
    ) -> Result<JobRecord, ScanError> {
        let container = self.selectors.config().detail_container.clone();
        if let Err(err) = self.session.scroll_to_bottom(&container) {
            if err.is_fatal() {
                return Err(err);
            }
            scan_debug!("detail scroll skipped: {err}");
        }
        (self.sleep)(self.settings.timing.settle_delay);

        let fields = self.fields_with_fresh_description(previous_description)?;

        let mut record = JobRecord::new(card.title.clone(), card.url.clone());
        record.description = match &fields.description {
            Some(text) if !is_unavailable(text) => text.clone(),
            _ => UNAVAILABLE.to_string(),
        };
        record.company = or_unavailable(fields.company.as_deref().or(Some(card.company.as_str())));
        record.location = or_unavailable(fields.location.as_deref().or(Some(card.location.as_str())));
        record.date_posted = or_unavailable(fields.date_posted.as_deref());
        record.qualifications = dedupe_qualifications(&fields.qualifications);
        record.salary = self.salary(card, &fields)?;
        record.scraped_at = (self.clock)();
        Ok(record)
    }

    /// In strict mode a description equal to the previous card's is treated as
    /// stale and re-read until it changes or the attempts run out.
    fn fields_with_fresh_description(
        &mut self,
        previous: Option<&str>,
    ) -> Result<DetailFields, ScanError> {
        let mut fields = self.selectors.detail(&self.session.html()?);
        let previous = match previous {
            Some(text) if self.settings.strict_description && !is_unavailable(text) => text,
            _ => return Ok(fields),
        };

        let timing = &self.settings.timing;
        for attempt in 0..timing.description_attempts {
            match &fields.description {
                Some(text) if text != previous => return Ok(fields),
                _ => {}
            }
            scan_debug!("description unchanged, retry {}", attempt + 1);
            (self.sleep)(timing.description_interval);
            fields = self.selectors.detail(&self.session.html()?);
        }

        if fields.description.as_deref() == Some(previous) {
            scan_warn!("description never changed from the previous card");
            fields.description = None;
        }
        Ok(fields)
    }

    fn salary(&mut self, card: &CardSummary, fields: &DetailFields) -> Result<String, ScanError> {
        let chain = [
            fields.compensation.as_deref(),
            Some(fields.pane_text.as_str()),
            Some(card.salary_text.as_str()),
        ];
        for source in chain {
            let salary = normalize_salary(source);
            if !is_unavailable(&salary) {
                return Ok(salary);
            }
        }

        if self.settings.open_url_fallback && !card.url.is_empty() {
            return self.salary_from_isolated_page(&card.url);
        }
        Ok(UNAVAILABLE.to_string())
    }

    fn salary_from_isolated_page(&mut self, url: &str) -> Result<String, ScanError> {
        let config = self.selectors.config();
        let ready = [config.compensation.as_str(), config.detail_container.as_str()];
        let timing = &self.settings.timing;

        for attempt in 1..=timing.salary_retries {
            match self.session.isolated_html(url, &ready, timing.salary_wait) {
                Ok(html) => {
                    let fields = self.selectors.detail(&html);
                    let salary = normalize_salary(fields.compensation.as_deref());
                    if is_unavailable(&salary) {
                        return Ok(normalize_salary(Some(&fields.pane_text)));
                    }
                    return Ok(salary);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    scan_debug!("salary page attempt {attempt} failed: {err}");
                }
            }
        }
        Ok(UNAVAILABLE.to_string())
    }
}
