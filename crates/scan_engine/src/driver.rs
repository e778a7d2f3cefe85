use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use url::Url;

use scan_core::{
    is_unavailable, update, CardSummary, DetailFailure, Effect, EndReason, Msg, ScanState,
    SyncPolicy,
};
use scan_logging::{scan_debug, scan_info, scan_warn};

use crate::detail::{synchronize, DetailReader};
use crate::extract::{CardList, PageSelectors};
use crate::search::{Provider, SearchQuery};
use crate::{ErrorClass, ResultsSession, ScanError};

/// Blocking pause, injectable so tests run without real waits.
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;
/// Timestamp source for `scraped_at`.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn thread_sleeper() -> Sleeper {
    Arc::new(std::thread::sleep)
}

pub fn local_clock() -> Clock {
    Arc::new(|| chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    pub sync: SyncPolicy,
    /// Pause after scrolling the detail pane, before reading it.
    pub settle_delay: Duration,
    pub description_attempts: u32,
    pub description_interval: Duration,
    pub results_timeout: Duration,
    pub page_delay: Duration,
    pub card_jitter: RangeInclusive<Duration>,
    pub salary_retries: u32,
    pub salary_wait: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            sync: SyncPolicy::default(),
            settle_delay: Duration::from_millis(500),
            description_attempts: 5,
            description_interval: Duration::from_millis(1500),
            results_timeout: Duration::from_secs(10),
            page_delay: Duration::from_secs(3),
            card_jitter: Duration::from_millis(500)..=Duration::from_millis(1000),
            salary_retries: 3,
            salary_wait: Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub timing: Timing,
    pub strict_description: bool,
    pub open_url_fallback: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            strict_description: true,
            open_url_fallback: true,
        }
    }
}

/// How pagination of one keyword ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordEnd {
    Ended(EndReason),
    /// The record cap was reached.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordReport {
    pub keyword: String,
    pub pages: u32,
    pub end: KeywordEnd,
}

/// Drives one browser session through search result pages.
pub struct ScanDriver<S: ResultsSession> {
    session: S,
    selectors: PageSelectors,
    settings: DriverSettings,
    provider: Provider,
    base: Url,
    sleep: Sleeper,
    clock: Clock,
    previous_text: Option<String>,
    previous_description: Option<String>,
}

enum Flow {
    Continue,
    End(KeywordEnd),
}

impl<S: ResultsSession> ScanDriver<S> {
    pub fn new(
        session: S,
        selectors: PageSelectors,
        settings: DriverSettings,
        provider: Provider,
    ) -> Result<Self, ScanError> {
        let base = provider.base_url()?;
        Ok(Self {
            session,
            selectors,
            settings,
            provider,
            base,
            sleep: thread_sleeper(),
            clock: local_clock(),
            previous_text: None,
            previous_description: None,
        })
    }

    pub fn with_sleeper(mut self, sleep: Sleeper) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Paginate one keyword until a termination condition fires.
    ///
    /// Page-level failures end the keyword and are reported in the result;
    /// only fatal errors are returned as `Err`. `state` holds everything
    /// accepted so far on either path.
    pub fn scan_keyword(
        &mut self,
        state: &mut ScanState,
        query: &SearchQuery,
    ) -> Result<KeywordReport, ScanError> {
        let keyword = query.keyword.clone();
        self.previous_text = None;
        self.previous_description = None;
        let mut pages = 0;

        if let Flow::End(end) = self.apply(state, Msg::KeywordStarted(keyword.clone())) {
            return Ok(KeywordReport { keyword, pages, end });
        }
        scan_info!("=== searching: {keyword} ===");

        let url = self.provider.search_url(query)?;
        if let Err(err) = self.session.navigate(url.as_str()) {
            let end = self.page_failure(state, err)?;
            return Ok(KeywordReport { keyword, pages, end });
        }

        let mut page = 1;
        loop {
            pages = page;
            let end = match self.scan_page(state, page) {
                Ok(Flow::Continue) => {
                    page += 1;
                    continue;
                }
                Ok(Flow::End(end)) => end,
                Err(err) => self.page_failure(state, err)?,
            };
            scan_info!("keyword '{keyword}' finished after {pages} page(s): {end:?}");
            return Ok(KeywordReport { keyword, pages, end });
        }
    }

    fn scan_page(&mut self, state: &mut ScanState, page: u32) -> Result<Flow, ScanError> {
        let results_list = self.selectors.config().results_list.clone();
        self.session
            .wait_for(&results_list, self.settings.timing.results_timeout)?;

        let list = self.cards()?;
        scan_info!("page {page}: scanning {} cards", list.cards.len());
        if let Flow::End(end) = self.apply(
            state,
            Msg::PageLoaded {
                page,
                card_count: list.cards.len(),
            },
        ) {
            return Ok(Flow::End(end));
        }

        let mut index = 0;
        loop {
            // The list is re-read for every card; earlier clicks may have re-rendered it.
            let list = self.cards()?;
            let Some(card) = list.cards.get(index).cloned() else {
                break;
            };
            let effects = self.dispatch(state, Msg::CardListed { index, card: card.clone() });
            for effect in effects {
                match effect {
                    Effect::OpenDetail { .. } => {
                        self.open_detail(state, index, &card, &list)?;
                        self.jitter();
                    }
                    Effect::StopRun => return Ok(Flow::End(KeywordEnd::Stopped)),
                    other => report(&other),
                }
            }
            if state.is_stopped() {
                return Ok(Flow::End(KeywordEnd::Stopped));
            }
            index += 1;
        }

        let has_next = self.selectors.has_next_page(&self.session.html()?);
        let effects = self.dispatch(state, Msg::PageFinished { has_next });
        for effect in effects {
            match effect {
                Effect::AdvancePage => {
                    let next = self.selectors.config().next_page.clone();
                    if !self.session.click_if_present(&next)? {
                        return Ok(Flow::End(KeywordEnd::Ended(EndReason::LastPage)));
                    }
                    (self.sleep)(self.settings.timing.page_delay);
                    return Ok(Flow::Continue);
                }
                Effect::EndKeyword { reason } => return Ok(Flow::End(KeywordEnd::Ended(reason))),
                Effect::StopRun => return Ok(Flow::End(KeywordEnd::Stopped)),
                other => report(&other),
            }
        }
        Ok(Flow::End(KeywordEnd::Ended(EndReason::LastPage)))
    }

    fn open_detail(
        &mut self,
        state: &mut ScanState,
        index: usize,
        card: &CardSummary,
        list: &CardList,
    ) -> Result<(), ScanError> {
        let outcome = self.extract(card, index, list);
        let msg = match outcome {
            Ok(record) => {
                if !is_unavailable(&record.description) {
                    self.previous_description = Some(record.description.clone());
                }
                Msg::DetailExtracted(record)
            }
            Err(err) => match err.class() {
                ErrorClass::Fatal => {
                    // Release the pending card before propagating.
                    self.dispatch(
                        state,
                        Msg::DetailFailed {
                            reason: DetailFailure::Transient(err.to_string()),
                        },
                    );
                    return Err(err);
                }
                ErrorClass::SyncFailed => {
                    let ticks = match err {
                        ScanError::SyncFailed { ticks } => ticks,
                        _ => 0,
                    };
                    Msg::DetailFailed {
                        reason: DetailFailure::SyncFailed { ticks },
                    }
                }
                ErrorClass::Transient | ErrorClass::PageLevel => Msg::DetailFailed {
                    reason: DetailFailure::Transient(err.to_string()),
                },
            },
        };
        for effect in self.dispatch(state, msg) {
            report(&effect);
        }
        Ok(())
    }

    fn extract(
        &mut self,
        card: &CardSummary,
        index: usize,
        list: &CardList,
    ) -> Result<scan_core::JobRecord, ScanError> {
        self.session.click_card(&list.selector, &card.url, index)?;
        let snapshot = synchronize(
            &mut self.session,
            &self.selectors,
            card,
            self.previous_text.as_deref(),
            &self.settings,
            &self.sleep,
        )?;
        self.previous_text = Some(snapshot.text);

        let mut reader = DetailReader {
            session: &mut self.session,
            selectors: &self.selectors,
            settings: &self.settings,
            sleep: &self.sleep,
            clock: &self.clock,
        };
        reader.read(card, self.previous_description.as_deref())
    }

    fn cards(&mut self) -> Result<CardList, ScanError> {
        let html = self.session.html()?;
        Ok(self.selectors.cards(&html, &self.base))
    }

    fn jitter(&self) {
        let range = &self.settings.timing.card_jitter;
        let (low, high) = (range.start().as_millis(), range.end().as_millis());
        if high == 0 {
            return;
        }
        let millis = if low >= high {
            low
        } else {
            rand::thread_rng().gen_range(low..=high)
        };
        (self.sleep)(Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX)));
    }

    fn apply(&mut self, state: &mut ScanState, msg: Msg) -> Flow {
        for effect in self.dispatch(state, msg) {
            match effect {
                Effect::StopRun => return Flow::End(KeywordEnd::Stopped),
                Effect::EndKeyword { reason } => return Flow::End(KeywordEnd::Ended(reason)),
                other => report(&other),
            }
        }
        Flow::Continue
    }

    fn dispatch(&self, state: &mut ScanState, msg: Msg) -> Vec<Effect> {
        let current = std::mem::take(state);
        let (next, effects) = update(current, msg);
        *state = next;
        effects
    }

    /// Non-fatal errors end the keyword; fatal ones propagate.
    fn page_failure(&mut self, state: &mut ScanState, err: ScanError) -> Result<KeywordEnd, ScanError> {
        if err.is_fatal() {
            return Err(err);
        }
        scan_warn!("page error: {err}");
        match self.apply(state, Msg::PageFailed { reason: err.to_string() }) {
            Flow::End(end) => Ok(end),
            Flow::Continue => Ok(KeywordEnd::Ended(EndReason::PageError(err.to_string()))),
        }
    }
}

fn report(effect: &Effect) {
    match effect {
        Effect::Skipped { title, reason } => scan_info!("   [SKIP] {title} ({reason})"),
        Effect::Accepted {
            title,
            verified: true,
            ..
        } => scan_info!("   [VERIFIED] {title}"),
        Effect::Accepted { title, .. } => scan_info!("   [KEEP] {title}"),
        Effect::EndKeyword { reason } => scan_info!("keyword ended: {reason}"),
        Effect::StopRun => scan_info!("record cap reached"),
        Effect::OpenDetail { index, relevance } => {
            scan_debug!("opening card {index} ({})", relevance.as_str())
        }
        Effect::AdvancePage => scan_debug!("advancing page"),
    }
}
