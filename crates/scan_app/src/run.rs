use anyhow::{Context, Result};
use std::time::Duration;

use scan_core::{RelevanceClassifier, ScanState};
use scan_engine::{
    flush, verify_file, ChromeSession, ChunkedSummarizer, DriverSettings, HttpTextModel,
    KeywordEnd, PageSelectors, PassthroughSummarizer, Provider, ResultsSession, ScanDriver,
    SearchQuery, Summarizer, WriteMode,
};
use scan_logging::{scan_error, scan_info, scan_warn};

use crate::cli::{ScanArgs, VerifyArgs};
use crate::gate::{Gate, TerminalGate};
use crate::settings::{GateSettings, Settings, SummarizerConfig};

/// Why the provider loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Completed,
    CapReached,
    Declined,
}

pub fn scan(args: ScanArgs) -> Result<()> {
    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    apply_overrides(&mut settings, &args);
    settings.validate()?;

    let store = settings.store();
    let mode = if args.fresh {
        WriteMode::Fresh
    } else {
        settings.output.mode
    };
    store
        .prepare(mode)
        .with_context(|| format!("preparing {}", store.path().display()))?;
    let seen = store.load_seen().context("loading previously saved jobs")?;
    scan_info!("{} jobs already saved in {}", seen.url_count(), store.path().display());

    let selectors = PageSelectors::compile(&settings.selectors)?;
    let mut state = ScanState::new(
        RelevanceClassifier::new(settings.filters.clone()),
        settings.policy,
        settings.limits(),
        seen,
    );

    // run_providers consumes the session, so the browser is closed before flushing.
    let browser = settings.browser.to_options();
    let mut gate = TerminalGate {
        idle_limit: browser.idle_timeout,
    };
    let outcome = match ChromeSession::launch(&browser) {
        Ok(session) => run_providers(
            session,
            &selectors,
            &settings.driver(),
            &settings.providers,
            &settings.queries(),
            settings.gate,
            &mut gate,
            &mut state,
        ),
        Err(err) => Err(err.into()),
    };

    let summary = state.summary();
    let summarizer = build_summarizer(&settings.summarizer);
    let flushed = flush(state.into_buffer(), summarizer.as_ref(), &store)
        .with_context(|| format!("writing {}", store.path().display()))?;

    scan_info!(
        "run finished: {} pages, {} cards, {} opened, {} skipped, {} duplicates, {} unsynced",
        summary.pages,
        summary.cards,
        summary.opened,
        summary.skipped,
        summary.duplicates,
        summary.sync_failures
    );
    scan_info!(
        "saved {} new jobs to {} ({} discarded)",
        flushed.written,
        store.path().display(),
        flushed.discarded
    );

    match outcome {
        Ok(end) => {
            scan_info!("scrape ended: {end:?}");
            Ok(())
        }
        Err(err) => {
            scan_error!("scrape aborted: {err:#}");
            Err(err)
        }
    }
}

fn apply_overrides(settings: &mut Settings, args: &ScanArgs) {
    if let Some(max) = args.max_records {
        settings.search.max_records = max;
    }
    if let Some(max) = args.max_pages {
        settings.search.max_pages_per_keyword = max;
    }
    if !args.keywords.is_empty() {
        settings.search.keywords = args.keywords.clone();
    }
    if let Some(headless) = args.headless {
        settings.browser.headless = headless;
    }
    if args.fresh {
        settings.output.mode = WriteMode::Fresh;
    }
}

/// Scrape every provider in turn with one browser session.
///
/// With the gate enabled the operator confirms before each provider after the
/// first (and before the first with `before_first`). Declining ends the loop.
#[allow(clippy::too_many_arguments)]
pub fn run_providers<S: ResultsSession>(
    session: S,
    selectors: &PageSelectors,
    settings: &DriverSettings,
    providers: &[Provider],
    queries: &[SearchQuery],
    gate_settings: GateSettings,
    gate: &mut dyn Gate,
    state: &mut ScanState,
) -> Result<RunEnd> {
    let mut session = session;
    for (index, provider) in providers.iter().enumerate() {
        let ask = gate_settings.enabled && (index > 0 || gate_settings.before_first);
        if ask && !gate.confirm(&provider.name)? {
            scan_warn!("operator declined {}; skipping remaining providers", provider.name);
            return Ok(RunEnd::Declined);
        }

        scan_info!("--- provider: {} ---", provider.name);
        let mut driver =
            ScanDriver::new(session, selectors.clone(), settings.clone(), provider.clone())?;
        for query in queries {
            let report = driver.scan_keyword(state, query)?;
            if report.end == KeywordEnd::Stopped {
                return Ok(RunEnd::CapReached);
            }
        }
        session = driver.into_session();
    }
    Ok(RunEnd::Completed)
}

fn build_summarizer(config: &SummarizerConfig) -> Box<dyn Summarizer> {
    let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) else {
        return Box::new(PassthroughSummarizer);
    };
    let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());
    if token.is_none() {
        scan_warn!("{} is not set; calling {endpoint} without a token", config.token_env);
    }
    let built = HttpTextModel::new(endpoint, token, Duration::from_millis(config.timeout_ms))
        .map_err(anyhow::Error::from)
        .and_then(|model| {
            ChunkedSummarizer::new(model, config.to_settings()).map_err(anyhow::Error::from)
        });
    match built {
        Ok(summarizer) => Box::new(summarizer),
        Err(err) => {
            scan_warn!("summarizer unavailable, keeping full descriptions: {err:#}");
            Box::new(PassthroughSummarizer)
        }
    }
}

pub fn verify(args: VerifyArgs) -> Result<()> {
    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(file) = &args.file {
        settings.output.file = file.clone();
    }
    let mut verify = settings.verify.to_settings();
    if let Some(concurrency) = args.concurrency {
        verify.concurrency = concurrency;
    }

    let store = settings.store();
    let report = verify_file(&store, verify)
        .with_context(|| format!("verifying {}", store.path().display()))?;
    scan_info!(
        "checked {} jobs: kept {}, removed {}",
        report.checked,
        report.kept,
        report.removed.len()
    );
    if let Some(backup) = &report.backup {
        scan_info!("previous file saved as {}", backup.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scan_core::{RecordPolicy, ScanLimits, SeenSet};
    use scan_engine::{ScanError, SelectorConfig};
    use std::collections::VecDeque;

    /// A board whose searches never return results.
    struct EmptyBoard;

    impl ResultsSession for EmptyBoard {
        fn navigate(&mut self, _url: &str) -> Result<(), ScanError> {
            Ok(())
        }
        fn wait_for(&mut self, _css: &str, _timeout: Duration) -> Result<(), ScanError> {
            Ok(())
        }
        fn html(&mut self) -> Result<String, ScanError> {
            Ok(r#"<html><body><ul id="job-list"></ul></body></html>"#.to_string())
        }
        fn click_card(&mut self, _css: &str, url: &str, _index: usize) -> Result<(), ScanError> {
            Err(ScanError::Click(url.to_string()))
        }
        fn scroll_to_bottom(&mut self, _css: &str) -> Result<(), ScanError> {
            Ok(())
        }
        fn click_if_present(&mut self, _css: &str) -> Result<bool, ScanError> {
            Ok(false)
        }
        fn isolated_html(
            &mut self,
            _url: &str,
            ready_css: &[&str],
            _wait: Duration,
        ) -> Result<String, ScanError> {
            Err(ScanError::MissingElement(ready_css.join(" | ")))
        }
    }

    struct ScriptedGate {
        answers: VecDeque<bool>,
        asked: Vec<String>,
    }

    impl Gate for ScriptedGate {
        fn confirm(&mut self, provider: &str) -> Result<bool> {
            self.asked.push(provider.to_string());
            Ok(self.answers.pop_front().unwrap_or(false))
        }
    }

    fn providers() -> Vec<Provider> {
        let second = Provider {
            name: "mirror".into(),
            base_url: "https://jobs.example.com".into(),
            ..Provider::default()
        };
        vec![Provider::default(), second]
    }

    fn run(gate_settings: GateSettings, answers: &[bool]) -> (RunEnd, Vec<String>, usize) {
        let selectors = PageSelectors::compile(&SelectorConfig::default()).unwrap();
        let mut gate = ScriptedGate {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        };
        let mut state = ScanState::new(
            RelevanceClassifier::default(),
            RecordPolicy::default(),
            ScanLimits::default(),
            SeenSet::new(),
        );
        let query = SearchQuery {
            keyword: "data scientist".into(),
            location: "Toronto, ON".into(),
            radius: 50,
        };
        let mut settings = DriverSettings::default();
        settings.timing.card_jitter = Duration::ZERO..=Duration::ZERO;
        settings.timing.page_delay = Duration::ZERO;

        let end = run_providers(
            EmptyBoard,
            &selectors,
            &settings,
            &providers(),
            &[query],
            gate_settings,
            &mut gate,
            &mut state,
        )
        .unwrap();
        (end, gate.asked, state.summary().keywords)
    }

    #[test]
    fn without_gate_every_provider_runs() {
        let (end, asked, keywords) = run(GateSettings::default(), &[]);
        assert_eq!(end, RunEnd::Completed);
        assert!(asked.is_empty());
        assert_eq!(keywords, 2);
    }

    #[test]
    fn gate_asks_between_providers_and_decline_stops() {
        let gate = GateSettings {
            enabled: true,
            before_first: false,
        };
        let (end, asked, keywords) = run(gate, &[false]);
        assert_eq!(end, RunEnd::Declined);
        assert_eq!(asked, vec!["mirror"]);
        assert_eq!(keywords, 1);
    }

    #[test]
    fn gate_before_first_asks_for_every_provider() {
        let gate = GateSettings {
            enabled: true,
            before_first: true,
        };
        let (end, asked, _) = run(gate, &[true, true]);
        assert_eq!(end, RunEnd::Completed);
        assert_eq!(asked, vec!["simplyhired", "mirror"]);
    }
}
