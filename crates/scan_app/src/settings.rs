//! RON settings file. Every section and field is optional; missing values
//! fall back to the defaults below.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scan_core::{FilterConfig, RecordPolicy, ScanLimits, SyncPolicy};
use scan_engine::{
    BrowserOptions, DriverSettings, JobStore, Layout, Provider, SearchQuery, SelectorConfig,
    SummarizerSettings, Timing, VerifySettings, WriteMode,
};
use scan_logging::scan_info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings in {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid setting {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub output: StoreConfig,
    pub filters: FilterConfig,
    pub selectors: SelectorConfig,
    pub timing: TimingSettings,
    pub policy: RecordPolicy,
    pub browser: BrowserSettings,
    pub summarizer: SummarizerConfig,
    pub verify: VerifyConfig,
    pub gate: GateSettings,
    /// Scraped in order; the gate sits between consecutive providers.
    pub providers: Vec<Provider>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            output: StoreConfig::default(),
            filters: FilterConfig::default(),
            selectors: SelectorConfig::default(),
            timing: TimingSettings::default(),
            policy: RecordPolicy::default(),
            browser: BrowserSettings::default(),
            summarizer: SummarizerConfig::default(),
            verify: VerifyConfig::default(),
            gate: GateSettings::default(),
            providers: vec![Provider::default()],
        }
    }
}

impl Settings {
    /// Load `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                scan_info!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let settings: Settings = ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        settings.validate()?;
        scan_info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::Invalid {
                field: "providers",
                message: "at least one provider is required".into(),
            });
        }
        if self.search.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "search.keywords",
                message: "no non-empty keyword".into(),
            });
        }
        if self.search.max_pages_per_keyword == 0 {
            return Err(ConfigError::Invalid {
                field: "search.max_pages_per_keyword",
                message: "must be at least 1".into(),
            });
        }
        if self.timing.card_jitter_min_ms > self.timing.card_jitter_max_ms {
            return Err(ConfigError::Invalid {
                field: "timing.card_jitter_min_ms",
                message: "must not exceed card_jitter_max_ms".into(),
            });
        }
        Ok(())
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.search
            .keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|keyword| SearchQuery {
                keyword: keyword.trim().to_string(),
                location: self.search.location.clone(),
                radius: self.search.radius,
            })
            .collect()
    }

    pub fn limits(&self) -> ScanLimits {
        ScanLimits {
            max_records: self.search.max_records,
            max_pages_per_keyword: self.search.max_pages_per_keyword,
        }
    }

    pub fn driver(&self) -> DriverSettings {
        DriverSettings {
            timing: self.timing.to_timing(),
            strict_description: self.timing.strict_description,
            open_url_fallback: self.timing.open_url_fallback,
        }
    }

    pub fn store(&self) -> JobStore {
        JobStore::new(&self.output.file, self.output.layout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub keywords: Vec<String>,
    pub location: String,
    /// Search radius in the board's distance unit.
    pub radius: u32,
    pub max_records: usize,
    pub max_pages_per_keyword: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let limits = ScanLimits::default();
        Self {
            keywords: vec!["data scientist".to_string(), "data analyst".to_string()],
            location: "Toronto, ON".to_string(),
            radius: 50,
            max_records: limits.max_records,
            max_pages_per_keyword: limits.max_pages_per_keyword,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub file: PathBuf,
    pub layout: Layout,
    pub mode: WriteMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("simplyhired_final_cleaned.csv"),
            layout: Layout::Standard,
            mode: WriteMode::Append,
        }
    }
}

/// Delays in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub poll_interval_ms: u64,
    pub sync_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub description_attempts: u32,
    pub description_interval_ms: u64,
    pub results_timeout_ms: u64,
    pub page_delay_ms: u64,
    pub card_jitter_min_ms: u64,
    pub card_jitter_max_ms: u64,
    pub salary_retries: u32,
    pub salary_wait_ms: u64,
    /// Re-read a description identical to the previous card's.
    pub strict_description: bool,
    /// Load the job URL in its own tab when no salary was found.
    pub open_url_fallback: bool,
}

impl Default for TimingSettings {
    fn default() -> Self {
        let timing = Timing::default();
        let driver = DriverSettings::default();
        Self {
            poll_interval_ms: millis(timing.sync.poll_interval),
            sync_timeout_ms: 6_000,
            settle_delay_ms: millis(timing.settle_delay),
            description_attempts: timing.description_attempts,
            description_interval_ms: millis(timing.description_interval),
            results_timeout_ms: millis(timing.results_timeout),
            page_delay_ms: millis(timing.page_delay),
            card_jitter_min_ms: millis(*timing.card_jitter.start()),
            card_jitter_max_ms: millis(*timing.card_jitter.end()),
            salary_retries: timing.salary_retries,
            salary_wait_ms: millis(timing.salary_wait),
            strict_description: driver.strict_description,
            open_url_fallback: driver.open_url_fallback,
        }
    }
}

impl TimingSettings {
    pub fn to_timing(&self) -> Timing {
        let ms = Duration::from_millis;
        Timing {
            sync: SyncPolicy::from_timeout(ms(self.poll_interval_ms), ms(self.sync_timeout_ms)),
            settle_delay: ms(self.settle_delay_ms),
            description_attempts: self.description_attempts,
            description_interval: ms(self.description_interval_ms),
            results_timeout: ms(self.results_timeout_ms),
            page_delay: ms(self.page_delay_ms),
            card_jitter: ms(self.card_jitter_min_ms)..=ms(self.card_jitter_max_ms),
            salary_retries: self.salary_retries,
            salary_wait: ms(self.salary_wait_ms),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
    pub idle_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        let options = BrowserOptions::default();
        Self {
            headless: false,
            window_width: options.window_size.0,
            window_height: options.window_size.1,
            user_agent: None,
            idle_timeout_secs: options.idle_timeout.as_secs(),
        }
    }
}

impl BrowserSettings {
    pub fn to_options(&self) -> BrowserOptions {
        let defaults = BrowserOptions::default();
        BrowserOptions {
            headless: self.headless,
            window_size: (self.window_width, self.window_height),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

/// Without an `endpoint`, descriptions are stored as scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub endpoint: Option<String>,
    /// Environment variable holding the endpoint's bearer token.
    pub token_env: String,
    pub timeout_ms: u64,
    pub min_words: usize,
    pub chunk_words: usize,
    pub chunk_max_tokens: u32,
    pub final_max_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        let settings = SummarizerSettings::default();
        Self {
            endpoint: None,
            token_env: "HF_TOKEN".to_string(),
            timeout_ms: 60_000,
            min_words: settings.min_words,
            chunk_words: settings.chunk_words,
            chunk_max_tokens: settings.chunk_max_tokens,
            final_max_tokens: settings.final_max_tokens,
        }
    }
}

impl SummarizerConfig {
    pub fn to_settings(&self) -> SummarizerSettings {
        SummarizerSettings {
            min_words: self.min_words,
            chunk_words: self.chunk_words,
            chunk_max_tokens: self.chunk_max_tokens,
            final_max_tokens: self.final_max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub concurrency: usize,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_body_bytes: usize,
    pub expired_markers: Vec<String>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        let settings = VerifySettings::default();
        Self {
            concurrency: settings.concurrency,
            connect_timeout_ms: millis(settings.connect_timeout),
            request_timeout_ms: millis(settings.request_timeout),
            max_body_bytes: settings.max_body_bytes,
            expired_markers: settings.expired_markers,
        }
    }
}

impl VerifyConfig {
    pub fn to_settings(&self) -> VerifySettings {
        VerifySettings {
            concurrency: self.concurrency,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_body_bytes: self.max_body_bytes,
            expired_markers: self.expired_markers.clone(),
            ..VerifySettings::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub enabled: bool,
    /// Also ask before the first provider, e.g. to log in first.
    pub before_first: bool,
}
