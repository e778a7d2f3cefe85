//! Liveness pass over a stored output file: every URL is fetched, dead
//! postings are dropped and the file is rewritten in place.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::{stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use scan_logging::{scan_debug, scan_info, scan_warn};
use thiserror::Error;

use scan_core::is_unavailable;

use crate::decode::decode_body;
use crate::persist::{write_backup, PersistError};
use crate::store::{JobStore, StoreError, StoredRows};

#[derive(Debug, Clone)]
pub struct VerifySettings {
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Bodies beyond this size are only partially searched for markers.
    pub max_body_bytes: usize,
    /// Case-insensitive phrases marking a posting that has been taken down.
    pub expired_markers: Vec<String>,
    pub user_agent: String,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(20),
            max_body_bytes: 2 * 1024 * 1024,
            expired_markers: vec![
                "this job has expired".to_string(),
                "job is no longer available".to_string(),
                "no longer accepting applications".to_string(),
                "this job posting is no longer active".to_string(),
            ],
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadReason {
    InvalidUrl,
    Status(u16),
    Timeout,
    Network(String),
    Expired(String),
}

impl fmt::Display for DeadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadReason::InvalidUrl => write!(f, "invalid url"),
            DeadReason::Status(code) => write!(f, "http status {code}"),
            DeadReason::Timeout => write!(f, "timeout"),
            DeadReason::Network(message) => write!(f, "network error: {message}"),
            DeadReason::Expired(marker) => write!(f, "page says {marker:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead(DeadReason),
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        matches!(self, Liveness::Alive)
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("http client: {0}")]
    Client(String),
    #[error("async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyReport {
    pub checked: usize,
    pub removed: Vec<(String, DeadReason)>,
    pub kept: usize,
    /// Copy of the file as it was before dead rows were dropped.
    pub backup: Option<PathBuf>,
}

#[async_trait::async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Liveness;
}

#[derive(Debug, Clone)]
pub struct LivenessChecker {
    client: reqwest::Client,
    settings: VerifySettings,
}

impl LivenessChecker {
    pub fn new(settings: VerifySettings) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| VerifyError::Client(err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &VerifySettings {
        &self.settings
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String, reqwest::Error> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let mut bytes = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            let room = self.settings.max_body_bytes.saturating_sub(bytes.len());
            bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if bytes.len() >= self.settings.max_body_bytes {
                break;
            }
        }
        Ok(decode_body(&bytes, content_type.as_deref()).text)
    }
}

#[async_trait::async_trait]
impl LinkProbe for LivenessChecker {
    async fn probe(&self, url: &str) -> Liveness {
        let parsed = match reqwest::Url::parse(url.trim()) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            _ => return Liveness::Dead(DeadReason::InvalidUrl),
        };
        let response = match self.client.get(parsed).send().await {
            Ok(response) => response,
            Err(err) => return Liveness::Dead(classify(err)),
        };
        let status = response.status();
        if !status.is_success() {
            return Liveness::Dead(DeadReason::Status(status.as_u16()));
        }
        let body = match self.read_body(response).await {
            Ok(body) => body.to_lowercase(),
            Err(err) => return Liveness::Dead(classify(err)),
        };
        self.settings
            .expired_markers
            .iter()
            .find(|marker| !marker.trim().is_empty() && body.contains(&marker.to_lowercase()))
            .map_or(Liveness::Alive, |marker| {
                Liveness::Dead(DeadReason::Expired(marker.clone()))
            })
    }
}

fn classify(err: reqwest::Error) -> DeadReason {
    if err.is_timeout() {
        DeadReason::Timeout
    } else {
        DeadReason::Network(err.to_string())
    }
}

/// Probe `urls` with at most `concurrency` requests in flight; results keep input order.
pub async fn check_all<P: LinkProbe + ?Sized>(
    probe: &P,
    urls: &[String],
    concurrency: usize,
) -> Vec<Liveness> {
    stream::iter(urls.iter().map(|url| probe.probe(url)))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Drop rows whose URL is dead and rewrite the file.
///
/// The pre-clean file is copied to `<name>.backup.<ext>` only when at least
/// one row is removed; otherwise the file is left untouched.
pub async fn verify_store<P: LinkProbe + ?Sized>(
    store: &JobStore,
    probe: &P,
    concurrency: usize,
) -> Result<VerifyReport, VerifyError> {
    let mut report = VerifyReport::default();
    if !store.path().exists() {
        scan_warn!("nothing to verify: {} does not exist", store.path().display());
        return Ok(report);
    }
    let stored = store.read_rows()?;
    let url_column = stored.column("url").ok_or_else(|| StoreError::MissingColumn {
        path: store.path().to_path_buf(),
        column: "url".into(),
    })?;
    let urls: Vec<String> = stored
        .rows
        .iter()
        .map(|row| row.get(url_column).cloned().unwrap_or_default())
        .collect();

    scan_info!("checking {} urls ({} at a time)", urls.len(), concurrency.max(1));
    let results = check_all(probe, &urls, concurrency).await;
    report.checked = urls.len();

    let mut kept = StoredRows {
        headers: stored.headers.clone(),
        rows: Vec::with_capacity(stored.rows.len()),
    };
    for ((row, url), liveness) in stored.rows.iter().zip(&urls).zip(results) {
        match liveness {
            Liveness::Alive => kept.rows.push(row.clone()),
            Liveness::Dead(reason) => {
                let shown = if is_unavailable(url) { "<missing>" } else { url.as_str() };
                scan_info!("   [DEAD] {shown} ({reason})");
                report.removed.push((url.clone(), reason));
            }
        }
    }
    report.kept = kept.rows.len();

    if report.removed.is_empty() {
        scan_debug!("all urls alive; file left unchanged");
        return Ok(report);
    }
    report.backup = Some(write_backup(store.path())?);
    store.rewrite(&kept)?;
    scan_info!(
        "removed {} dead rows, kept {}",
        report.removed.len(),
        report.kept
    );
    Ok(report)
}

/// Blocking entry point: owns a tokio runtime for the duration of the pass.
pub fn verify_file(store: &JobStore, settings: VerifySettings) -> Result<VerifyReport, VerifyError> {
    let runtime = tokio::runtime::Runtime::new().map_err(VerifyError::Runtime)?;
    let concurrency = settings.concurrency;
    let checker = LivenessChecker::new(settings)?;
    runtime.block_on(verify_store(store, &checker, concurrency))
}
