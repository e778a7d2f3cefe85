use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scan_core::{is_unavailable, or_unavailable, JobRecord, SeenSet, UNAVAILABLE};
use scan_logging::scan_warn;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("csv error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: String },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Column set of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    /// title, url, company, description, salary, qualifications, scraped_at
    #[default]
    Standard,
    /// Standard plus location and date_posted after company.
    Extended,
}

impl Layout {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Layout::Standard => &[
                "title",
                "url",
                "company",
                "description",
                "salary",
                "qualifications",
                "scraped_at",
            ],
            Layout::Extended => &[
                "title",
                "url",
                "company",
                "location",
                "date_posted",
                "description",
                "salary",
                "qualifications",
                "scraped_at",
            ],
        }
    }
}

/// Cell for a header name; unknown columns get the sentinel.
fn cell(record: &JobRecord, column: &str) -> String {
    match column {
        "title" => record.title.clone(),
        "url" => record.url.clone(),
        "company" => record.company.clone(),
        "location" => record.location.clone(),
        "date_posted" => record.date_posted.clone(),
        "description" => record.description.clone(),
        "salary" => or_unavailable(Some(record.salary.as_str())),
        "qualifications" => record.qualifications_joined(),
        "scraped_at" => record.scraped_at.clone(),
        _ => UNAVAILABLE.to_string(),
    }
}

/// How a run treats an existing output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    /// Keep prior rows, skip jobs already in them, append new ones.
    #[default]
    Append,
    /// Truncate at run start.
    Fresh,
}

/// A file read back with its header, for rewriting without losing columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredRows {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StoredRows {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

/// CSV-backed job output.
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
    layout: Layout,
}

impl JobStore {
    pub fn new(path: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Apply the run mode before scraping: `Fresh` removes the file.
    pub fn prepare(&self, mode: WriteMode) -> Result<(), StoreError> {
        if mode == WriteMode::Fresh && self.path.exists() {
            fs::remove_file(&self.path).map_err(|source| self.io(source))?;
        }
        Ok(())
    }

    /// Identifiers of every stored job; empty when the file does not exist.
    pub fn load_seen(&self) -> Result<SeenSet, StoreError> {
        let mut seen = SeenSet::new();
        if !self.path.exists() {
            return Ok(seen);
        }
        let stored = self.read_rows()?;
        if stored.headers.is_empty() {
            return Ok(seen);
        }
        let url = stored.column("url").ok_or_else(|| StoreError::MissingColumn {
            path: self.path.clone(),
            column: "url".into(),
        })?;
        let title = stored.column("title");
        let company = stored.column("company");
        let cell = |row: &Vec<String>, idx: Option<usize>| -> String {
            idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
        };
        for row in &stored.rows {
            let mut url_value = cell(row, Some(url));
            if is_unavailable(&url_value) {
                url_value.clear();
            }
            seen.insert_identity(&url_value, &cell(row, title), &cell(row, company));
        }
        Ok(seen)
    }

    /// Read every stored record; columns missing from the file become the sentinel.
    pub fn load_records(&self) -> Result<Vec<JobRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let stored = self.read_rows()?;
        let get = |row: &Vec<String>, name: &str| -> String {
            stored
                .column(name)
                .and_then(|i| row.get(i))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| UNAVAILABLE.to_string())
        };
        Ok(stored
            .rows
            .iter()
            .map(|row| {
                let mut record = JobRecord::new(get(row, "title"), get(row, "url"));
                record.company = get(row, "company");
                record.location = get(row, "location");
                record.date_posted = get(row, "date_posted");
                record.description = get(row, "description");
                record.salary = get(row, "salary");
                record.qualifications = JobRecord::split_qualifications(&get(row, "qualifications"));
                record.scraped_at = get(row, "scraped_at");
                record
            })
            .collect())
    }

    /// Append `records`, writing the header only when the file is absent or empty.
    ///
    /// Rows follow the existing file's header, not `layout`, so an append never
    /// shifts columns under an older header.
    pub fn append(&self, records: &[JobRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io(source))?;
        }
        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        let columns: Vec<String> = if needs_header {
            self.layout.columns().iter().map(|c| c.to_string()).collect()
        } else {
            self.existing_columns()?
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io(source))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer
                .write_record(&columns)
                .map_err(|source| self.csv(source))?;
        }
        for record in records {
            let row: Vec<String> = columns
                .iter()
                .map(|column| cell(record, column))
                .collect();
            writer.write_record(&row).map_err(|source| self.csv(source))?;
        }
        writer
            .flush()
            .map_err(|source| self.io(source))?;
        Ok(records.len())
    }

    pub fn read_rows(&self) -> Result<StoredRows, StoreError> {
        read_rows(&self.path)
    }

    /// Header of a non-empty file, normalized for `cell` lookups.
    fn existing_columns(&self) -> Result<Vec<String>, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| self.csv(source))?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(|source| self.csv(source))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
            .collect();
        if !columns.iter().any(|c| c == "url") {
            return Err(StoreError::MissingColumn {
                path: self.path.clone(),
                column: "url".into(),
            });
        }
        let dropped: Vec<&str> = self
            .layout
            .columns()
            .iter()
            .copied()
            .filter(|wanted| !columns.iter().any(|c| c == wanted))
            .collect();
        if !dropped.is_empty() {
            scan_warn!(
                "{} has no {} column(s); appending in its existing layout",
                self.path.display(),
                dropped.join(", ")
            );
        }
        Ok(columns)
    }

    /// Atomically replace the file with `stored`, header first.
    pub fn rewrite(&self, stored: &StoredRows) -> Result<PathBuf, StoreError> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&stored.headers)
            .map_err(|source| self.csv(source))?;
        for row in &stored.rows {
            writer.write_record(row).map_err(|source| self.csv(source))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| self.io(err.into_error()))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::Io {
                path: self.path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"),
            })?;
        Ok(AtomicFileWriter::new(dir).write(name, bytes)?)
    }

    fn io(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

fn read_rows(path: &Path) -> Result<StoredRows, StoreError> {
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        rows.push(row.iter().map(str::to_string).collect());
    }
    Ok(StoredRows { headers, rows })
}
