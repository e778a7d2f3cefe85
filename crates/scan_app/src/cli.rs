use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use scan_logging::{LogDestination, DEFAULT_LOG_FILE};

#[derive(Debug, Parser)]
#[command(name = "job_scan", version, about = "Scrape, filter and verify job postings")]
pub struct Cli {
    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal, global = true)]
    pub log: LogTarget,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the configured boards and append new relevant jobs.
    Scan(ScanArgs),
    /// Drop rows whose posting is gone and rewrite the output file.
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// RON settings file.
    #[arg(long, default_value = "job_scan.ron")]
    pub config: PathBuf,

    /// Discard the existing output file before scraping.
    #[arg(long)]
    pub fresh: bool,

    #[arg(long)]
    pub max_records: Option<usize>,

    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Search keyword; repeat to search several. Replaces the configured list.
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Run the browser without a window.
    #[arg(long)]
    pub headless: Option<bool>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[arg(long, default_value = "job_scan.ron")]
    pub config: PathBuf,

    /// Output file to verify instead of the configured one.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Concurrent liveness requests.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
            LogTarget::Both => LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
