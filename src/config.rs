use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::{env, path::PathBuf};
use url::Url;

pub const SOURCE_URL: &str = "https://doc.wi.gov/DataResearch/WeeklyPopulationReports/";
pub const ARCHIVE_URL: &str = "https://doc.wi.gov/DataResearch/ArchivedPopulationReports/";

/// Runtime settings. Defaults reproduce the published report layout;
/// every field can be overridden with a `DOCTRENDS_*` environment variable.
#[derive(Debug, Clone)]
pub struct Config {
    /// First year whose Friday reports are collected.
    pub start_year: i32,
    /// Dates on/after this use `MMDDYYYY` file names instead of `YYYY.MM.DD`.
    pub format_boundary: NaiveDate,
    /// Reports known to be malformed; never requested.
    pub skip_dates: Vec<NaiveDate>,
    pub source_url: Url,
    pub archive_url: Url,
    /// Where yearly archives are unpacked.
    pub archive_root: PathBuf,
    pub json_output: PathBuf,
    pub csv_output: PathBuf,
    pub fig_dir: PathBuf,
    /// How many earlier days are tried when a report is missing.
    pub max_lookback: u32,
    pub keep_archives: bool,
    pub resume: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_year: 2008,
            format_boundary: ymd(2016, 1, 1),
            skip_dates: vec![ymd(2013, 1, 4)],
            source_url: Url::parse(SOURCE_URL).expect("source URL constant is valid"),
            archive_url: Url::parse(ARCHIVE_URL).expect("archive URL constant is valid"),
            archive_root: PathBuf::from("."),
            json_output: PathBuf::from("doc-population-trends.json"),
            csv_output: PathBuf::from("doc-population-trends.csv"),
            fig_dir: PathBuf::from("fig"),
            max_lookback: 5,
            keep_archives: false,
            resume: true,
        }
    }
}

impl Config {
    /// Defaults, then environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(v) = var("DOCTRENDS_START_YEAR") {
            cfg.start_year = v.parse().context("parsing DOCTRENDS_START_YEAR")?;
        }
        if let Some(v) = var("DOCTRENDS_SOURCE_URL") {
            cfg.source_url = Url::parse(&v).context("parsing DOCTRENDS_SOURCE_URL")?;
        }
        if let Some(v) = var("DOCTRENDS_ARCHIVE_URL") {
            cfg.archive_url = Url::parse(&v).context("parsing DOCTRENDS_ARCHIVE_URL")?;
        }
        if let Some(v) = var("DOCTRENDS_ARCHIVE_ROOT") {
            cfg.archive_root = PathBuf::from(v);
        }
        if let Some(v) = var("DOCTRENDS_JSON") {
            cfg.json_output = PathBuf::from(v);
        }
        if let Some(v) = var("DOCTRENDS_CSV") {
            cfg.csv_output = PathBuf::from(v);
        }
        if let Some(v) = var("DOCTRENDS_FIG_DIR") {
            cfg.fig_dir = PathBuf::from(v);
        }
        if let Some(v) = var("DOCTRENDS_MAX_LOOKBACK") {
            cfg.max_lookback = v.parse().context("parsing DOCTRENDS_MAX_LOOKBACK")?;
        }
        if let Some(v) = var("DOCTRENDS_KEEP_ARCHIVES") {
            cfg.keep_archives = v == "true";
        }
        if let Some(v) = var("DOCTRENDS_RESUME") {
            cfg.resume = v != "false";
        }

        Ok(cfg)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("constant date is valid")
}
