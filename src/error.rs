//! Named error types for the scraping, resolution and charting stages.
//!
//! Glue code (pipeline, binaries, I/O) uses `anyhow`; these enums cover the
//! failure modes callers are expected to match on.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures while turning a publication date into a readable report.
#[derive(Error, Debug)]
pub enum LocateError {
    /// Neither the requested day nor any day in the lookback window had a report.
    #[error("no report found for {date} or the {lookback} days before it")]
    DocumentNotFound { date: NaiveDate, lookback: u32 },

    /// Downloading or unpacking a yearly archive failed.
    #[error("archive for {year} could not be fetched")]
    Archive {
        year: i32,
        #[source]
        source: anyhow::Error,
    },

    /// The availability check for a live report failed outright.
    #[error("could not probe {url}")]
    Probe {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid report URL")]
    BadUrl(#[from] url::ParseError),
}

/// Failures while locating tables, rows and cells inside one report.
#[derive(Error, Debug, PartialEq)]
pub enum ResolveError {
    #[error("no table matches `{table}`")]
    TableNotFound { table: &'static str },

    #[error("{matches} tables match `{table}`")]
    AmbiguousTable { table: &'static str, matches: usize },

    #[error("no row containing `{label}` in `{table}`")]
    RowNotFound { table: String, label: String },

    #[error("column {column} missing in `{table}`")]
    MissingColumn { table: String, column: usize },

    #[error("`{value}` is not an integer")]
    NotAnInteger { value: String },
}

/// Violations of the aggregate's alignment rules.
#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("aggregate lacks field `{0}`")]
    MissingField(String),

    #[error("field `{field}` has {len} values, expected {expected}")]
    Misaligned {
        field: String,
        len: usize,
        expected: usize,
    },

    #[error("bad publication date `{0}`")]
    BadDate(String),
}

/// Failures while rendering charts from an aggregate.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("aggregate has no field `{0}`")]
    MissingField(String),

    #[error("field `{field}` has {len} samples, smoothing window is {window}")]
    SeriesTooShort {
        field: String,
        len: usize,
        window: usize,
    },

    #[error("smoothing window {window} must be odd and larger than polynomial order {order}")]
    InvalidWindow { window: usize, order: usize },

    #[error("drawing failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
