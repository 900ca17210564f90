use chrono::{Datelike, Duration, NaiveDate};
use std::{fmt, path::PathBuf};
use tracing::{debug, info};
use url::Url;

use super::archive::ArchiveWorkspace;
use super::client::ReportFetcher;
use crate::config::Config;
use crate::error::LocateError;

/// Where a report lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSource {
    Remote(Url),
    Archived(PathBuf),
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSource::Remote(url) => write!(f, "{url}"),
            ReportSource::Archived(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Result of a successful lookup. `found` differs from `requested` when the
/// report for the requested day was missing and an earlier one was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub requested: NaiveDate,
    pub found: NaiveDate,
    pub source: ReportSource,
}

/// File name (without extension) of the report published on `date`.
pub fn report_stem(date: NaiveDate, format_boundary: NaiveDate) -> String {
    if date < format_boundary {
        date.format("%Y.%m.%d").to_string()
    } else {
        date.format("%m%d%Y").to_string()
    }
}

/// Maps publication dates to report locations. Dates before January 1 of
/// `live_year` come from yearly archives, the rest from the live endpoint.
pub struct Locator<'a, F> {
    fetcher: &'a F,
    workspace: ArchiveWorkspace,
    source_url: Url,
    format_boundary: NaiveDate,
    live_year: i32,
    max_lookback: u32,
}

impl<'a, F: ReportFetcher> Locator<'a, F> {
    pub fn new(config: &Config, live_year: i32, fetcher: &'a F) -> Self {
        Self {
            fetcher,
            workspace: ArchiveWorkspace::new(&config.archive_root, config.keep_archives),
            source_url: config.source_url.clone(),
            format_boundary: config.format_boundary,
            live_year,
            max_lookback: config.max_lookback,
        }
    }

    /// Where the report for `date` should be, without touching disk or network.
    pub fn plan(&self, date: NaiveDate) -> Result<ReportSource, LocateError> {
        let file = format!("{}.pdf", report_stem(date, self.format_boundary));
        if date.year() < self.live_year {
            Ok(ReportSource::Archived(
                self.workspace.year_dir(date.year()).join(file),
            ))
        } else {
            Ok(ReportSource::Remote(self.source_url.join(&file)?))
        }
    }

    /// Find an available report for `date`, stepping back one day at a time
    /// (holidays have no report) for at most `max_lookback` days.
    pub async fn resolve(&mut self, date: NaiveDate) -> Result<Located, LocateError> {
        for back in 0..=self.max_lookback {
            let day = date - Duration::days(i64::from(back));
            let source = self.plan(day)?;

            let available = match &source {
                ReportSource::Archived(path) => {
                    self.workspace.ensure_year(day.year(), self.fetcher).await?;
                    path.is_file()
                }
                ReportSource::Remote(url) => {
                    self.fetcher
                        .exists(url)
                        .await
                        .map_err(|source| LocateError::Probe {
                            url: url.to_string(),
                            source,
                        })?
                }
            };

            if available {
                if back > 0 {
                    info!(%date, found = %day, "report missing; using earlier day");
                }
                return Ok(Located {
                    requested: date,
                    found: day,
                    source,
                });
            }
            debug!(%day, %source, "no report");
        }

        Err(LocateError::DocumentNotFound {
            date,
            lookback: self.max_lookback,
        })
    }

    pub fn workspace_mut(&mut self) -> &mut ArchiveWorkspace {
        &mut self.workspace
    }
}
