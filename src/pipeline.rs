// src/pipeline.rs
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use std::time::Instant;
use tracing::{info, instrument};

use crate::aggregate::AggregateRecord;
use crate::config::Config;
use crate::extract::TableExtractor;
use crate::fetch::{publication_dates, Locator, ReportFetcher, ReportSource};
use crate::resolve::resolve_report;
use crate::store;

/// Sequential scrape: one report is located, fetched, extracted, resolved
/// and aggregated before the next one starts.
pub struct Scraper<'a, F, X> {
    config: &'a Config,
    fetcher: &'a F,
    extractor: X,
}

impl<'a, F: ReportFetcher, X: TableExtractor> Scraper<'a, F, X> {
    pub fn new(config: &'a Config, fetcher: &'a F, extractor: X) -> Self {
        Self {
            config,
            fetcher,
            extractor,
        }
    }

    /// Existing output when resuming, a fresh record otherwise.
    fn starting_record(&self) -> Result<AggregateRecord> {
        let path = &self.config.json_output;
        if self.config.resume && path.is_file() {
            let record = store::read_json(path)?;
            record
                .check_canonical()
                .with_context(|| format!("resuming from {}", path.display()))?;
            info!(
                reports = record.len(),
                last = ?record.last_date(),
                "resuming from {}",
                path.display()
            );
            Ok(record)
        } else {
            Ok(AggregateRecord::new())
        }
    }

    /// Collect every report published before `today` that the output does
    /// not hold yet. The aggregate is checkpointed to the JSON output after
    /// each report.
    pub async fn run(&self, today: NaiveDate) -> Result<AggregateRecord> {
        let mut record = self.starting_record()?;

        let pending: Vec<NaiveDate> =
            publication_dates(self.config.start_year, today, &self.config.skip_dates)
                .into_iter()
                .filter(|d| record.last_date().map_or(true, |last| *d > last))
                .collect();
        let total = pending.len();
        info!(total, "reports to scrape");

        let mut locator = Locator::new(self.config, today.year(), self.fetcher);
        for (index, date) in pending.into_iter().enumerate() {
            let start = Instant::now();
            record = self
                .process(&mut locator, date, record)
                .await
                .with_context(|| format!("processing report for {date}"))?;
            store::write_json(&record, &self.config.json_output)?;
            info!(index = index + 1, total, %date, elapsed = ?start.elapsed(), "scraped");
        }

        // also happens on drop; here so failures are reported
        locator.workspace_mut().cleanup()?;
        Ok(record)
    }

    #[instrument(level = "debug", skip(self, locator, record))]
    async fn process(
        &self,
        locator: &mut Locator<'_, F>,
        date: NaiveDate,
        mut record: AggregateRecord,
    ) -> Result<AggregateRecord> {
        let located = locator.resolve(date).await?;
        let bytes = self.load(&located.source).await?;
        let tables = self.extractor.extract(&bytes)?;
        let fields = resolve_report(&tables)?;
        record.push(date, &fields)?;
        Ok(record)
    }

    async fn load(&self, source: &ReportSource) -> Result<Vec<u8>> {
        match source {
            ReportSource::Archived(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display())),
            ReportSource::Remote(url) => self.fetcher.fetch_bytes(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Value;
    use crate::error::{AggregateError, LocateError, ResolveError};
    use crate::extract::{tables_from_text, Table};
    use crate::fetch::locate::report_stem;
    use crate::fetch::testing::FakeFetcher;
    use crate::resolve::report::tests::SAMPLE_REPORT;
    use std::path::Path;
    use tempfile::tempdir;

    /// Reads fixtures as plain text instead of PDF.
    struct TextExtractor;

    impl TableExtractor for TextExtractor {
        fn extract(&self, document: &[u8]) -> Result<Vec<Table>> {
            Ok(tables_from_text(&String::from_utf8_lossy(document)))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config(root: &Path) -> Config {
        Config {
            start_year: 2019,
            archive_root: root.join("archives"),
            json_output: root.join("trends.json"),
            ..Config::default()
        }
    }

    const LIVE: &str = "https://doc.wi.gov/DataResearch/WeeklyPopulationReports/";

    /// 2019 archive with every Friday except 2019-12-27, which is published
    /// a day early.
    fn fetcher_for_2019(cfg: &Config) -> Result<FakeFetcher> {
        let mut names = Vec::new();
        for date in publication_dates(2019, d(2020, 1, 1), &[]) {
            let date = if date == d(2019, 12, 27) { d(2019, 12, 26) } else { date };
            names.push(format!("2019/{}.pdf", report_stem(date, cfg.format_boundary)));
        }
        let entries: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), SAMPLE_REPORT)).collect();

        Ok(FakeFetcher::default()
            .with_archive(2019, &entries)?
            .with_report(&format!("{LIVE}01032020.pdf"), SAMPLE_REPORT.as_bytes()))
    }

    #[tokio::test]
    async fn scrapes_archive_and_live_reports() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = config(tmp.path());
        let fetcher = fetcher_for_2019(&cfg)?;

        let record = Scraper::new(&cfg, &fetcher, TextExtractor)
            .run(d(2020, 1, 10))
            .await?;

        assert_eq!(record.len(), 53);
        assert_eq!(record.dates()[0], d(2019, 1, 4));
        // the requested date is recorded, not the fallback day
        assert!(record.dates().contains(&d(2019, 12, 27)));
        assert_eq!(record.last_date(), Some(d(2020, 1, 3)));
        assert!(record
            .series("inmate_total")
            .unwrap()
            .iter()
            .all(|v| *v == Some(Value::Int(23_345))));

        // checkpoint on disk matches, archive directory is gone
        assert_eq!(store::read_json(&cfg.json_output)?, record);
        assert!(!cfg.archive_root.join("2019").exists());
        Ok(())
    }

    #[tokio::test]
    async fn resumes_after_last_aggregated_date() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = config(tmp.path());
        let fetcher = fetcher_for_2019(&cfg)?
            .with_report(&format!("{LIVE}01102020.pdf"), SAMPLE_REPORT.as_bytes());

        Scraper::new(&cfg, &fetcher, TextExtractor)
            .run(d(2020, 1, 10))
            .await?;
        assert_eq!(fetcher.archive_requests(), 1);

        let record = Scraper::new(&cfg, &fetcher, TextExtractor)
            .run(d(2020, 1, 11))
            .await?;
        assert_eq!(record.len(), 54);
        assert_eq!(record.last_date(), Some(d(2020, 1, 10)));
        // nothing from 2019 was fetched again
        assert_eq!(fetcher.archive_requests(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unresolvable_report_fails_and_cleans_up() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = config(tmp.path());
        let broken = SAMPLE_REPORT.replace("JUVENILE", "YOUTH");
        let fetcher = FakeFetcher::default()
            .with_archive(2019, &[("2019/01042019.pdf", broken.as_str())])?;

        // 2019 is archived once the run happens in 2020
        let err = Scraper::new(&cfg, &fetcher, TextExtractor)
            .run(d(2020, 1, 2))
            .await
            .unwrap_err();

        assert_eq!(fetcher.archive_requests(), 1);
        assert_eq!(
            err.downcast_ref::<ResolveError>(),
            Some(&ResolveError::TableNotFound {
                table: "juvenile facilities"
            })
        );
        assert!(!cfg.archive_root.join("2019").exists());
        assert!(!cfg.json_output.exists());
        Ok(())
    }

    #[tokio::test]
    async fn missing_report_is_document_not_found() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = config(tmp.path());
        // 2019-01-11 and the five days before it are all missing
        let fetcher =
            FakeFetcher::default().with_archive(2019, &[("2019/01042019.pdf", SAMPLE_REPORT)])?;

        let err = Scraper::new(&cfg, &fetcher, TextExtractor)
            .run(d(2020, 1, 2))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LocateError>(),
            Some(LocateError::DocumentNotFound { lookback: 5, date }) if *date == d(2019, 1, 11)
        ));
        // the first report was checkpointed before the failure
        assert_eq!(store::read_json(&cfg.json_output)?.dates(), &[d(2019, 1, 4)]);
        Ok(())
    }

    #[tokio::test]
    async fn keep_archives_survives_a_successful_run() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = Config {
            keep_archives: true,
            ..config(tmp.path())
        };
        let fetcher = fetcher_for_2019(&cfg)?;

        let record = Scraper::new(&cfg, &fetcher, TextExtractor)
            .run(d(2020, 1, 10))
            .await?;

        assert_eq!(record.len(), 53);
        assert!(cfg.archive_root.join("2019").join("01042019.pdf").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn resume_rejects_checkpoint_missing_a_field() -> Result<()> {
        let tmp = tempdir()?;
        let cfg = config(tmp.path());
        std::fs::write(
            &cfg.json_output,
            r#"{"publication_date": ["01-04-2019"], "inmate_total": [23345]}"#,
        )?;

        let err = Scraper::new(&cfg, &FakeFetcher::default(), TextExtractor)
            .run(d(2020, 1, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<AggregateError>(),
            Some(&AggregateError::MissingField("probation_parole_total".into()))
        );
        Ok(())
    }
}
