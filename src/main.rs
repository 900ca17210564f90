use anyhow::Result;
use doctrends::{
    config::Config,
    extract::PdfExtractor,
    fetch::HttpFetcher,
    init_logging,
    pipeline::Scraper,
    store,
};
use reqwest::Client;
use tokio::time::Instant;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    init_logging();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(?cfg, "configured");

    // ─── 3) scrape every report not yet in the output ────────────────
    let start = Instant::now();
    let fetcher = HttpFetcher::new(Client::new(), cfg.archive_url.clone());
    let today = chrono::Local::now().date_naive();
    let record = Scraper::new(&cfg, &fetcher, PdfExtractor)
        .run(today)
        .await?;
    info!(reports = record.len(), elapsed = ?start.elapsed(), "scrape complete");

    // ─── 4) spreadsheet copy ─────────────────────────────────────────
    store::write_csv(&record, &cfg.csv_output)?;
    info!("wrote {}", cfg.csv_output.display());

    info!("all done");
    Ok(())
}
