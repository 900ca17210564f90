//! Draws the youth, capacity and adult-count charts from the JSON aggregate
//! and refreshes the CSV copy.

use anyhow::{Context, Result};
use doctrends::{chart, config::Config, init_logging, store};
use tracing::info;

fn main() -> Result<()> {
    init_logging();
    let cfg = Config::from_env()?;

    let record = store::read_json(&cfg.json_output)
        .with_context(|| format!("loading {}", cfg.json_output.display()))?;
    info!(reports = record.len(), "loaded aggregate");

    for path in chart::render_summary(&record, &cfg.fig_dir)? {
        info!("wrote {}", path.display());
    }

    store::write_csv(&record, &cfg.csv_output)?;
    info!("wrote {}", cfg.csv_output.display());
    Ok(())
}
