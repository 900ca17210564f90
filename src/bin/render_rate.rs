//! Draws the incarcerated total and its smoothed weekly growth rate from
//! the CSV aggregate.

use anyhow::{Context, Result};
use doctrends::{chart, config::Config, init_logging, store};
use tracing::info;

fn main() -> Result<()> {
    init_logging();
    let cfg = Config::from_env()?;

    let record = store::read_csv(&cfg.csv_output)
        .with_context(|| format!("loading {}", cfg.csv_output.display()))?;
    info!(reports = record.len(), "loaded aggregate");

    let path = chart::total_rate(&record, &cfg.fig_dir)?;
    info!("wrote {}", path.display());
    Ok(())
}
