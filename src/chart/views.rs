use plotters::coord::Shift;
use plotters::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

use super::{
    at, decimal_year, points, render_err, savgol_derivative, series, sum_points, Curve, Note,
    Panel, CYAN, GOLD, NAVY, SIZE,
};
use crate::aggregate::{AggregateRecord, Value};
use crate::error::ChartError;

/// Smoothing applied to the weekly growth rate.
pub const RATE_WINDOW: usize = 15;
pub const RATE_ORDER: usize = 2;

type Area<'b> = DrawingArea<SVGBackend<'b>, Shift>;

fn render<D>(dir: &Path, name: &str, size: (u32, u32), draw: D) -> Result<PathBuf, ChartError>
where
    D: FnOnce(&Area<'_>) -> Result<(), ChartError>,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    {
        let root = SVGBackend::new(&path, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw(&root)?;
        root.present().map_err(render_err)?;
    }
    info!(path = %path.display(), "rendered chart");
    Ok(path)
}

/// Youth facility populations since 2008.
///
/// Ethan Allen closed when Copper Lake opened; both are drawn around the
/// first week Ethan Allen reports zero.
#[instrument(level = "debug", skip(record))]
pub fn youth_count(record: &AggregateRecord, dir: &Path) -> Result<PathBuf, ChartError> {
    let total = points(record, "facility_youth_total", 1.0)?;
    let lincoln = points(record, "lincoln_hills_count", 1.0)?;
    let ethan = points(record, "ethan_allen_count", 1.0)?;
    let copper = points(record, "copper_lake_count", 1.0)?;
    let other = sum_points(
        record,
        &["grow_academy_count", "mendota_count", "southern_oaks_count"],
        1.0,
    )?;

    let cut = series(record, "ethan_allen_count")?
        .iter()
        .position(|v| v.map(Value::as_f64) == Some(0.0))
        .and_then(|i| record.dates().get(i))
        .map(|d| decimal_year(*d));
    let (ethan, copper) = match cut {
        Some(cut) => (
            ethan.into_iter().filter(|(x, _)| *x <= cut).collect(),
            copper.into_iter().filter(|(x, _)| *x >= cut).collect(),
        ),
        None => (ethan, copper),
    };

    let mut panel = Panel::new(at(2008, 1, 1)..at(2021, 8, 6), 0.0..650.0, "Population size");
    panel.curves = vec![
        Curve::new("Total", GOLD.stroke_width(2), total),
        Curve::new("Lincoln Hills", NAVY.stroke_width(2), lincoln),
        Curve::new("Ethan Allen", CYAN.stroke_width(2), ethan),
        Curve::new("Copper Lake", NAVY.mix(0.25).stroke_width(1), copper),
        Curve::new("Other", NAVY.mix(0.1).stroke_width(1), other),
    ];
    panel.legend = Some(SeriesLabelPosition::UpperRight);

    render(dir, "doc-youth-count.svg", SIZE, |root| panel.draw(root))
}

/// Adult population as a percentage of design capacity.
#[instrument(level = "debug", skip(record))]
pub fn total_percent(record: &AggregateRecord, dir: &Path) -> Result<PathBuf, ChartError> {
    let mut panel = Panel::new(
        at(2018, 1, 1)..at(2021, 8, 6),
        100.0..220.0,
        "Percentage of design capacity",
    );
    panel.curves = vec![
        Curve::new(
            "Total",
            NAVY.stroke_width(2),
            points(record, "inmate_total_percentage", 1.0)?,
        ),
        Curve::new(
            "Max. security",
            CYAN.stroke_width(2),
            points(record, "male_maximum_security_percentage", 1.0)?,
        ),
        Curve::new(
            "Med. security",
            NAVY.mix(0.25).stroke_width(1),
            points(record, "male_medium_security_percentage", 1.0)?,
        ),
        Curve::new(
            "Min. security (male)",
            NAVY.mix(0.1).stroke_width(1),
            points(record, "male_minimum_security_percentage", 1.0)?,
        ),
        Curve::new(
            "Min. security (female)",
            GOLD.stroke_width(2),
            points(record, "female_minimum_security_percentage", 1.0)?,
        ),
    ];
    panel.markers = true;
    panel.notes = vec![
        Note::left(at(2019, 1, 14), 167.0, "Evers administration\nbegins"),
        Note::right(at(2020, 3, 18), 107.0, "COVID-19 lockdown\nbegins"),
    ];
    panel.legend = Some(SeriesLabelPosition::UpperRight);

    render(dir, "doc-total-percent.svg", SIZE, |root| panel.draw(root))
}

/// Supervised and incarcerated adults, in thousands.
#[instrument(level = "debug", skip(record))]
pub fn total_count(record: &AggregateRecord, dir: &Path) -> Result<PathBuf, ChartError> {
    let k = 1e-3;
    let mut panel = Panel::new(
        at(2018, 1, 1)..at(2021, 8, 6),
        0.0..70.0,
        "Population size (× 1000)",
    );
    panel.curves = vec![
        Curve::new(
            "Supervised",
            NAVY.stroke_width(2),
            points(record, "probation_parole_total", k)?,
        ),
        Curve::new("Incarcerated", CYAN.stroke_width(2), points(record, "inmate_total", k)?),
        Curve::new(
            "Max. security",
            GOLD.stroke_width(2),
            points(record, "male_maximum_security_count", k)?,
        )
        .dashed(),
        Curve::new(
            "Med. security",
            GOLD.mix(0.66).stroke_width(2),
            points(record, "male_medium_security_count", k)?,
        )
        .dashed(),
        Curve::new(
            "Min. security",
            GOLD.mix(0.33).stroke_width(2),
            sum_points(
                record,
                &["male_minimum_security_count", "female_minimum_security_count"],
                k,
            )?,
        )
        .dashed(),
    ];
    panel.markers = true;
    panel.notes = vec![
        Note::left(at(2019, 1, 14), 43.0, "Evers administration\nbegins"),
        Note::left(at(2020, 4, 1), 43.0, "COVID-19 lockdown\nbegins"),
    ];
    panel.legend = Some(SeriesLabelPosition::UpperLeft);

    render(dir, "doc-total-count.svg", SIZE, |root| panel.draw(root))
}

/// Incarcerated total (thousands) above its smoothed week-over-week change.
#[instrument(level = "debug", skip(record))]
pub fn total_rate(record: &AggregateRecord, dir: &Path) -> Result<PathBuf, ChartError> {
    let totals = points(record, "inmate_total", 1.0)?;
    let values: Vec<f64> = totals.iter().map(|(_, y)| *y).collect();
    let rate = savgol_derivative(&values, RATE_WINDOW, RATE_ORDER).map_err(|e| match e {
        ChartError::SeriesTooShort { len, window, .. } => ChartError::SeriesTooShort {
            field: "inmate_total".to_string(),
            len,
            window,
        },
        other => other,
    })?;

    let x = at(2018, 1, 1)..at(2021, 8, 6);

    let mut top = Panel::new(x.clone(), 19.0..24.0, "Total population (× 1000)");
    top.x_desc = None;
    top.curves = vec![Curve {
        label: None,
        style: NAVY.stroke_width(2),
        dashed: false,
        points: totals.iter().map(|(x, y)| (*x, y / 1e3)).collect(),
    }];
    top.markers = true;
    top.notes = vec![
        Note::left(at(2019, 1, 21), 21.15, "Evers administration\nbegins"),
        Note::left(at(2020, 4, 8), 19.65, "COVID-19 lockdown\nbegins"),
    ];

    let mut bottom = Panel::new(x, -160.0..60.0, "Growth rate (per week)");
    bottom.curves = vec![Curve {
        label: None,
        style: CYAN.stroke_width(2),
        dashed: false,
        points: totals.iter().map(|(x, _)| *x).zip(rate).collect(),
    }];
    bottom.markers = true;

    render(dir, "doc-total-rate.svg", SIZE, |root| {
        let panels = root.split_evenly((2, 1));
        top.draw(&panels[0])?;
        bottom.draw(&panels[1])
    })
}

/// The three views drawn from the JSON aggregate.
pub fn render_summary(record: &AggregateRecord, dir: &Path) -> Result<Vec<PathBuf>, ChartError> {
    Ok(vec![
        youth_count(record, dir)?,
        total_percent(record, dir)?,
        total_count(record, dir)?,
    ])
}
