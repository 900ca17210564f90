// src/chart/mod.rs
//! SVG charts of the aggregate. Time is plotted as a decimal year so every
//! view shares the same x scale regardless of its range.

pub mod savgol;
pub mod views;

use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

use crate::aggregate::{AggregateRecord, Value};
use crate::error::ChartError;

pub use savgol::savgol_derivative;
pub use views::{render_summary, total_count, total_percent, total_rate, youth_count};

pub const NAVY: RGBColor = RGBColor(0x0d, 0x22, 0x40);
pub const CYAN: RGBColor = RGBColor(0x00, 0xa8, 0xe1);
pub const GOLD: RGBColor = RGBColor(0xf7, 0xa8, 0x00);

/// Canvas size of a single-panel view, in pixels.
pub const SIZE: (u32, u32) = (1200, 600);

/// `date` as a fractional year, e.g. 2019-07-02 → 2019.5.
pub fn decimal_year(date: NaiveDate) -> f64 {
    let days = if date.leap_year() { 366.0 } else { 365.0 };
    date.year() as f64 + date.ordinal0() as f64 / days
}

/// Decimal year of a fixed calendar day.
pub fn at(year: i32, month: u32, day: u32) -> f64 {
    NaiveDate::from_ymd_opt(year, month, day).map_or(year as f64, decimal_year)
}

/// Events marked with a vertical line on the adult views.
pub fn markers() -> [(f64, &'static str); 2] {
    [
        (at(2019, 1, 7), "Evers administration begins"),
        (at(2020, 3, 25), "COVID-19 lockdown begins"),
    ]
}

/// Samples of `field`, failing when the aggregate does not carry it.
pub fn series<'r>(record: &'r AggregateRecord, field: &str) -> Result<&'r [Option<Value>], ChartError> {
    record
        .series(field)
        .ok_or_else(|| ChartError::MissingField(field.to_string()))
}

/// `(year, value * scale)` for every defined sample of `field`.
pub fn points(record: &AggregateRecord, field: &str, scale: f64) -> Result<Vec<(f64, f64)>, ChartError> {
    sum_points(record, &[field], scale)
}

/// Sum of several fields per date. Dates where any of them is undefined are
/// skipped.
pub fn sum_points(
    record: &AggregateRecord,
    fields: &[&str],
    scale: f64,
) -> Result<Vec<(f64, f64)>, ChartError> {
    let columns = fields
        .iter()
        .map(|f| series(record, f))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(record
        .dates()
        .iter()
        .enumerate()
        .filter_map(|(i, date)| {
            let total = columns
                .iter()
                .map(|c| c.get(i).copied().flatten().map(Value::as_f64))
                .sum::<Option<f64>>()?;
            Some((decimal_year(*date), total * scale))
        })
        .collect())
}

pub(crate) fn render_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> ChartError {
    ChartError::Render(e.to_string())
}

/// One plotted line.
pub struct Curve {
    pub label: Option<&'static str>,
    pub style: ShapeStyle,
    pub dashed: bool,
    pub points: Vec<(f64, f64)>,
}

impl Curve {
    pub fn new(label: &'static str, style: ShapeStyle, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: Some(label),
            style,
            dashed: false,
            points,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Free text anchored at a data coordinate. `\n` starts a new line.
pub struct Note {
    pub at: (f64, f64),
    pub text: &'static str,
    pub align_right: bool,
}

impl Note {
    pub fn left(x: f64, y: f64, text: &'static str) -> Self {
        Self {
            at: (x, y),
            text,
            align_right: false,
        }
    }

    pub fn right(x: f64, y: f64, text: &'static str) -> Self {
        Self {
            at: (x, y),
            text,
            align_right: true,
        }
    }
}

/// Everything drawn inside one set of axes.
pub struct Panel {
    pub x: Range<f64>,
    pub y: Range<f64>,
    pub x_desc: Option<&'static str>,
    pub y_desc: &'static str,
    pub curves: Vec<Curve>,
    pub notes: Vec<Note>,
    pub markers: bool,
    pub legend: Option<SeriesLabelPosition>,
}

impl Panel {
    pub fn new(x: Range<f64>, y: Range<f64>, y_desc: &'static str) -> Self {
        Self {
            x,
            y,
            x_desc: Some("Calendar year"),
            y_desc,
            curves: Vec::new(),
            notes: Vec::new(),
            markers: false,
            legend: None,
        }
    }

    /// Draw the panel into `area`.
    pub fn draw(&self, area: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<(), ChartError> {
        let mut chart = ChartBuilder::on(area)
            .margin(16)
            .x_label_area_size(if self.x_desc.is_some() { 48 } else { 24 })
            .y_label_area_size(64)
            .build_cartesian_2d(self.x.clone(), self.y.clone())
            .map_err(render_err)?;

        let first_year = self.x.start.ceil() as i32;
        let last_year = self.x.end.floor() as i32;
        let year_label = |x: &f64| format!("{:.0}", x);
        let mut mesh = chart.configure_mesh();
        mesh.x_labels((last_year - first_year + 1).max(2) as usize)
            .x_label_formatter(&year_label)
            .y_desc(self.y_desc)
            .bold_line_style(NAVY.mix(0.4))
            .light_line_style(NAVY.mix(0.08))
            .axis_style(NAVY);
        if let Some(desc) = self.x_desc {
            mesh.x_desc(desc);
        }
        mesh.draw().map_err(render_err)?;

        for curve in &self.curves {
            let visible: Vec<(f64, f64)> = curve
                .points
                .iter()
                .copied()
                .filter(|(x, _)| self.x.contains(x))
                .collect();
            let style = curve.style;
            let anno = if curve.dashed {
                chart
                    .draw_series(DashedLineSeries::new(visible, 10, 6, style))
                    .map_err(render_err)?
            } else {
                chart
                    .draw_series(LineSeries::new(visible, style))
                    .map_err(render_err)?
            };
            if let Some(label) = curve.label {
                anno.label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], style));
            }
        }

        if self.markers {
            let style = NAVY.mix(0.6).stroke_width(1);
            for (x, _) in markers() {
                chart
                    .draw_series(DashedLineSeries::new(
                        vec![(x, self.y.start), (x, self.y.end)],
                        6,
                        4,
                        style,
                    ))
                    .map_err(render_err)?;
            }
        }

        for note in &self.notes {
            let anchor = if note.align_right { HPos::Right } else { HPos::Left };
            let font = ("sans-serif", 15)
                .into_font()
                .color(&NAVY)
                .pos(Pos::new(anchor, VPos::Top));
            for (i, line) in note.text.lines().enumerate() {
                chart
                    .draw_series(std::iter::once(
                        EmptyElement::at(note.at) + Text::new(line, (0, 18 * i as i32), font.clone()),
                    ))
                    .map_err(render_err)?;
            }
        }

        if let Some(position) = self.legend.clone() {
            chart
                .configure_series_labels()
                .position(position)
                .background_style(WHITE.mix(0.85))
                .border_style(NAVY.mix(0.4))
                .draw()
                .map_err(render_err)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateRecord, Series};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn decimal_years() {
        assert_eq!(decimal_year(d(2019, 1, 1)), 2019.0);
        assert!((decimal_year(d(2019, 7, 2)) - 2019.5).abs() < 0.002);
        assert_eq!(at(2020, 1, 1), 2020.0);
    }

    #[test]
    fn sums_skip_undefined_samples() {
        let dates = vec![d(2019, 1, 4), d(2019, 1, 11), d(2019, 1, 18)];
        let a: Series = vec![Some(Value::Int(1)), Some(Value::Int(2)), None];
        let b: Series = vec![Some(Value::Float(0.5)), Some(Value::Int(3)), Some(Value::Int(4))];
        let record =
            AggregateRecord::from_parts(dates, vec![("a".into(), a), ("b".into(), b)]).unwrap();

        let pts = sum_points(&record, &["a", "b"], 10.0).unwrap();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0], (decimal_year(d(2019, 1, 4)), 15.0));
        assert_eq!(pts[1].1, 50.0);
    }

    #[test]
    fn unknown_field_fails_fast() {
        let record = AggregateRecord::new();
        assert!(matches!(
            points(&record, "nope", 1.0),
            Err(ChartError::MissingField(f)) if f == "nope"
        ));
    }
}
