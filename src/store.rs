//! Flat-file persistence of the aggregate: JSON (field → array) and CSV
//! (one column per field, one row per publication date).

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde_json::{Map, Value as Json};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};
use tempfile::NamedTempFile;

use crate::aggregate::{AggregateRecord, Series, Value};
use crate::error::AggregateError;
use crate::fetch::dates::{format_publication_date, parse_publication_date};

pub const DATE_FIELD: &str = "publication_date";

fn to_json(record: &AggregateRecord) -> Result<Json> {
    let mut map = Map::new();
    map.insert(
        DATE_FIELD.to_string(),
        Json::Array(
            record
                .dates()
                .iter()
                .map(|d| Json::String(format_publication_date(*d)))
                .collect(),
        ),
    );
    for (name, series) in record.fields() {
        map.insert(name.clone(), serde_json::to_value(series)?);
    }
    Ok(Json::Object(map))
}

fn parse_dates<'a>(raw: impl Iterator<Item = &'a str>) -> Result<Vec<NaiveDate>, AggregateError> {
    raw.map(|s| parse_publication_date(s).ok_or_else(|| AggregateError::BadDate(s.to_string())))
        .collect()
}

pub fn write_json_to<W: Write>(record: &AggregateRecord, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &to_json(record)?).context("serializing aggregate")
}

pub fn read_json_from<R: Read>(reader: R) -> Result<AggregateRecord> {
    let json: Json = serde_json::from_reader(reader).context("parsing aggregate JSON")?;
    let Json::Object(mut map) = json else {
        bail!("aggregate JSON is not an object");
    };

    let raw_dates = map
        .shift_remove(DATE_FIELD)
        .ok_or_else(|| anyhow!("aggregate JSON has no `{DATE_FIELD}`"))?;
    let raw_dates: Vec<String> =
        serde_json::from_value(raw_dates).context("reading publication dates")?;
    let dates = parse_dates(raw_dates.iter().map(String::as_str))?;

    let fields = map
        .into_iter()
        .map(|(name, values)| {
            let series: Series = serde_json::from_value(values)
                .with_context(|| format!("reading series `{name}`"))?;
            Ok((name, series))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AggregateRecord::from_parts(dates, fields)?)
}

/// Write JSON through a temp file and rename, so an interrupted run never
/// leaves a truncated checkpoint behind.
pub fn write_json(record: &AggregateRecord, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_json_to(record, &mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn read_json(path: &Path) -> Result<AggregateRecord> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_json_from(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}

fn format_value(value: Option<Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Int(v)) => v.to_string(),
        // Debug keeps the fraction (`90.0`) so floats read back as floats
        Some(Value::Float(v)) => format!("{v:?}"),
    }
}

fn parse_value(raw: &str) -> Result<Option<Value>> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = s.parse::<i64>() {
        return Ok(Some(Value::Int(v)));
    }
    s.parse::<f64>()
        .map(|v| Some(Value::Float(v)))
        .with_context(|| format!("`{s}` is not a number"))
}

pub fn write_csv_to<W: Write>(record: &AggregateRecord, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = vec![DATE_FIELD];
    header.extend(record.field_names());
    wtr.write_record(&header)?;

    for (i, date) in record.dates().iter().enumerate() {
        let mut row = vec![format_publication_date(*date)];
        row.extend(
            record
                .fields()
                .iter()
                .map(|(_, series)| format_value(series[i])),
        );
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv_from<R: Read>(reader: R) -> Result<AggregateRecord> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers().context("reading CSV header")?.clone();
    if headers.get(0) != Some(DATE_FIELD) {
        bail!("first CSV column must be `{DATE_FIELD}`");
    }
    let mut fields: Vec<(String, Series)> = headers
        .iter()
        .skip(1)
        .map(|h| (h.to_string(), Vec::new()))
        .collect();

    let mut raw_dates = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {idx}"))?;
        raw_dates.push(record.get(0).unwrap_or_default().to_string());
        for (col, (name, series)) in fields.iter_mut().enumerate() {
            let raw = record.get(col + 1).unwrap_or_default();
            series.push(parse_value(raw).with_context(|| format!("record {idx}, `{name}`"))?);
        }
    }

    let dates = parse_dates(raw_dates.iter().map(String::as_str))?;
    Ok(AggregateRecord::from_parts(dates, fields)?)
}

pub fn write_csv(record: &AggregateRecord, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv_to(record, BufWriter::new(file))
}

pub fn read_csv(path: &Path) -> Result<AggregateRecord> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_csv_from(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}
