use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;
use crate::resolve::ReportFields;

/// Canonical field order of the aggregate (after `publication_date`).
pub const FIELDS: &[&str] = &[
    // basic summary
    "probation_parole_total",
    "inmate_total",
    "inmate_total_percentage",
    "facility_youth_total",
    "facility_youth_percentage",
    "field_youth_total",
    // incarcerated youth
    "copper_lake_count",
    "copper_lake_percentage",
    "ethan_allen_count",
    "ethan_allen_percentage",
    "grow_academy_count",
    "grow_academy_percentage",
    "lincoln_hills_count",
    "lincoln_hills_percentage",
    "mendota_count",
    "mendota_percentage",
    "southern_oaks_count",
    "southern_oaks_percentage",
    // incarcerated adult males
    "male_inmate_count",
    "male_inmate_percentage",
    "male_maximum_security_count",
    "male_maximum_security_percentage",
    "male_medium_security_count",
    "male_medium_security_percentage",
    "male_minimum_security_count",
    "male_minimum_security_percentage",
    // incarcerated adult females
    "female_inmate_count",
    "female_inmate_percentage",
    "female_minimum_security_count",
    "female_minimum_security_percentage",
];

/// One sample. Counts are integers, percentages floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }
}

/// A field's samples, one per publication date. `None` marks an undefined
/// percentage (zero capacity).
pub type Series = Vec<Option<Value>>;

/// Time series of every field across all processed reports.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    dates: Vec<NaiveDate>,
    fields: Vec<(String, Series)>,
}

impl Default for AggregateRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateRecord {
    /// Empty record with the canonical fields.
    pub fn new() -> Self {
        Self {
            dates: Vec::new(),
            fields: FIELDS.iter().map(|f| (f.to_string(), Vec::new())).collect(),
        }
    }

    /// Record from already collected columns; fails unless every series
    /// has one sample per date.
    pub fn from_parts(
        dates: Vec<NaiveDate>,
        fields: Vec<(String, Series)>,
    ) -> Result<Self, AggregateError> {
        let record = Self { dates, fields };
        record.check_aligned()?;
        Ok(record)
    }

    /// Append one report. Fields the report lacks get a `0` placeholder so
    /// every series stays index-aligned with the dates.
    pub fn push(&mut self, date: NaiveDate, report: &ReportFields) -> Result<(), AggregateError> {
        if let Some((unknown, _)) = report
            .iter()
            .find(|(name, _)| !self.fields.iter().any(|(f, _)| f == name))
        {
            return Err(AggregateError::UnknownField(unknown.to_string()));
        }

        self.dates.push(date);
        for (name, series) in &mut self.fields {
            let value = report.get(name).unwrap_or(Some(Value::Int(0)));
            series.push(value);
        }
        self.check_aligned()
    }

    /// Fails unless every canonical field is present, so a loaded record
    /// can take further reports.
    pub fn check_canonical(&self) -> Result<(), AggregateError> {
        match FIELDS
            .iter()
            .copied()
            .find(|f| !self.fields.iter().any(|(n, _)| n == f))
        {
            Some(missing) => Err(AggregateError::MissingField(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn check_aligned(&self) -> Result<(), AggregateError> {
        let expected = self.dates.len();
        match self.fields.iter().find(|(_, s)| s.len() != expected) {
            Some((field, series)) => Err(AggregateError::Misaligned {
                field: field.clone(),
                len: series.len(),
                expected,
            }),
            None => Ok(()),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn series(&self, name: &str) -> Option<&[Option<Value>]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_slice())
    }

    pub fn fields(&self) -> &[(String, Series)] {
        &self.fields
    }
}
