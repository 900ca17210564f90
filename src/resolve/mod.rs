// src/resolve/mod.rs
//! Locating named rows in extracted tables and turning them into
//! (count, percentage-of-capacity) pairs.

pub mod report;

use tracing::trace;

use crate::error::ResolveError;
use crate::extract::Table;

pub use report::{resolve_report, ReportFields};

/// A named predicate picking one table out of a report.
#[derive(Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub matches: fn(&Table) -> bool,
}

pub const PROBATION_PAROLE: TableSpec = TableSpec {
    name: "probation and parole",
    matches: is_probation_parole,
};

pub const ADULT_INSTITUTIONS: TableSpec = TableSpec {
    name: "adult institutions",
    matches: is_adult_institutions,
};

pub const ADULT_FEMALES: TableSpec = TableSpec {
    name: "adult females",
    matches: is_adult_females,
};

pub const JUVENILE_FACILITIES: TableSpec = TableSpec {
    name: "juvenile facilities",
    matches: is_juvenile_facilities,
};

fn is_probation_parole(t: &Table) -> bool {
    t.title().contains("PROBATION")
}

fn is_adult_institutions(t: &Table) -> bool {
    t.title() == "ADULT INSTITUTIONS"
}

fn is_adult_females(t: &Table) -> bool {
    t.title().contains("FEMALES")
}

fn is_juvenile_facilities(t: &Table) -> bool {
    t.title().contains("JUVENILE")
}

/// Count and share of design capacity for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedField {
    pub count: i64,
    /// `None` when the capacity is zero.
    pub percentage: Option<f64>,
}

impl ResolvedField {
    /// Stand-in for a category the report does not list.
    pub const ABSENT: ResolvedField = ResolvedField {
        count: 0,
        percentage: Some(0.0),
    };

    pub fn new(count: i64, capacity: i64) -> Self {
        Self {
            count,
            percentage: percentage(count, capacity),
        }
    }
}

/// `count / capacity * 100`, undefined for a zero capacity.
pub fn percentage(count: i64, capacity: i64) -> Option<f64> {
    if capacity == 0 {
        None
    } else {
        Some(100.0 * count as f64 / capacity as f64)
    }
}

/// The single table matching `spec`.
pub fn select_table<'t>(tables: &'t [Table], spec: &TableSpec) -> Result<&'t Table, ResolveError> {
    let mut found = tables.iter().filter(|t| (spec.matches)(t));
    match (found.next(), found.count()) {
        (None, _) => Err(ResolveError::TableNotFound { table: spec.name }),
        (Some(table), 0) => Ok(table),
        (Some(_), rest) => Err(ResolveError::AmbiguousTable {
            table: spec.name,
            matches: rest + 1,
        }),
    }
}

/// Index of the first row whose label contains `needle` (case-sensitive).
pub fn row_index(table: &Table, needle: &str) -> Option<usize> {
    (0..table.rows.len()).find(|&i| table.label(i).is_some_and(|l| l.contains(needle)))
}

/// Count in column `count_col`, capacity in the column before it. A missing
/// row resolves to [`ResolvedField::ABSENT`]; older reports lack some rows.
pub fn resolve_pair(
    table: &Table,
    needle: &str,
    count_col: usize,
) -> Result<ResolvedField, ResolveError> {
    match row_index(table, needle) {
        Some(row) => pair_at(table, row, count_col),
        None => {
            trace!(table = table.title(), needle, "row absent; zero-filled");
            Ok(ResolvedField::ABSENT)
        }
    }
}

/// Like [`resolve_pair`], but the row must exist.
pub fn require_pair(
    table: &Table,
    needle: &str,
    count_col: usize,
) -> Result<ResolvedField, ResolveError> {
    let row = row_index(table, needle).ok_or_else(|| ResolveError::RowNotFound {
        table: table.title().to_string(),
        label: needle.to_string(),
    })?;
    pair_at(table, row, count_col)
}

fn pair_at(table: &Table, row: usize, count_col: usize) -> Result<ResolvedField, ResolveError> {
    let missing = |column| ResolveError::MissingColumn {
        table: table.title().to_string(),
        column,
    };
    let cap_col = count_col.checked_sub(1).ok_or_else(|| missing(0))?;
    let count = table.cell(row, count_col).ok_or_else(|| missing(count_col))?.as_int()?;
    let capacity = table.cell(row, cap_col).ok_or_else(|| missing(cap_col))?.as_int()?;
    Ok(ResolvedField::new(count, capacity))
}

/// Same pairing for the totals printed in a table's header line.
pub fn header_pair(table: &Table, count_col: usize) -> Result<ResolvedField, ResolveError> {
    let missing = |column| ResolveError::MissingColumn {
        table: table.title().to_string(),
        column,
    };
    let cap_col = count_col.checked_sub(1).ok_or_else(|| missing(0))?;
    let count = table.header_cell(count_col).ok_or_else(|| missing(count_col))?.as_int()?;
    let capacity = table.header_cell(cap_col).ok_or_else(|| missing(cap_col))?.as_int()?;
    Ok(ResolvedField::new(count, capacity))
}
