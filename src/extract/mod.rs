// src/extract/mod.rs
//! PDF → tables. No interpretation happens here: a table is whatever run of
//! column-aligned lines the layout pass finds.

pub mod layout;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::debug;

use crate::error::ResolveError;

pub use layout::tables_from_text;

/// Digits with optional comma grouping, sign, decimals and a trailing `%`.
static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(\d{1,3}(,\d{3})+|\d+)(\.\d+)?%?$").expect("number pattern is valid")
});

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Numeric(f64),
    Text(String),
}

impl Cell {
    /// Numeric when `raw` looks like a number (`1,234`, `12.5`, `95%`),
    /// text otherwise. Surrounding whitespace is dropped.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if NUMBER.is_match(s) {
            let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '%').collect();
            if let Ok(v) = cleaned.parse::<f64>() {
                return Cell::Numeric(v);
            }
        }
        Cell::Text(s.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Numeric(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Text(s) if s.is_empty())
    }

    /// Integer value of the cell; see [`parse_int`].
    pub fn as_int(&self) -> Result<i64, ResolveError> {
        match self {
            Cell::Numeric(v) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i64),
            Cell::Numeric(v) => Err(ResolveError::NotAnInteger {
                value: v.to_string(),
            }),
            Cell::Text(s) => parse_int(s),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Numeric(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Integer from a plain or comma-grouped digit string: `"1,234"` → 1234.
pub fn parse_int(text: &str) -> Result<i64, ResolveError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<i64>()
        .or_else(|_| match cleaned.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
            _ => Err(()),
        })
        .map_err(|_| ResolveError::NotAnInteger {
            value: text.to_string(),
        })
}

/// A tabular region: header labels plus rows aligned to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Rows shorter than the header are padded with empty text at the end.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width.max(row.len()), Cell::Text(String::new()));
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// First header label; the reports put the table's name there.
    pub fn title(&self) -> &str {
        self.columns.first().map(String::as_str).unwrap_or("")
    }

    /// Header label `i` read as a cell. The reports print totals in the
    /// header line, so these are often numeric.
    pub fn header_cell(&self, i: usize) -> Option<Cell> {
        self.columns.get(i).map(|s| Cell::parse(s))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cell by column label.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.cell(row, col)
    }

    /// Row label (first column), when it is text.
    pub fn label(&self, row: usize) -> Option<&str> {
        self.cell(row, 0).and_then(Cell::as_text)
    }
}

/// Extract all tables from a PDF, in document order.
pub fn extract_tables(pdf: &[u8]) -> Result<Vec<Table>> {
    let text = pdf_extract::extract_text_from_mem(pdf).context("extracting PDF text")?;
    let tables = tables_from_text(&text);
    debug!(chars = text.len(), tables = tables.len(), "extracted tables");
    Ok(tables)
}

/// Document bytes → tables.
pub trait TableExtractor {
    fn extract(&self, document: &[u8]) -> Result<Vec<Table>>;
}

/// Extractor for the published PDF reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TableExtractor for PdfExtractor {
    fn extract(&self, document: &[u8]) -> Result<Vec<Table>> {
        extract_tables(document)
    }
}
