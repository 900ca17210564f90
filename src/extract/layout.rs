//! Column detection on extracted page text.
//!
//! Text extraction keeps visual columns apart with runs of spaces. A line
//! with two or more such columns is a table line; a run of table lines is a
//! table whose first line is the header.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Cell, Table};

static CELL_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\t+|\s{2,}").expect("cell separator pattern is valid"));

/// Minimum number of cells for a line to count as part of a table.
const MIN_CELLS: usize = 2;

/// Split one line into cell texts.
pub fn split_cells(line: &str) -> Vec<&str> {
    CELL_BREAK
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

/// All tables in `text`, in the order they appear.
pub fn tables_from_text(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut region: Vec<Vec<&str>> = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= MIN_CELLS {
            region.push(cells);
        } else if !region.is_empty() {
            tables.push(build_table(std::mem::take(&mut region)));
        }
    }
    if !region.is_empty() {
        tables.push(build_table(region));
    }

    tables
}

fn build_table(lines: Vec<Vec<&str>>) -> Table {
    let width = lines.iter().map(Vec::len).max().unwrap_or(0);
    let mut lines = lines.into_iter();

    let mut columns: Vec<String> = lines
        .next()
        .map(|header| header.into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    for i in columns.len()..width {
        columns.push(format!("column_{i}"));
    }

    let rows = lines
        .map(|cells| align(cells.into_iter().map(Cell::parse).collect(), width))
        .collect();

    Table::new(columns, rows)
}

/// Keep the label in front and push the remaining cells to the right edge.
/// Layout gaps nearly always sit between the label and the figures, e.g. an
/// empty "type" column on a totals row.
fn align(cells: Vec<Cell>, width: usize) -> Vec<Cell> {
    if cells.len() >= width {
        return cells;
    }
    let gap = width - cells.len();
    let mut cells = cells.into_iter();
    let mut row = Vec::with_capacity(width);
    row.extend(cells.next());
    row.extend(std::iter::repeat(Cell::Text(String::new())).take(gap));
    row.extend(cells);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
WISCONSIN DEPARTMENT OF CORRECTIONS
Weekly Population Report

PROBATION & PAROLE        65,012
Adult Probation           44,100
Adult Parole              20,700
Juvenile Field            212

ADULT INSTITUTIONS        17,183     23,345     135.9%
MAXIMUM SECURITY          5,428      6,611      121.8%
MEDIUM SECURITY           7,007      10,577     151.0%
Page 1 of 2
JUVENILE FACILITIES       Type       Capacity   Population
Lincoln Hills School      Boys       560        129
Total                                618        161
";

    #[test]
    fn splits_on_wide_gaps_only() {
        assert_eq!(
            split_cells("  MAXIMUM SECURITY   5,428\t6,611 "),
            vec!["MAXIMUM SECURITY", "5,428", "6,611"]
        );
        assert_eq!(split_cells("Weekly Population Report"), vec!["Weekly Population Report"]);
        assert!(split_cells("   ").is_empty());
    }

    #[test]
    fn regions_become_tables_in_order() {
        let tables = tables_from_text(REPORT);
        let titles: Vec<&str> = tables.iter().map(Table::title).collect();
        assert_eq!(
            titles,
            vec!["PROBATION & PAROLE", "ADULT INSTITUTIONS", "JUVENILE FACILITIES"]
        );

        let totals = &tables[0];
        assert_eq!(totals.columns, vec!["PROBATION & PAROLE", "65,012"]);
        assert_eq!(totals.rows.len(), 3);
        assert_eq!(totals.cell(2, 1), Some(&Cell::Numeric(212.0)));

        let adults = &tables[1];
        assert_eq!(adults.rows.len(), 2);
        assert_eq!(adults.cell(1, 2), Some(&Cell::Numeric(10577.0)));
        assert_eq!(adults.cell(1, 3), Some(&Cell::Numeric(151.0)));
    }

    #[test]
    fn short_rows_are_right_aligned() {
        let tables = tables_from_text(REPORT);
        let juvenile = &tables[2];
        assert_eq!(juvenile.label(1), Some("Total"));
        assert!(juvenile.cell(1, 1).is_some_and(Cell::is_empty));
        assert_eq!(juvenile.get(1, "Capacity"), Some(&Cell::Numeric(618.0)));
        assert_eq!(juvenile.get(1, "Population"), Some(&Cell::Numeric(161.0)));
    }

    #[test]
    fn wide_rows_extend_the_header() {
        let tables = tables_from_text("A    B\nx    1    2\n");
        assert_eq!(tables[0].columns, vec!["A", "B", "column_2"]);
        assert_eq!(tables[0].cell(0, 2), Some(&Cell::Numeric(2.0)));
    }
}
