use tracing::debug;

use super::{
    header_pair, require_pair, resolve_pair, select_table, ResolvedField, ADULT_FEMALES,
    ADULT_INSTITUTIONS, JUVENILE_FACILITIES, PROBATION_PAROLE,
};
use crate::aggregate::Value;
use crate::error::ResolveError;
use crate::extract::Table;

/// Juvenile facilities listed by row label. Some only appear in some years.
const YOUTH_FACILITIES: &[&str] = &[
    "Copper Lake",
    "Ethan Allen",
    "Grow Academy",
    "Lincoln Hills",
    "Mendota",
    "Southern Oaks",
];

/// Adult security levels: (row label, field prefix).
const MALE_ROWS: &[(&str, &str)] = &[
    ("SUBTOTAL-MALES", "male_inmate"),
    ("MAXIMUM SECURITY", "male_maximum_security"),
    ("MEDIUM SECURITY", "male_medium_security"),
    ("MINIMUM SECURITY", "male_minimum_security"),
];

/// Field values resolved from one report, in resolution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFields {
    values: Vec<(String, Option<Value>)>,
}

impl ReportFields {
    pub fn insert(&mut self, name: impl Into<String>, value: Option<Value>) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// `<prefix>_count` and `<prefix>_percentage`.
    pub fn insert_pair(&mut self, prefix: &str, field: ResolvedField) {
        self.insert(format!("{prefix}_count"), Some(Value::Int(field.count)));
        self.insert(
            format!("{prefix}_percentage"),
            field.percentage.map(Value::Float),
        );
    }

    /// `None` when the field was never set; `Some(None)` when it is undefined.
    pub fn get(&self, name: &str) -> Option<Option<Value>> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<Value>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `"Copper Lake"` → `"copper_lake"`.
fn field_prefix(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

/// Resolve every known field from the tables of one report.
pub fn resolve_report(tables: &[Table]) -> Result<ReportFields, ResolveError> {
    let mut fields = ReportFields::default();
    resolve_totals(tables, &mut fields)?;
    resolve_adult_males(tables, &mut fields)?;
    resolve_adult_females(tables, &mut fields)?;
    resolve_facility_youths(tables, &mut fields)?;
    debug!(fields = fields.len(), "resolved report");
    Ok(fields)
}

/// Supervision totals: the probation/parole total in the table header, the
/// juvenile field total in the third row below it.
fn resolve_totals(tables: &[Table], fields: &mut ReportFields) -> Result<(), ResolveError> {
    let table = select_table(tables, &PROBATION_PAROLE)?;
    let missing = |column| ResolveError::MissingColumn {
        table: table.title().to_string(),
        column,
    };

    let parole = table.header_cell(1).ok_or_else(|| missing(1))?.as_int()?;
    let field_youth = table.cell(2, 1).ok_or_else(|| missing(1))?.as_int()?;

    fields.insert("probation_parole_total", Some(Value::Int(parole)));
    fields.insert("field_youth_total", Some(Value::Int(field_youth)));
    Ok(())
}

fn resolve_adult_males(tables: &[Table], fields: &mut ReportFields) -> Result<(), ResolveError> {
    let table = select_table(tables, &ADULT_INSTITUTIONS)?;

    let total = header_pair(table, 2)?;
    fields.insert("inmate_total", Some(Value::Int(total.count)));
    fields.insert("inmate_total_percentage", total.percentage.map(Value::Float));

    for (label, prefix) in MALE_ROWS {
        fields.insert_pair(prefix, resolve_pair(table, label, 2)?);
    }
    Ok(())
}

fn resolve_adult_females(tables: &[Table], fields: &mut ReportFields) -> Result<(), ResolveError> {
    let table = select_table(tables, &ADULT_FEMALES)?;

    fields.insert_pair("female_inmate", header_pair(table, 2)?);
    fields.insert_pair(
        "female_minimum_security",
        resolve_pair(table, "MINIMUM SECURITY", 2)?,
    );
    Ok(())
}

/// Juvenile tables carry an extra type column: capacity in 2, count in 3.
fn resolve_facility_youths(
    tables: &[Table],
    fields: &mut ReportFields,
) -> Result<(), ResolveError> {
    let table = select_table(tables, &JUVENILE_FACILITIES)?;

    let total = require_pair(table, "Total", 3)?;
    fields.insert("facility_youth_total", Some(Value::Int(total.count)));
    fields.insert(
        "facility_youth_percentage",
        total.percentage.map(Value::Float),
    );

    for label in YOUTH_FACILITIES {
        fields.insert_pair(&field_prefix(label), resolve_pair(table, label, 3)?);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::aggregate::FIELDS;
    use crate::extract::tables_from_text;

    pub(crate) const SAMPLE_REPORT: &str = "\
WISCONSIN DEPARTMENT OF CORRECTIONS
Weekly Population Report

PROBATION & PAROLE                 65,012
Adult Probation                    44,100
Adult Parole                       20,700
Juvenile Field                     212

ADULT INSTITUTIONS                 17,183     23,345     135.9%
MAXIMUM SECURITY                   500        450        90.0%
MEDIUM SECURITY                    7,007      10,577     151.0%
MINIMUM SECURITY                   2,879      3,532      122.7%
SUBTOTAL-MALES                     10,386     14,559     140.2%

ADULT FEMALES                      1,494      1,869      125.1%
MINIMUM SECURITY                   0          300        --

JUVENILE CORRECTIONAL FACILITIES   Type       Capacity   Population
Copper Lake School                 Girls      29         18
Lincoln Hills School               Boys       560        129
Mendota Juvenile Treatment Center  Boys       29         14
Total                                         618        161
";

    fn int(fields: &ReportFields, name: &str) -> i64 {
        match fields.get(name) {
            Some(Some(Value::Int(v))) => v,
            other => panic!("{name}: {other:?}"),
        }
    }

    #[test]
    fn resolves_every_canonical_field() {
        let tables = tables_from_text(SAMPLE_REPORT);
        let fields = resolve_report(&tables).unwrap();

        for name in FIELDS {
            assert!(fields.get(name).is_some(), "missing {name}");
        }
        assert_eq!(fields.len(), FIELDS.len());
    }

    #[test]
    fn values_come_from_the_right_cells() {
        let tables = tables_from_text(SAMPLE_REPORT);
        let fields = resolve_report(&tables).unwrap();

        assert_eq!(int(&fields, "probation_parole_total"), 65012);
        assert_eq!(int(&fields, "field_youth_total"), 212);
        assert_eq!(int(&fields, "inmate_total"), 23345);
        assert_eq!(int(&fields, "male_maximum_security_count"), 450);
        assert_eq!(
            fields.get("male_maximum_security_percentage"),
            Some(Some(Value::Float(90.0)))
        );
        assert_eq!(int(&fields, "male_inmate_count"), 14559);
        assert_eq!(int(&fields, "female_inmate_count"), 1869);
        assert_eq!(int(&fields, "facility_youth_total"), 161);
        assert_eq!(int(&fields, "lincoln_hills_count"), 129);
        assert_eq!(int(&fields, "copper_lake_count"), 18);
    }

    #[test]
    fn absent_facilities_and_zero_capacity() {
        let tables = tables_from_text(SAMPLE_REPORT);
        let fields = resolve_report(&tables).unwrap();

        assert_eq!(int(&fields, "ethan_allen_count"), 0);
        assert_eq!(
            fields.get("ethan_allen_percentage"),
            Some(Some(Value::Float(0.0)))
        );
        // capacity 0 for female minimum security
        assert_eq!(int(&fields, "female_minimum_security_count"), 300);
        assert_eq!(fields.get("female_minimum_security_percentage"), Some(None));
    }

    #[test]
    fn missing_juvenile_table_is_named() {
        let text = SAMPLE_REPORT
            .split("JUVENILE CORRECTIONAL")
            .next()
            .unwrap_or_default();
        let err = resolve_report(&tables_from_text(text)).unwrap_err();
        assert_eq!(
            err,
            ResolveError::TableNotFound {
                table: "juvenile facilities"
            }
        );
    }

    #[test]
    fn totals_table_is_found_by_title() {
        let text = format!("Weekly Population Report    Page 1    2\n\n{SAMPLE_REPORT}");
        let tables = tables_from_text(&text);
        assert_eq!(tables[0].title(), "Weekly Population Report");

        let fields = resolve_report(&tables).unwrap();
        assert_eq!(int(&fields, "probation_parole_total"), 65012);
        assert_eq!(int(&fields, "field_youth_total"), 212);
    }

    #[test]
    fn missing_totals_table_is_named() {
        let text = SAMPLE_REPORT.replace("PROBATION & PAROLE", "SUPERVISION");
        let err = resolve_report(&tables_from_text(&text)).unwrap_err();
        assert_eq!(
            err,
            ResolveError::TableNotFound {
                table: "probation and parole"
            }
        );
    }

    #[test]
    fn duplicate_females_table_is_ambiguous() {
        let text = format!("{SAMPLE_REPORT}\nADULT FEMALES    10    20\n");
        let err = resolve_report(&tables_from_text(&text)).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousTable { matches: 2, .. }));
    }
}
