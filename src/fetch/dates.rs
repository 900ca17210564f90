use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Display format of publication dates in the aggregate.
pub const PUBLICATION_DATE_FORMAT: &str = "%m-%d-%Y";

/// Every Friday from January 1 of `start_year` up to (not including) `today`,
/// minus the dates in `skip`. Ascending.
pub fn publication_dates(start_year: i32, today: NaiveDate, skip: &[NaiveDate]) -> Vec<NaiveDate> {
    let Some(start) = NaiveDate::from_ymd_opt(start_year, 1, 1) else {
        return Vec::new();
    };
    let days_to_friday = (Weekday::Fri.num_days_from_monday() + 7
        - start.weekday().num_days_from_monday())
        % 7;

    let mut out = Vec::new();
    let mut day = start + Duration::days(i64::from(days_to_friday));
    while day < today {
        if !skip.contains(&day) {
            out.push(day);
        }
        day += Duration::weeks(1);
    }
    out
}

pub fn format_publication_date(date: NaiveDate) -> String {
    date.format(PUBLICATION_DATE_FORMAT).to_string()
}

pub fn parse_publication_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), PUBLICATION_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn only_fridays_before_today() {
        let dates = publication_dates(2008, d(2008, 2, 1), &[]);
        assert_eq!(
            dates,
            vec![d(2008, 1, 4), d(2008, 1, 11), d(2008, 1, 18), d(2008, 1, 25)]
        );
        assert!(dates.iter().all(|x| x.weekday() == Weekday::Fri));
    }

    #[test]
    fn start_on_friday_is_included() {
        // 2010-01-01 was a Friday
        let dates = publication_dates(2010, d(2010, 1, 9), &[]);
        assert_eq!(dates, vec![d(2010, 1, 1), d(2010, 1, 8)]);
    }

    #[test]
    fn malformed_report_is_skipped() {
        let skip = [d(2013, 1, 4)];
        let dates = publication_dates(2013, d(2013, 1, 19), &skip);
        assert_eq!(dates, vec![d(2013, 1, 11), d(2013, 1, 18)]);
    }

    #[test]
    fn publication_date_text_round_trips() {
        let date = d(2019, 1, 11);
        let text = format_publication_date(date);
        assert_eq!(text, "01-11-2019");
        assert_eq!(parse_publication_date(&text), Some(date));
        assert_eq!(parse_publication_date("2019-01-11"), None);
    }
}
