//! deployment date parsing.
//!
//! the sheet holds free-text dates. the short form `28 Sep 23` gets its year
//! expanded with a century rule; everything else goes through a list of common
//! layouts. empty text is the unix epoch, unreadable text is `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// two-digit years that compare greater than this (as text) land in the 1900s,
/// the rest in the 2000s. "50" itself maps to 2050.
///
/// NOTE: this is the rule observed in the live dashboard, kept as-is until the
/// intended pivot is confirmed. see `short_form_century_rule` in the tests.
pub const CENTURY_PIVOT: &str = "50";

const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
    "%Y/%m/%d",
];

const DATETIME_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

pub fn parse_deployment_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return Some(DateTime::UNIX_EPOCH);
    }

    let cleaned = raw.trim();
    if let Some((day, month, yy)) = split_short_form(cleaned) {
        let century = if yy > CENTURY_PIVOT { "19" } else { "20" };
        let expanded = format!("{day} {month} {century}{yy}");
        return NaiveDate::parse_from_str(&expanded, "%d %b %Y")
            .ok()
            .and_then(midnight_utc);
    }

    parse_generic(cleaned)
}

/// `d{1,2} <3 word chars> dd`, separated by whitespace
fn split_short_form(cleaned: &str) -> Option<(&str, &str, &str)> {
    let mut parts = cleaned.split_whitespace();
    let (day, month, yy) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let word = |c: char| c.is_alphanumeric() || c == '_';

    let day_ok = (1..=2).contains(&day.len()) && all_digits(day);
    let month_ok = month.chars().count() == 3 && month.chars().all(word);
    let year_ok = yy.len() == 2 && all_digits(yy);

    (day_ok && month_ok && year_ok).then_some((day, month, yy))
}

fn parse_generic(cleaned: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(cleaned, layout).ok())
        .and_then(midnight_utc)
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ymd(raw: &str) -> (i32, u32, u32) {
        let d = parse_deployment_date(raw).unwrap_or_else(|| panic!("{raw:?} did not parse"));
        (d.year(), d.month(), d.day())
    }

    #[test]
    fn short_form_expands_year() {
        assert_eq!(ymd("28 Sep 23"), (2023, 9, 28));
        assert_eq!(ymd("  3 Jan 07 "), (2007, 1, 3));
    }

    #[test]
    fn short_form_century_rule() {
        // observed: > "50" is 19xx, otherwise 20xx
        assert_eq!(ymd("1 Feb 51").0, 1951);
        assert_eq!(ymd("1 Feb 99").0, 1999);
        assert_eq!(ymd("1 Feb 50").0, 2050);
        assert_eq!(ymd("1 Feb 00").0, 2000);

        // a conventional pivot at 50 would read "50" as 1950; flag the gap
        let conventional_1950 = 1950;
        assert_ne!(
            ymd("1 Feb 50").0,
            conventional_1950,
            "century rule now matches a pivot-at-50 convention; update CENTURY_PIVOT docs"
        );
    }

    #[test]
    fn empty_is_epoch() {
        assert_eq!(parse_deployment_date(""), Some(DateTime::UNIX_EPOCH));
    }

    #[test]
    fn generic_layouts() {
        assert_eq!(ymd("2023-09-28"), (2023, 9, 28));
        assert_eq!(ymd("09/28/2023"), (2023, 9, 28));
        assert_eq!(ymd("28 September 2023"), (2023, 9, 28));
        assert_eq!(ymd("Sep 28, 2023"), (2023, 9, 28));
        assert_eq!(ymd("2023-09-28T10:15:00Z"), (2023, 9, 28));
    }

    #[test]
    fn unreadable_is_none() {
        assert_eq!(parse_deployment_date("pending install"), None);
        assert_eq!(parse_deployment_date("28 Xyz 23"), None);
        assert_eq!(parse_deployment_date("   "), None);
    }

    #[test]
    fn short_form_shape() {
        assert!(split_short_form("28 Sep 23").is_some());
        assert!(split_short_form("128 Sep 23").is_none());
        assert!(split_short_form("28 Sept 23").is_none());
        assert!(split_short_form("28 Sep 2023").is_none());
    }
}
