//! Ownership-period day math.
//!
//! Used by the period tables and exemption summaries. Day counts follow
//! the upstream convention: whole days between dates, end exclusive
//! (2020-01-01 to 2020-06-01 is 152 days).

use chrono::NaiveDate;

use crate::domain::OwnershipPeriod;

/// Date formats the upstream mixes freely
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d %b %Y"];

/// Parse an upstream date string, tolerating the formats seen in the wild
pub fn parse_date_flexible(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Whole days from `start` to `end`, end exclusive. Negative if the
/// range is reversed.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Length of an ownership period in days.
///
/// Prefers the upstream-reported `days` field; falls back to computing
/// from the period's dates when both parse.
pub fn period_days(period: &OwnershipPeriod) -> Option<i64> {
    if let Some(days) = period.days {
        return Some(days);
    }

    let start = period.start.as_deref().and_then(parse_date_flexible)?;
    let end = period.end.as_deref().and_then(parse_date_flexible)?;
    Some(days_between(start, end))
}

/// Exempt fraction of an ownership span as a percentage, 0 when the
/// total is empty or nonsensical.
pub fn exempt_percentage(exempt_days: i64, total_days: i64) -> f64 {
    if total_days <= 0 {
        return 0.0;
    }

    (exempt_days as f64 / total_days as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_between_end_exclusive() {
        assert_eq!(days_between(date(2020, 1, 1), date(2020, 6, 1)), 152);
        assert_eq!(days_between(date(2020, 1, 1), date(2020, 1, 1)), 0);
        assert_eq!(days_between(date(2020, 6, 1), date(2020, 1, 1)), -152);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date_flexible("2020-01-01"), Some(date(2020, 1, 1)));
        assert_eq!(parse_date_flexible("01/06/2020"), Some(date(2020, 6, 1)));
        assert_eq!(parse_date_flexible(" 15 Mar 2021 "), Some(date(2021, 3, 15)));
        assert_eq!(parse_date_flexible("not a date"), None);
    }

    #[test]
    fn test_period_days_prefers_reported_value() {
        let period = OwnershipPeriod {
            start: Some("2020-01-01".to_string()),
            end: Some("2020-06-01".to_string()),
            days: Some(150), // upstream disagrees with the dates; trust it
            ..Default::default()
        };
        assert_eq!(period_days(&period), Some(150));
    }

    #[test]
    fn test_period_days_computed_from_dates() {
        let period = OwnershipPeriod {
            start: Some("2020-01-01".to_string()),
            end: Some("2020-06-01".to_string()),
            ..Default::default()
        };
        assert_eq!(period_days(&period), Some(152));

        let unparseable = OwnershipPeriod {
            start: Some("sometime".to_string()),
            end: Some("2020-06-01".to_string()),
            ..Default::default()
        };
        assert_eq!(period_days(&unparseable), None);
    }

    #[test]
    fn test_exempt_percentage() {
        assert_eq!(exempt_percentage(152, 304), 50.0);
        assert_eq!(exempt_percentage(0, 304), 0.0);
        assert_eq!(exempt_percentage(10, 0), 0.0);
        assert_eq!(exempt_percentage(304, 304), 100.0);
    }
}
