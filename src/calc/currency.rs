//! Currency formatting and parsing.
//!
//! en-AU display style with zero fraction digits: `$1,234,567`. The
//! grouping is hand-rolled; outputs are locale-stable by construction.

/// Format a dollar amount for display: `1234567.0` → `"$1,234,567"`.
/// Rounds to whole dollars; negatives render as `-$1,234`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let whole = rounded.abs() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Parse a numeric string the upstream may have pre-formatted, tolerating
/// currency symbols, grouping commas, and whitespace.
pub fn parse_numeric_string(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(1_000.0), "$1,000");
        assert_eq!(format_currency(100_000.0), "$100,000");
    }

    #[test]
    fn test_format_currency_rounds_and_signs() {
        assert_eq!(format_currency(1_234.6), "$1,235");
        assert_eq!(format_currency(-52_500.0), "-$52,500");
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("$1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_numeric_string("1234567"), Some(1_234_567.0));
        assert_eq!(parse_numeric_string(" $500 000 "), Some(500_000.0));
        assert_eq!(parse_numeric_string("-1,000.50"), Some(-1_000.5));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("$"), None);
        assert_eq!(parse_numeric_string("abc"), None);
    }

    #[test]
    fn test_round_trip_is_stable() {
        // format(parse(x)) is fixed for a given numeric input
        let parsed = parse_numeric_string("1234567").unwrap();
        assert_eq!(format_currency(parsed), "$1,234,567");

        let reparsed = parse_numeric_string(&format_currency(parsed)).unwrap();
        assert_eq!(format_currency(reparsed), "$1,234,567");
    }
}
