//! Numeric cell cleaning.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Currency symbols dropped before parsing.
const CURRENCY_SYMBOLS: [char; 6] = ['¥', '￥', '$', '€', '£', '元'];

/// Currency codes dropped before parsing (matched case-insensitively).
const CURRENCY_CODES: [&str; 2] = ["CNY", "RMB"];

/// Parses a display value such as `"1,234.56"`, `"¥ 1.02"` or `"0.12%"`.
///
/// Whitespace, thousands separators, currency symbols and codes, and a
/// leading `+` are removed. A trailing `%` turns the value into a fraction.
/// Anything that is still not a number yields `None`, which is distinct
/// from `Some(Decimal::ZERO)`.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use disclosure_scraper::normalize::clean_numeric;
///
/// assert_eq!(clean_numeric("1,234.56"), Some(Decimal::new(123_456, 2)));
/// assert_eq!(clean_numeric("12.3%"), Some(Decimal::new(123, 3)));
/// assert_eq!(clean_numeric("N/A"), None);
/// assert_eq!(clean_numeric("0"), Some(Decimal::ZERO));
/// ```
#[must_use]
pub fn clean_numeric(text: &str) -> Option<Decimal> {
    let mut cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '，' && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    for code in CURRENCY_CODES {
        cleaned = strip_ascii_case_insensitive(&cleaned, code);
    }

    let (number, is_percent) = match cleaned.strip_suffix(['%', '％']) {
        Some(rest) => (rest, true),
        None => (cleaned.as_str(), false),
    };
    let number = number.strip_prefix('+').unwrap_or(number);
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return None;
    }

    let value = Decimal::from_str(number).ok()?;
    if is_percent {
        value.checked_div(Decimal::ONE_HUNDRED)
    } else {
        Some(value)
    }
}

fn strip_ascii_case_insensitive(haystack: &str, needle: &str) -> String {
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(&needle) {
        let start = cursor + found;
        out.push_str(&haystack[cursor..start]);
        cursor = start + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap_or_default()
    }

    #[test]
    fn test_plain_and_thousands_separated() {
        assert_eq!(clean_numeric("1.0235"), Some(dec("1.0235")));
        assert_eq!(clean_numeric("1,234.56"), Some(dec("1234.56")));
        assert_eq!(clean_numeric("1，234，567"), Some(dec("1234567")));
    }

    #[test]
    fn test_percent_becomes_fraction() {
        assert_eq!(clean_numeric("12.3%"), Some(dec("0.123")));
        assert_eq!(clean_numeric("0.12%"), Some(dec("0.0012")));
        assert_eq!(clean_numeric("-0.05％"), Some(dec("-0.0005")));
        assert_eq!(clean_numeric("+1.5%"), Some(dec("0.015")));
    }

    #[test]
    fn test_currency_symbols_and_codes() {
        assert_eq!(clean_numeric("¥1,000.00"), Some(dec("1000")));
        assert_eq!(clean_numeric("￥ 2.5 元"), Some(dec("2.5")));
        assert_eq!(clean_numeric("CNY 3.14"), Some(dec("3.14")));
        assert_eq!(clean_numeric("3.14rmb"), Some(dec("3.14")));
        assert_eq!(clean_numeric("$5"), Some(dec("5")));
    }

    #[test]
    fn test_unicode_whitespace_stripped() {
        assert_eq!(clean_numeric("\u{a0}1.02\u{3000}"), Some(dec("1.02")));
    }

    #[test]
    fn test_absent_is_not_zero() {
        assert_eq!(clean_numeric(""), None);
        assert_eq!(clean_numeric("   "), None);
        assert_eq!(clean_numeric("N/A"), None);
        assert_eq!(clean_numeric("--"), None);
        assert_eq!(clean_numeric("%"), None);
        assert_eq!(clean_numeric("1.2.3"), None);
        assert_eq!(clean_numeric("0"), Some(Decimal::ZERO));
        assert_eq!(clean_numeric("0.00%"), Some(Decimal::ZERO));
    }
}
