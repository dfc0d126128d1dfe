//! Parsers for the string conventions of the upstream CSVs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid monetary value {0:?}")]
    Money(String),
    #[error("invalid date {0:?}")]
    Date(String),
    #[error("invalid integer {0:?}")]
    Integer(String),
}

/// Parses a Brazilian-formatted amount: `.` is the thousands separator and
/// `,` the decimal separator. Empty input is zero.
pub fn parse_money(value: &str) -> Result<Decimal, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let normalized = trimmed.replace('.', "").replace(',', ".");
    normalized
        .parse::<Decimal>()
        .map_err(|_| ParseError::Money(value.to_string()))
}

/// Parses `DD/MM/YYYY` with a `YYYY-MM-DD` fallback. Empty input is `None`.
pub fn parse_day(value: &str) -> Result<Option<NaiveDate>, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map(Some)
        .map_err(|_| ParseError::Date(value.to_string()))
}

/// Extra-budgetary flag convention: `Sim` / `Yes` / `1`, case-insensitive.
/// Everything else is false.
pub fn parse_flag(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.eq_ignore_ascii_case("sim") || trimmed.eq_ignore_ascii_case("yes") || trimmed == "1"
}

/// Integer code, empty input is zero.
pub fn parse_code(value: &str) -> Result<i64, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ParseError::Integer(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_strips_thousands_and_swaps_decimal_separator() {
        assert_eq!(
            parse_money("1.234.567,89").unwrap(),
            "1234567.89".parse::<Decimal>().unwrap()
        );
        assert_eq!(
            parse_money("42,50").unwrap(),
            "42.50".parse::<Decimal>().unwrap()
        );
        assert_eq!(parse_money("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_money("   ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn money_rejects_garbage() {
        assert!(parse_money("R$ dez").is_err());
    }

    #[test]
    fn day_accepts_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert_eq!(parse_day("16/01/2025").unwrap(), Some(expected));
        assert_eq!(parse_day("2025-01-16").unwrap(), Some(expected));
        assert_eq!(parse_day("").unwrap(), None);
        assert!(parse_day("16-01-2025").is_err());
    }

    #[test]
    fn flag_convention() {
        assert!(parse_flag("Sim"));
        assert!(parse_flag("SIM"));
        assert!(parse_flag("yes"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("Não"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("0"));
    }

    #[test]
    fn code_parses_and_defaults() {
        assert_eq!(parse_code("158454").unwrap(), 158454);
        assert_eq!(parse_code("").unwrap(), 0);
        assert!(parse_code("abc").is_err());
    }
}
