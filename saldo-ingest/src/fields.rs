//! Field extractors: money tokens, dates and labeled scalars.
//!
//! Amounts use the statement convention "1.234,56": `.` groups thousands and
//! `,` separates the cents. Dates are `DD/MM/YYYY` in the summary sections
//! and `DD/MM/YY` inside the transaction table.

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::FieldError;

/// Two-digit years resolving past this year are moved back one century.
pub const CENTURY_CUTOFF: i32 = 2030;

/// Parse a localized money token ("1.234,56 €") into a number.
pub fn parse_amount(token: &str) -> Result<f64, FieldError> {
    let stripped = token.trim().trim_end_matches('€').trim();
    let cleaned = stripped.replace('.', "").replace(',', ".");

    let well_formed = !cleaned.is_empty()
        && cleaned.chars().filter(|c| *c == '.').count() <= 1
        && cleaned
            .trim_start_matches('-')
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
        && cleaned.chars().any(|c| c.is_ascii_digit());

    if !well_formed {
        return Err(FieldError::Amount(token.trim().to_string()));
    }

    cleaned
        .parse::<f64>()
        .map_err(|_| FieldError::Amount(token.trim().to_string()))
}

/// Legacy behavior: a malformed token reads as 0.0.
pub fn parse_amount_lenient(token: &str) -> f64 {
    parse_amount(token).unwrap_or(0.0)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Map a two-digit year onto 1931..=2030.
pub fn resolve_two_digit_year(yy: u32) -> i32 {
    let year = 2000 + (yy % 100) as i32;
    if year > CENTURY_CUTOFF { year - 100 } else { year }
}

fn split_dmy(s: &str) -> Option<(u32, u32, &str)> {
    let mut it = s.trim().split('/');
    let d = it.next()?;
    let m = it.next()?;
    let y = it.next()?;
    if it.next().is_some() || d.len() != 2 || m.len() != 2 {
        return None;
    }
    if !y.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((d.parse().ok()?, m.parse().ok()?, y))
}

/// `DD/MM/YYYY`
pub fn parse_date_long(s: &str) -> Result<NaiveDate, FieldError> {
    let err = || FieldError::Date(s.trim().to_string());
    let (d, m, y) = split_dmy(s).ok_or_else(err)?;
    if y.len() != 4 {
        return Err(err());
    }
    let year: i32 = y.parse().map_err(|_| err())?;
    NaiveDate::from_ymd_opt(year, m, d).ok_or_else(err)
}

/// `DD/MM/YY`, century resolved through [`resolve_two_digit_year`].
pub fn parse_date_short(s: &str) -> Result<NaiveDate, FieldError> {
    let err = || FieldError::Date(s.trim().to_string());
    let (d, m, y) = split_dmy(s).ok_or_else(err)?;
    if y.len() != 2 {
        return Err(err());
    }
    let yy: u32 = y.parse().map_err(|_| err())?;
    NaiveDate::from_ymd_opt(resolve_two_digit_year(yy), m, d).ok_or_else(err)
}

/// Inverse of [`parse_date_short`] for dates in 1931..=2030.
pub fn format_date_short(date: NaiveDate) -> String {
    format!(
        "{:02}/{:02}/{:02}",
        date.day(),
        date.month(),
        date.year().rem_euclid(100)
    )
}

/// First capture group of `re` in `text`, trimmed.
pub fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Labeled amount such as "Totale Entrate 1.234,56 €".
///
/// `None` when the label is absent; `Some(Err)` when the amount is malformed.
pub fn labeled_amount(re: &Regex, text: &str) -> Option<Result<f64, FieldError>> {
    capture(re, text).map(parse_amount)
}

/// Labeled balance: group 1 is a `DD/MM/YYYY` date, group 2 the amount.
pub fn labeled_balance(
    re: &Regex,
    text: &str,
) -> Option<(Result<NaiveDate, FieldError>, Result<f64, FieldError>)> {
    let caps = re.captures(text)?;
    let date = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let amount = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((parse_date_long(date), parse_amount(amount)))
}

/// IBAN with every whitespace character removed.
pub fn normalize_iban(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_amount_localized() {
        assert_eq!(parse_amount("1.234,56"), Ok(1234.56));
        assert_eq!(parse_amount("1234,56"), Ok(1234.56));
        assert_eq!(parse_amount("0,01"), Ok(0.01));
        assert_eq!(parse_amount("12.345.678,90"), Ok(12345678.90));
        assert_eq!(parse_amount(" 1.000,00 € "), Ok(1000.0));
    }

    #[test]
    fn test_parse_amount_matches_textual_rewrite() {
        for token in ["7,00", "45,90", "999,99", "1.000,01", "250.000,00", "3.141.592,65"] {
            let rewritten: f64 = token.replace('.', "").replace(',', ".").parse().unwrap();
            assert_eq!(parse_amount(token), Ok(rewritten), "token {token}");
        }
    }

    #[test]
    fn test_malformed_amount_is_an_error_lenient_is_zero() {
        assert!(parse_amount("1,2,3").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount(".,").is_err());
        assert!(parse_amount("inf").is_err());
        assert_eq!(parse_amount_lenient("1,2,3"), 0.0);
        assert_eq!(parse_amount_lenient("abc"), 0.0);
    }

    #[test]
    fn test_century_resolution() {
        assert_eq!(resolve_two_digit_year(0), 2000);
        assert_eq!(resolve_two_digit_year(25), 2025);
        assert_eq!(resolve_two_digit_year(30), 2030);
        assert_eq!(resolve_two_digit_year(31), 1931);
        assert_eq!(resolve_two_digit_year(99), 1999);
    }

    #[test]
    fn test_century_resolution_is_injective() {
        let years: std::collections::HashSet<i32> = (0..100).map(resolve_two_digit_year).collect();
        assert_eq!(years.len(), 100);
        assert!(years.iter().all(|y| (1931..=2030).contains(y)));
    }

    #[test]
    fn test_short_date_roundtrips_over_whole_window() {
        let mut d = date(1931, 1, 1);
        let end = date(2030, 12, 31);
        while d <= end {
            assert_eq!(parse_date_short(&format_date_short(d)), Ok(d));
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_parse_dates() {
        assert_eq!(parse_date_short("03/02/25"), Ok(date(2025, 2, 3)));
        assert_eq!(parse_date_short("15/06/98"), Ok(date(1998, 6, 15)));
        assert_eq!(parse_date_long("31/03/2025"), Ok(date(2025, 3, 31)));
        assert!(parse_date_short("31/02/25").is_err());
        assert!(parse_date_short("01/02/2025").is_err());
        assert!(parse_date_long("01/02/25").is_err());
        assert!(parse_date_long("xx/02/2025").is_err());
    }

    #[test]
    fn test_labeled_fields() {
        let re = Regex::new(r"Saldo iniziale al\s*(\d{2}/\d{2}/\d{4})\s*([\d.,]+)\s*€").unwrap();
        let (d, a) = labeled_balance(&re, "Saldo iniziale al 01/01/2025 1.000,00 €").unwrap();
        assert_eq!(d, Ok(date(2025, 1, 1)));
        assert_eq!(a, Ok(1000.0));
        assert!(labeled_balance(&re, "nothing here").is_none());

        let tot = Regex::new(r"Totale Entrate\s*([\d.,]+)\s*€").unwrap();
        assert_eq!(labeled_amount(&tot, "Totale Entrate 2.500,00 €"), Some(Ok(2500.0)));
        assert_eq!(labeled_amount(&tot, "Totale Uscite 1,00 €"), None);
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(
            normalize_iban("IT60 X054 2811 1010 0000 0123 456"),
            "IT60X0542811101000000123456"
        );
        assert_eq!(normalize_whitespace("  PAGAMENTO   POS \t CONAD "), "PAGAMENTO POS CONAD");
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
    }
}
