//! Fixed-locale formatting: `1,234.56` money, `dd/mm/yyyy` dates.
//!
//! This is the only place amounts are rounded.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::OnceLock;

pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Rounds to cents and groups thousands: `1234.5` -> `1,234.50`.
pub fn money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{dec_part}")
}

pub fn money_with_currency(value: Decimal, currency: &str) -> String {
    format!("{} {}", money(value), currency)
}

/// Unit price column: two decimals, no grouping.
pub fn price(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// `22` -> `22%`, `8.50` -> `8.5%`.
pub fn percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

pub fn date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn parse_validity_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Output file name for a client: `Acme Srl` -> `Quote_Acme_Srl.pdf`.
///
/// Whitespace runs become `_`; path separators are dropped so the name
/// cannot escape the output directory.
pub fn quote_file_name(client: &str) -> String {
    let cleaned: String = client
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '\0'))
        .collect();
    let joined = whitespace_re().replace_all(&cleaned, "_");
    let stem = if joined.is_empty() { "Client" } else { &*joined };
    format!("Quote_{stem}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(dec!(0)), "0.00");
        assert_eq!(money(dec!(999.999)), "1,000.00");
        assert_eq!(money(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(money(dec!(123456)), "123,456.00");
        assert_eq!(money(dec!(-1234.5)), "-1,234.50");
    }

    #[test]
    fn money_rounds_half_away_from_zero() {
        assert_eq!(money(dec!(10.989)), "10.99");
        assert_eq!(money(dec!(60.9389)), "60.94");
        assert_eq!(money(dec!(0.005)), "0.01");
        assert_eq!(money(dec!(-0.001)), "0.00");
    }

    #[test]
    fn currency_suffix() {
        assert_eq!(money_with_currency(dec!(1500), "€"), "1,500.00 €");
    }

    #[test]
    fn price_has_two_decimals() {
        assert_eq!(price(dec!(25.5)), "25.50");
        assert_eq!(price(dec!(1000)), "1000.00");
    }

    #[test]
    fn percent_drops_trailing_zeros() {
        assert_eq!(percent(dec!(22)), "22%");
        assert_eq!(percent(dec!(22.0)), "22%");
        assert_eq!(percent(dec!(8.50)), "8.5%");
    }

    #[test]
    fn dates_round_trip_day_first() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(date(d), "09/03/2026");
        assert_eq!(parse_validity_date(" 09/03/2026 ").unwrap(), d);
        assert!(parse_validity_date("2026-03-09").is_err());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(quote_file_name("Cliente Finale"), "Quote_Cliente_Finale.pdf");
        assert_eq!(quote_file_name("  Acme \t S.r.l.  "), "Quote_Acme_S.r.l..pdf");
        assert_eq!(quote_file_name("../etc/passwd"), "Quote_..etcpasswd.pdf");
        assert_eq!(quote_file_name("   "), "Quote_Client.pdf");
    }
}
