//! Fixed-point amount handling.
//!
//! Paystubs print money in several notations: `1,234.56`, `$1,234.56`,
//! `-1,234.56`, `-$1,234.56`, `$-1,234.56` and the accounting form
//! `(1,234.56)`. Everything funnels through [`parse_amount`] into a single
//! signed [`Decimal`], and leaves through [`format_amount`] as a plain
//! two-decimal string with a leading dash for negatives. Floats never touch
//! an amount.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Fraction digits in every emitted amount.
pub const AMOUNT_SCALE: u32 = 2;

/// A single money token as it appears on a paystub line.
///
/// Exactly two fraction digits are required so that rates (`62.5000`) and
/// plain integers (`80`) are never mistaken for amounts.
pub const MONEY_TOKEN: &str =
    r"(?:\(\s*\$?\s*\d{1,3}(?:,\d{3})*\.\d{2}\s*\)|\(\s*\$?\s*\d+\.\d{2}\s*\)|-?\$?-?\s?\d{1,3}(?:,\d{3})+\.\d{2}\b|-?\$?-?\s?\d+\.\d{2}\b)";

static RE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<open>\()?\s*(?P<lead>-)?\s*\$?\s*(?P<mid>-)?\s*(?P<digits>\d{1,3}(?:,\d{3})+|\d+)(?P<frac>\.\d+)?\s*(?P<close>\))?$")
        .unwrap()
});

/// Parse a printed amount into a signed decimal.
///
/// Returns `None` when the text is not an amount. Parentheses must be
/// balanced and may not be combined with a dash.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let caps = RE_AMOUNT.captures(text.trim())?;
    let parenthesised = match (caps.name("open"), caps.name("close")) {
        (Some(_), Some(_)) => true,
        (None, None) => false,
        _ => return None,
    };
    let dashes = caps.name("lead").is_some() as u8 + caps.name("mid").is_some() as u8;
    if dashes > 1 || (parenthesised && dashes > 0) {
        return None;
    }

    let digits = caps["digits"].replace(',', "");
    let frac = caps.name("frac").map(|m| m.as_str()).unwrap_or("");
    let magnitude = Decimal::from_str(&format!("{digits}{frac}")).ok()?;

    if parenthesised || dashes == 1 {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

/// Format an amount with exactly two fraction digits and a leading dash for
/// negatives. Zero never carries a sign.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return format!("{:.2}", Decimal::ZERO);
    }
    format!("{:.2}", rounded)
}

/// Find every money token in `text`, left to right.
pub fn find_amounts(text: &str) -> Vec<Decimal> {
    static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(MONEY_TOKEN).unwrap());
    RE_TOKEN
        .find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_plain_and_grouped() {
        assert_eq!(parse_amount("1234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount("0.00"), Some(dec!(0.00)));
    }

    #[test]
    fn negative_notations_agree() {
        let expected = Some(dec!(-1234.56));
        assert_eq!(parse_amount("(1,234.56)"), expected);
        assert_eq!(parse_amount("-1234.56"), expected);
        assert_eq!(parse_amount("-1,234.56"), expected);
        assert_eq!(parse_amount("-$1,234.56"), expected);
        assert_eq!(parse_amount("$-1,234.56"), expected);
        assert_eq!(parse_amount("($1,234.56)"), expected);
    }

    #[test]
    fn rejects_non_amounts() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("Regular"), None);
        assert_eq!(parse_amount("(1,234.56"), None);
        assert_eq!(parse_amount("--5.00"), None);
        assert_eq!(parse_amount("(-5.00)"), None);
        assert_eq!(parse_amount("12,34.00"), None);
    }

    #[test]
    fn format_two_decimals_with_dash() {
        assert_eq!(format_amount(dec!(5000)), "5000.00");
        assert_eq!(format_amount(dec!(-1200.5)), "-1200.50");
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
        assert_eq!(format_amount(-Decimal::ZERO), "0.00");
    }

    #[test]
    fn formatted_amount_parses_back() {
        for raw in ["(1,234.56)", "-0.45", "60,000.00", "$12.34", "-$999,999.99"] {
            let parsed = parse_amount(raw).unwrap();
            let emitted = format_amount(parsed);
            assert_eq!(parse_amount(&emitted), Some(parsed), "raw {raw} → {emitted}");
        }
    }

    #[test]
    fn finds_tokens_but_not_rates() {
        let found = find_amounts("Regular 62.5000 80.00 5,000.00 60,000.00");
        assert_eq!(found, vec![dec!(80.00), dec!(5000.00), dec!(60000.00)]);
    }
}
