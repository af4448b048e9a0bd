//! Layout classification: regular pay vs. RSU vest, plus header metadata.
//!
//! Matching is label-anchored rather than coordinate-based: find the label
//! text ("Pay Date", "Advice Number", ...) and read the token right after
//! it, or the first token of the next line when the label ends its line.
//! This survives the column shifts pdfium introduces between template
//! revisions.

use crate::config::ProcessingConfig;
use crate::error::PaystubError;
use crate::output::{KeyPatterns, PaystubHeader};
use crate::money::find_amounts;
use crate::pipeline::extract::Document;
use crate::pipeline::parse::current_amount;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

static RE_VEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:rsu\s+vest(?:ing)?|stock\s+vest)\b").unwrap());

/// A vest earning line: the label opens the line.
static RE_VEST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:rsu|stock)\s+vest(?:ing)?\b").unwrap());

static RE_PAY_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpay\s+date\b\s*:?\s*(?P<rest>.*)$").unwrap());

static RE_PERIOD_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bperiod\s+(?:beginning|start(?:ing)?)\b(?:\s+date)?\s*:?\s*(?P<rest>.*)$")
        .unwrap()
});

static RE_PERIOD_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bperiod\s+(?:ending|end)\b(?:\s+date)?\s*:?\s*(?P<rest>.*)$").unwrap()
});

static RE_ADVICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\badvice\s*(?:number\b|no\b\.?|#)|\bcheck\s+(?:number\b|no\b\.?))\s*[:#]?\s*(?P<rest>.*)$",
    )
    .unwrap()
});

static RE_ADVICE_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-]*$").unwrap());

/// Read the header and decide whether the stub is a vest event.
pub fn classify(document: &Document, config: &ProcessingConfig) -> Result<PaystubHeader, PaystubError> {
    let is_vest_event = has_current_vest(document, config);

    let pay_date = find_value(document, &RE_PAY_DATE, |t| parse_date(t, &config.date_formats))
        .ok_or(PaystubError::UnrecognizedLayout {
            missing: "pay date",
        })?;

    let advice_number = find_value(document, &RE_ADVICE, parse_advice).ok_or(
        PaystubError::UnrecognizedLayout {
            missing: "advice number",
        },
    )?;

    let period_start = find_value(document, &RE_PERIOD_START, |t| {
        parse_date(t, &config.date_formats)
    })
    .unwrap_or_else(|| {
        debug!("No period start found, using first of pay month");
        first_of_month(pay_date)
    });
    let period_end = find_value(document, &RE_PERIOD_END, |t| parse_date(t, &config.date_formats))
        .unwrap_or(pay_date);

    info!(
        %pay_date,
        advice = %advice_number,
        vest = is_vest_event,
        "Classified paystub"
    );

    Ok(PaystubHeader {
        pay_date,
        period_start,
        period_end,
        advice_number,
        is_vest_event,
    })
}

/// A vest earning with a non-zero amount this period. Regular stubs after a
/// vest keep a YTD-only "Rsu Vest" line, which does not count.
fn has_current_vest(document: &Document, config: &ProcessingConfig) -> bool {
    document.lines.iter().any(|line| {
        RE_VEST_ITEM.is_match(&line.text)
            && current_amount(&find_amounts(&line.text), config.ytd_columns)
                .is_some_and(|amount| !amount.is_zero())
    })
}

/// Which landmarks are present, for `inspect`.
pub fn key_patterns(document: &Document) -> KeyPatterns {
    static RE_EARNINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^earnings\b").unwrap());
    static RE_DEDUCTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^deductions\b").unwrap());
    static RE_NET_PAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnet\s+pay\b").unwrap());

    let any = |re: &Regex| document.lines.iter().any(|l| re.is_match(&l.text));
    KeyPatterns {
        pay_date: any(&RE_PAY_DATE),
        earnings: any(&RE_EARNINGS),
        deductions: any(&RE_DEDUCTIONS),
        net_pay: any(&RE_NET_PAY),
        rsu_vest: any(&RE_VEST),
        advice_number: any(&RE_ADVICE),
    }
}

/// First value, in reading order, that follows `label` and parses.
fn find_value<T>(
    document: &Document,
    label: &Regex,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let lines = &document.lines;
    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = label.captures(&line.text) else {
            continue;
        };
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");
        let token = match first_token(rest) {
            Some(t) => t,
            None => match lines.get(i + 1).and_then(|next| first_token(&next.text)) {
                Some(t) => t,
                None => continue,
            },
        };
        if let Some(value) = parse(token) {
            return Some(value);
        }
        debug!(page = line.page, row = line.row, token, "label value did not parse");
    }
    None
}

fn first_token(text: &str) -> Option<&str> {
    text.split_whitespace()
        .next()
        .map(|t| t.trim_end_matches([',', ';', '.']))
        .filter(|t| !t.is_empty())
}

/// Parse with each format in turn. Years outside 1970–2100 are rejected so a
/// two-digit year never parses as the year 25.
pub fn parse_date(token: &str, formats: &[String]) -> Option<NaiveDate> {
    formats
        .iter()
        .filter_map(|f| NaiveDate::parse_from_str(token, f).ok())
        .find(|d| (1970..=2100).contains(&d.year()))
}

fn parse_advice(token: &str) -> Option<String> {
    if RE_ADVICE_VALUE.is_match(token) && token.chars().any(|c| c.is_ascii_digit()) {
        Some(token.to_string())
    } else {
        None
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(text: &str) -> Result<PaystubHeader, PaystubError> {
        classify(&Document::from_text(text), &ProcessingConfig::default())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reads_same_line_values() {
        let h = header(
            "Company Inc.\n\
             Period Beginning: 08/16/2025 Period Ending: 08/31/2025\n\
             Pay Date: 08/29/2025\n\
             Advice Number: 00000123456",
        )
        .unwrap();
        assert_eq!(h.pay_date, ymd(2025, 8, 29));
        assert_eq!(h.period_start, ymd(2025, 8, 16));
        assert_eq!(h.period_end, ymd(2025, 8, 31));
        assert_eq!(h.advice_number, "00000123456");
        assert!(!h.is_vest_event);
    }

    #[test]
    fn reads_value_from_next_line() {
        let h = header("Pay Date:\n2025-08-29\nAdvice #\nA-778899").unwrap();
        assert_eq!(h.pay_date, ymd(2025, 8, 29));
        assert_eq!(h.advice_number, "A-778899");
    }

    #[test]
    fn period_defaults_to_pay_month() {
        let h = header("Pay Date: 08/29/25\nCheck Number 4455").unwrap();
        assert_eq!(h.pay_date, ymd(2025, 8, 29));
        assert_eq!(h.period_start, ymd(2025, 8, 1));
        assert_eq!(h.period_end, ymd(2025, 8, 29));
        assert_eq!(h.advice_number, "4455");
    }

    #[test]
    fn vest_marker_sets_flag() {
        let h = header(
            "Pay Date: 08/29/2025\nAdvice No. 991\nEarnings\nRsu Vest 10,000.00 40,000.00",
        )
        .unwrap();
        assert!(h.is_vest_event);
        assert_eq!(h.advice_number, "991");
    }

    #[test]
    fn ytd_only_vest_line_is_not_a_vest_event() {
        let ytd_only = header(
            "Pay Date: 10/15/2025\nAdvice No. 992\nEarnings\nRegular 5,000.00 50,000.00\nRsu Vest 40,000.00",
        )
        .unwrap();
        assert!(!ytd_only.is_vest_event);

        let zero = header("Pay Date: 10/15/2025\nAdvice No. 993\nRsu Vest 0.00 40,000.00").unwrap();
        assert!(!zero.is_vest_event);

        let note = header("Pay Date: 10/15/2025\nAdvice No. 994\nSee RSU vest summary").unwrap();
        assert!(!note.is_vest_event);
    }

    #[test]
    fn missing_advice_is_unrecognized() {
        let err = header("Pay Date: 08/29/2025\nEarnings\nRegular 5,000.00").unwrap_err();
        assert!(matches!(
            err,
            PaystubError::UnrecognizedLayout {
                missing: "advice number"
            }
        ));
    }

    #[test]
    fn unparseable_pay_date_is_unrecognized() {
        let err = header("Pay Date: soon\nAdvice Number: 12").unwrap_err();
        assert!(matches!(
            err,
            PaystubError::UnrecognizedLayout { missing: "pay date" }
        ));
    }

    #[test]
    fn two_digit_year_does_not_become_year_25() {
        let formats: Vec<String> = crate::config::DEFAULT_DATE_FORMATS
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(parse_date("01/15/24", &formats), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn key_patterns_report_landmarks() {
        let doc = Document::from_text("Pay Date: 08/29/2025\nEarnings\nDeductions\nNet Pay 1.00");
        let p = key_patterns(&doc);
        assert!(p.pay_date && p.earnings && p.deductions && p.net_pay);
        assert!(!p.rsu_vest && !p.advice_number);
    }
}
