//! Text normalisation: deterministic cleanup of extracted page text.
//!
//! pdfium returns text with whatever characters the payroll template used:
//! typographic minus signs in amounts, non-breaking spaces between columns,
//! zero-width joiners, CR line endings. The parser's regexes assume plain
//! ASCII dashes and single spaces, so every line passes through these
//! rules first. Each rule is a pure `&str → String` pass and is tested on
//! its own.
//!
//! ## Rule Order
//!
//! Line endings are normalised before splitting. Invisible characters go
//! before dash/space folding so a zero-width space between a minus and a
//! digit cannot survive. The indentation column is measured after folding
//! (a non-breaking-space indent counts) and before collapsing.

use once_cell::sync::Lazy;
use regex::Regex;

/// One cleaned, non-empty line of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine {
    /// 1-based line number within the raw page text.
    pub row: usize,
    /// Leading indentation in characters.
    pub column: usize,
    pub text: String,
}

/// Apply every rule to one page of raw text, dropping empty lines.
pub fn normalize_page(raw: &str) -> Vec<NormalizedLine> {
    let text = normalise_line_endings(raw);
    text.split('\n')
        .enumerate()
        .filter_map(|(i, line)| {
            let line = remove_invisible_chars(line);
            let line = fold_dashes(&line);
            let line = fold_spaces(&line);
            let column = indentation(&line);
            let line = collapse_whitespace(&line);
            let line = line.trim();
            if line.is_empty() {
                None
            } else {
                Some(NormalizedLine {
                    row: i + 1,
                    column,
                    text: line.to_string(),
                })
            }
        })
        .collect()
}

/// Normalise a single line of text. Used for mapping patterns and labels.
pub fn normalize_line(line: &str) -> String {
    let s = remove_invisible_chars(line);
    let s = fold_dashes(&s);
    let s = fold_spaces(&s);
    collapse_whitespace(&s).trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{0000}',
        ],
        "",
    )
}

// ── Rule 3: Fold typographic dashes to ASCII hyphen-minus ───────────────────

fn fold_dashes(input: &str) -> String {
    input.replace(
        ['\u{2212}', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{FE63}', '\u{FF0D}'],
        "-",
    )
}

// ── Rule 4: Fold exotic spaces and tabs to ASCII space ──────────────────────

fn fold_spaces(input: &str) -> String {
    input.replace(
        ['\u{00A0}', '\u{2007}', '\u{202F}', '\u{2009}', '\u{3000}', '\t'],
        " ",
    )
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

// ── Rule 5: Collapse whitespace runs ─────────────────────────────────────────

static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_SPACES.replace_all(input, " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        assert_eq!(remove_invisible_chars("12\u{200B}3\u{FEFF}4.00"), "1234.00");
    }

    #[test]
    fn test_fold_dashes() {
        assert_eq!(fold_dashes("\u{2212}1,200.00"), "-1,200.00");
        assert_eq!(fold_dashes("Pre\u{2011}Tax Dental"), "Pre-Tax Dental");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Regular    5,000.00\t\t60,000.00"), "Regular 5,000.00 60,000.00");
    }

    #[test]
    fn page_keeps_row_numbers_and_drops_blank_lines() {
        let page = "Earnings\r\n\r\n   Regular\u{00A0}\u{00A0}5,000.00\n \u{200B} \n";
        let lines = normalize_page(page);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].row, 1);
        assert_eq!(lines[0].column, 0);
        assert_eq!(lines[1].row, 3);
        assert_eq!(lines[1].column, 3);
        assert_eq!(lines[1].text, "Regular 5,000.00");
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(normalize_page("").is_empty());
        assert!(normalize_page("  \n\t\n\u{00A0}").is_empty());
    }

    #[test]
    fn normalize_line_is_idempotent() {
        let once = normalize_line("  Federal\u{00A0}Income   Tax \u{2212}1,200.00 ");
        assert_eq!(once, "Federal Income Tax -1,200.00");
        assert_eq!(normalize_line(&once), once);
    }
}
