//! Page freshness parsing.
//!
//! Listing entries carry a human readable date such as `Dec 29, 2014`.
//! Bundled packs carry a compound value (`Pack #12 | Dec 29, 2014 | ...`) from
//! which the first date is taken.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Strategy for turning a page's date text into a date.
pub trait FreshnessParser: Send + Sync {
    /// Parse `text`, returning `None` when no date can be recovered.
    fn parse(&self, text: &str) -> Option<NaiveDate>;
}

/// Separator marking a compound (bundled pack) date value.
const COMPOUND_SEPARATOR: char = '|';

/// Formats tried, in order, for a plain month-day-year value.
const DIRECT_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%b %d %Y", "%m/%d/%Y", "%m-%d-%Y"];

static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})",
    )
    .expect("month/day/year pattern is valid")
});

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Default month-name/day/year parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthDayYearParser;

impl MonthDayYearParser {
    /// First month-name/day/year date found anywhere in `text`.
    pub fn first_embedded_date(text: &str) -> Option<NaiveDate> {
        MONTH_DAY_YEAR.captures_iter(text).find_map(|caps| {
            let month_prefix = caps.get(1)?.as_str().to_ascii_lowercase();
            let month = MONTHS.iter().position(|m| *m == month_prefix)? as u32 + 1;
            let day: u32 = caps.get(2)?.as_str().parse().ok()?;
            let year: i32 = caps.get(3)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
    }

    fn parse_direct(text: &str) -> Option<NaiveDate> {
        DIRECT_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    }
}

impl FreshnessParser for MonthDayYearParser {
    fn parse(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        if text.contains(COMPOUND_SEPARATOR) {
            Self::first_embedded_date(text)
        } else {
            Self::parse_direct(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_abbreviated_month() {
        let parser = MonthDayYearParser;
        assert_eq!(parser.parse("Dec 29, 2014"), Some(date(2014, 12, 29)));
        assert_eq!(parser.parse("  Jun 1, 2013\n"), Some(date(2013, 6, 1)));
    }

    #[test]
    fn test_parse_plain_full_month() {
        let parser = MonthDayYearParser;
        assert_eq!(parser.parse("December 29, 2014"), Some(date(2014, 12, 29)));
    }

    #[test]
    fn test_parse_plain_numeric() {
        let parser = MonthDayYearParser;
        assert_eq!(parser.parse("12/29/2014"), Some(date(2014, 12, 29)));
    }

    #[test]
    fn test_parse_compound_takes_first_date() {
        let parser = MonthDayYearParser;
        assert_eq!(
            parser.parse("Beatmap Pack #42 | Mar 3, 2014 | updated Apr 5, 2014"),
            Some(date(2014, 3, 3))
        );
    }

    #[test]
    fn test_parse_compound_full_month_and_ordinal() {
        let parser = MonthDayYearParser;
        assert_eq!(
            parser.parse("Pack | September 21st, 2012"),
            Some(date(2012, 9, 21))
        );
    }

    #[test]
    fn test_parse_compound_skips_invalid_day() {
        let parser = MonthDayYearParser;
        assert_eq!(
            parser.parse("Feb 30, 2014 | Feb 28, 2014"),
            Some(date(2014, 2, 28))
        );
    }

    #[test]
    fn test_parse_compound_without_date() {
        let parser = MonthDayYearParser;
        assert_eq!(parser.parse("Pack | soon"), None);
    }

    #[test]
    fn test_parse_garbage() {
        let parser = MonthDayYearParser;
        assert_eq!(parser.parse("yesterday"), None);
        assert_eq!(parser.parse(""), None);
    }
}
