//! Date range recognition for inquiry text.
//!
//! Three expression forms are recognized: explicit dates (`2024-03-15`,
//! slashes allowed), month name plus year (`March 2024`), and bare years
//! (`2024`). Every expression contributes an inclusive span; the final
//! range runs from the earliest span start to the latest span end, which
//! also normalizes reversed input order.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::DateRange;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})[-/](\d{2})[-/](\d{2})\b").expect("iso date pattern compiles")
});

static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|sept|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{4})\b",
    )
    .expect("month-year pattern compiles")
});

static BARE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("bare year pattern compiles"));

/// Extract an inclusive date range from free text.
///
/// Returns `None` when no valid date expression is present. Lexically
/// well-formed but impossible dates (`2024-13-45`) are skipped.
pub(crate) fn extract_date_range(text: &str) -> Option<DateRange> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut ranges: Vec<(NaiveDate, NaiveDate)> = Vec::new();

    // Explicit dates first. Their text spans shadow the bare-year scan even
    // when the date itself turns out impossible, so `2024-13-45` yields no
    // range rather than a whole-year one.
    for caps in ISO_DATE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        spans.push((whole.start(), whole.end()));

        let date = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(y), Some(m), Some(d)) => parse_ymd(y.as_str(), m.as_str(), d.as_str()),
            _ => None,
        };
        if let Some(date) = date {
            ranges.push((date, date));
        }
    }

    for caps in MONTH_YEAR.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        spans.push((whole.start(), whole.end()));

        let month = caps.get(1).and_then(|m| month_number(m.as_str()));
        let year: Option<i32> = caps.get(2).and_then(|y| y.as_str().parse().ok());
        if let (Some(month), Some(year)) = (month, year) {
            if let Some(span) = month_span(year, month) {
                ranges.push(span);
            }
        }
    }

    for caps in BARE_YEAR.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&spans, whole.start(), whole.end()) {
            continue;
        }
        if let Some(span) = whole.as_str().parse().ok().and_then(year_span) {
            ranges.push(span);
        }
    }

    let start = ranges.iter().map(|r| r.0).min()?;
    let end = ranges.iter().map(|r| r.1).max()?;
    Some(DateRange { start, end })
}

/// Whether `[start, end)` intersects any already-recognized span.
fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}

fn parse_ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// First and last day of the given month.
fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?
    };
    Some((start, next_month_start.pred_opt()?))
}

/// January 1st through December 31st of the given year.
fn year_span(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    match lower.get(0..3)? {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
