//! Inquiry field extraction.
//!
//! Pattern-based extraction of structured fields from free-text inquiry
//! e-mails: account and employee identifiers, department, ticker symbol,
//! date range, and a canonical report-type hint. Extraction is
//! deterministic and infallible — fields that cannot be extracted are left
//! absent, never errors.

mod dates;
mod patterns;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range extracted from an inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day covered by the inquiry.
    pub start: NaiveDate,
    /// Last day covered by the inquiry.
    pub end: NaiveDate,
}

/// Structured fields extracted from one inquiry text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryFields {
    /// Account identifier (uppercased), e.g. `ACC-123`.
    pub account_id: Option<String>,
    /// Employee or trader identifier (uppercased), e.g. `EMP-4521`.
    pub employee_id: Option<String>,
    /// Department or desk name (lowercased), e.g. `equities`.
    pub department: Option<String>,
    /// Ticker symbol, e.g. `AAPL`.
    pub symbol: Option<String>,
    /// Inclusive date range mentioned in the text.
    pub date_range: Option<DateRange>,
    /// Canonical report type hinted at by the text, e.g. `wash_trade`.
    pub report_type_hint: Option<String>,
    /// The inquiry text, preserved verbatim.
    pub raw_text: String,
}

/// Extracts structured fields from free-text inquiries.
///
/// All patterns are static and compiled once at first use, so construction
/// is free. Within a field, labeled matches beat bare shape matches, and
/// the first occurrence wins among matches of the same rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct InquiryExtractor;

impl InquiryExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract all fields from `raw_text`. Never fails.
    pub fn extract(&self, raw_text: &str) -> InquiryFields {
        let labeled_account = extract_labeled_id(raw_text, &patterns::LABELED_ACCOUNT);
        let labeled_employee = extract_labeled_id(raw_text, &patterns::LABELED_EMPLOYEE);

        // Shaped tokens already captured by a labeled rule stay claimed so
        // they cannot leak into the other identifier field.
        let claimed: Vec<&str> = labeled_account
            .iter()
            .chain(labeled_employee.iter())
            .map(String::as_str)
            .collect();
        let (shaped_account, shaped_employee) = extract_shaped_ids(raw_text, &claimed);

        InquiryFields {
            account_id: labeled_account.or(shaped_account),
            employee_id: labeled_employee.or(shaped_employee),
            department: extract_department(raw_text),
            symbol: extract_symbol(raw_text),
            date_range: dates::extract_date_range(raw_text),
            report_type_hint: patterns::report_type_hint(raw_text),
            raw_text: raw_text.to_owned(),
        }
    }

    /// Surveillance topic keywords found in `text`, in vocabulary order,
    /// normalized to `snake_case`, without duplicates.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        patterns::topic_keywords(text)
    }
}

/// First labeled identifier whose token contains a digit, uppercased.
///
/// The digit requirement keeps ordinary words after a label ("the account
/// was closed") from being read as identifiers.
fn extract_labeled_id(text: &str, pattern: &regex::Regex) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|token| token.chars().any(|c| c.is_ascii_digit()))
        .map(|token| token.to_uppercase())
}

/// Bare shaped identifiers, routed by prefix: `EMP…` tokens fill the
/// employee slot, everything else the account slot. First occurrence wins
/// per slot; tokens in `claimed` are skipped.
fn extract_shaped_ids(text: &str, claimed: &[&str]) -> (Option<String>, Option<String>) {
    let mut account = None;
    let mut employee = None;

    for caps in patterns::SHAPED_ID.captures_iter(text) {
        let Some(token) = caps.get(1) else { continue };
        let token = token.as_str();
        if claimed.contains(&token) {
            continue;
        }
        if token.starts_with("EMP") {
            if employee.is_none() {
                employee = Some(token.to_owned());
            }
        } else if account.is_none() {
            account = Some(token.to_owned());
        }
    }

    (account, employee)
}

/// Department name, lowercased: `department <word>` form first, then the
/// `<word> desk` form. Articles and similar filler words never match.
fn extract_department(text: &str) -> Option<String> {
    let labeled = patterns::DEPARTMENT_LABELED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .find(|word| !patterns::DEPARTMENT_STOPWORDS.contains(&word.as_str()));
    if labeled.is_some() {
        return labeled;
    }

    patterns::DESK_FORM
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .find(|word| !patterns::DEPARTMENT_STOPWORDS.contains(&word.as_str()))
}

/// Ticker symbol: whole tokens of uppercase ASCII letters, at most five.
/// Tokens following a labeling word (`symbol`, `ticker`, `stock`, `on`,
/// `for`) are preferred and may be a single letter; bare tokens need at
/// least two. Stopwords (currencies, abbreviations) never match.
fn extract_symbol(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    for pair in words.windows(2) {
        let (Some(prev), Some(word)) = (pair.first(), pair.get(1)) else {
            continue;
        };
        let label = trim_token(prev).to_lowercase();
        if !patterns::SYMBOL_LABELS.contains(&label.as_str()) {
            continue;
        }
        let token = trim_token(word);
        if is_symbol_token(token, 1) {
            return Some(token.to_owned());
        }
    }

    words
        .iter()
        .map(|word| trim_token(word))
        .find(|token| is_symbol_token(token, 2))
        .map(ToOwned::to_owned)
}

/// Strip surrounding punctuation from a whitespace token, keeping inner
/// hyphens and underscores.
fn trim_token(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
}

/// Whole token of `min_len..=5` uppercase ASCII letters, not a stopword.
fn is_symbol_token(token: &str, min_len: usize) -> bool {
    token.len() >= min_len
        && token.len() <= 5
        && token.chars().all(|c| c.is_ascii_uppercase())
        && !patterns::SYMBOL_STOPWORDS.contains(&token)
}
