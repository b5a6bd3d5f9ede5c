//! Extraction patterns and fixed vocabularies.
//!
//! All regexes are compiled once at first use via [`std::sync::LazyLock`].
//! The report-type table is ordered longest keyword first so multi-word
//! phrases win before any of their sub-words could fire.

use std::sync::LazyLock;

use regex::Regex;

/// Labeled account identifier: `account`/`acc` (optionally followed by
/// `id`/`number`/`no`), a whitespace/colon/hash separator, then the token.
/// A bare hyphen is not a separator, so the `ACC` inside `ACC-123` never
/// reads as a label.
pub(crate) static LABELED_ACCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:account|acc)\b(?:\s*(?:id|number|no\.?|num))?[\s:#]+([A-Za-z0-9][A-Za-z0-9_-]*)")
        .expect("labeled account pattern compiles")
});

/// Labeled employee identifier: `employee`/`emp`/`trader` plus separator.
pub(crate) static LABELED_EMPLOYEE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:employee|emp|trader)\b(?:\s*(?:id|number|no\.?|num))?[\s:#]+([A-Za-z0-9][A-Za-z0-9_-]*)")
        .expect("labeled employee pattern compiles")
});

/// Bare identifier shape: uppercase prefix, optional hyphen/underscore,
/// digits (`ACC-123`, `TRD9`). Case-sensitive on purpose.
pub(crate) static SHAPED_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{2,}[-_]?[0-9]+)\b").expect("shaped id pattern compiles")
});

/// Department by label: `department equities`, `dept: fixed-income`.
pub(crate) static DEPARTMENT_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:department|dept\.?)[\s:#]+([A-Za-z][A-Za-z&_-]*)")
        .expect("department pattern compiles")
});

/// Department by desk phrase: `the equities desk`.
pub(crate) static DESK_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Za-z][A-Za-z&_-]*)\s+desk\b").expect("desk pattern compiles")
});

/// Words that label a following ticker symbol.
pub(crate) const SYMBOL_LABELS: &[&str] = &["symbol", "ticker", "stock", "on", "for"];

/// Uppercase tokens that can never be ticker symbols: currencies,
/// time/timezone abbreviations, titles, and e-mail boilerplate.
pub(crate) const SYMBOL_STOPWORDS: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "AM", "PM", "UTC", "EST", "GMT", "CET",
    "CEO", "CFO", "COO", "LLC", "INC", "LTD", "PLC", "FYI", "RE", "FW", "CC", "BCC", "ID",
    "OK", "ASAP", "EOD", "COB", "THE", "AND", "FOR", "NOT", "ALL", "ANY", "NEW", "TOP", "IT",
    "IS", "TO", "IN", "AT", "BY", "OF", "ON", "OR", "AS", "BE", "WE", "NO", "UP", "IF",
];

/// Words never captured as a department name.
pub(crate) const DEPARTMENT_STOPWORDS: &[&str] =
    &["the", "a", "an", "this", "that", "our", "their", "my", "your", "front"];

/// Report-type keyword table, ordered longest keyword first. The first
/// keyword found in the (lowercased) text decides the canonical type, so
/// `wash trade` can never lose to a shorter overlapping keyword.
pub(crate) const REPORT_TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("insider trading", "insider_trading"),
    ("insider_trading", "insider_trading"),
    ("front running", "front_running"),
    ("front-running", "front_running"),
    ("front_running", "front_running"),
    ("wash trades", "wash_trade"),
    ("wash_trades", "wash_trade"),
    ("wash trade", "wash_trade"),
    ("wash_trade", "wash_trade"),
    ("spoofing", "spoofing"),
    ("layering", "layering"),
    ("insider", "insider_trading"),
];

/// Surveillance topic vocabulary for keyword derivation, in scan order.
pub(crate) const TOPIC_KEYWORDS: &[&str] = &[
    "wash trade",
    "spoofing",
    "layering",
    "front running",
    "insider",
    "manipulation",
    "alert",
    "violation",
    "compliance",
    "suspicious",
    "pattern",
    "detection",
    "threshold",
    "volume",
    "price",
];

/// Map text to a canonical report type via the keyword table.
///
/// Case-insensitive substring scan; first (longest) hit wins.
pub(crate) fn report_type_hint(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    REPORT_TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, report_type)| (*report_type).to_owned())
}

/// Collect surveillance topic keywords found in the text.
///
/// Returns vocabulary entries (spaces replaced with underscores) in
/// vocabulary order, without duplicates.
pub(crate) fn topic_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .map(|keyword| keyword.replace(' ', "_"))
        .collect()
}
