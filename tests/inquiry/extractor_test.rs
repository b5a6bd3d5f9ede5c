//! Extraction from realistic inquiry e-mails.

use chrono::NaiveDate;
use watchdesk::inquiry::{InquiryExtractor, InquiryFields};

fn extract(text: &str) -> InquiryFields {
    InquiryExtractor::new().extract(text)
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

#[test]
fn compliance_escalation_email() {
    let text = "\
Subject: FW: Possible wash trades on AAPL

Compliance flagged account ACC-48211 for possible wash trades on AAPL \
between 2024-02-01 and 2024-02-29. The inquiry came from the equities desk. \
Please confirm which detection covers this.";
    let fields = extract(text);

    assert_eq!(fields.account_id.as_deref(), Some("ACC-48211"));
    assert_eq!(fields.symbol.as_deref(), Some("AAPL"));
    assert_eq!(fields.department.as_deref(), Some("equities"));
    assert_eq!(fields.report_type_hint.as_deref(), Some("wash_trade"));
    let range = fields.date_range.expect("date range");
    assert_eq!(range.start, ymd(2024, 2, 1));
    assert_eq!(range.end, ymd(2024, 2, 29));
    assert_eq!(fields.raw_text, text);
}

#[test]
fn trader_review_email() {
    let text = "Subject: Review trader EMP-2291\n\nEmployee EMP-2291 on the fixed-income \
                desk showed a layering pattern during March 2024. Ticker XYZ was the target.";
    let fields = extract(text);

    assert_eq!(fields.employee_id.as_deref(), Some("EMP-2291"));
    assert_eq!(fields.account_id, None);
    assert_eq!(fields.department.as_deref(), Some("fixed-income"));
    assert_eq!(fields.symbol.as_deref(), Some("XYZ"));
    assert_eq!(fields.report_type_hint.as_deref(), Some("layering"));
    let range = fields.date_range.expect("date range");
    assert_eq!(range.start, ymd(2024, 3, 1));
    assert_eq!(range.end, ymd(2024, 3, 31));
}

#[test]
fn insider_trading_alert_email() {
    let text = "Subject: Insider trading alert\n\nDepartment: Derivatives. Symbol: TSLA. \
                Employee id 88321 bought ahead of the 2024-05-02 announcement. Raise a \
                compliance violation if confirmed.";
    let fields = extract(text);

    assert_eq!(fields.employee_id.as_deref(), Some("88321"));
    assert_eq!(fields.department.as_deref(), Some("derivatives"));
    assert_eq!(fields.symbol.as_deref(), Some("TSLA"));
    assert_eq!(fields.report_type_hint.as_deref(), Some("insider_trading"));
    let range = fields.date_range.expect("date range");
    assert_eq!(range.start, ymd(2024, 5, 2));
    assert_eq!(range.end, ymd(2024, 5, 2));

    let keywords = InquiryExtractor::new().keywords(text);
    assert_eq!(keywords, vec!["insider", "alert", "violation", "compliance"]);
}

#[test]
fn labeled_identifiers_beat_bare_shapes() {
    let fields = extract("account ACC-100 traded opposite EMP-200 and counterparty BRK-300");

    // The label claims ACC-100; EMP-200 routes by prefix; BRK-300 loses to
    // the labeled account.
    assert_eq!(fields.account_id.as_deref(), Some("ACC-100"));
    assert_eq!(fields.employee_id.as_deref(), Some("EMP-200"));
    assert_eq!(fields.symbol, None);
}

#[test]
fn garbage_input_never_fails() {
    let text = "\u{0}\u{1} ===== %%% \u{1F643} not an inquiry at all \u{1F643}";
    let fields = extract(text);

    assert_eq!(fields.account_id, None);
    assert_eq!(fields.employee_id, None);
    assert_eq!(fields.department, None);
    assert_eq!(fields.symbol, None);
    assert_eq!(fields.date_range, None);
    assert_eq!(fields.report_type_hint, None);
    assert_eq!(fields.raw_text, text);
}

#[test]
fn currencies_and_boilerplate_never_read_as_symbols() {
    let fields = extract("FYI the USD leg settled at 4 PM EST, CC the CFO");
    assert_eq!(fields.symbol, None);
}
