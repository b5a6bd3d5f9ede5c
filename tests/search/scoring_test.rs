//! Scoring over scanned records, end to end.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use watchdesk::catalog::{CatalogRecord, CatalogScanner};
use watchdesk::config::CatalogConfig;
use watchdesk::search::{search, MatchQuery, MatchResult};

fn scan(dir: &TempDir) -> Vec<CatalogRecord> {
    let config = CatalogConfig {
        roots: vec![dir.path().to_path_buf()],
        ..CatalogConfig::default()
    };
    CatalogScanner::new(&config).scan()
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}

fn path_ends_with(result: &MatchResult, suffix: &str) -> bool {
    result.record.source_path.ends_with(PathBuf::from(suffix))
}

#[test]
fn every_rule_contributes_to_one_total() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("wash_trade_detection.yml"),
        "# @report_type: wash_trade\n# @tags: wash trade\nwatch for volume spikes\n",
    )
    .expect("write");

    let query = MatchQuery {
        report_type: Some("wash_trade".to_owned()),
        keywords: keywords(&["wash_trade"]),
        free_text: Some("volume spikes".to_owned()),
    };
    let results = search(scan(&dir), &query);

    // 10 for the report type, 3 for the tag, 2 for the name, 1 for content.
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 16);
    let fields: Vec<&str> = results[0].matched.iter().map(|m| m.field.as_str()).collect();
    assert_eq!(fields, vec!["report_type", "tags", "name", "content"]);
}

#[test]
fn report_type_outweighs_keyword_hits() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("typed.yml"),
        "# @report_type: wash_trade\nnothing else\n",
    )
    .expect("write");
    fs::write(
        dir.path().join("wash_trade_notes.yml"),
        "# @tags: wash trade\nnotes\n",
    )
    .expect("write");

    let query = MatchQuery {
        report_type: Some("wash_trade".to_owned()),
        keywords: keywords(&["wash_trade"]),
        free_text: None,
    };
    let results = search(scan(&dir), &query);

    assert_eq!(results.len(), 2);
    // typed.yml: 10. wash_trade_notes.yml: 3 (tag) + 2 (name) = 5.
    assert!(path_ends_with(&results[0], "typed.yml"));
    assert_eq!(results[0].score, 10);
    assert_eq!(results[1].score, 5);
}

#[test]
fn capabilities_match_when_tags_do_not() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("unrelated.yml"),
        "# @capability: cross_account_matching\nbody\n",
    )
    .expect("write");

    let query = MatchQuery {
        report_type: None,
        keywords: keywords(&["cross account matching"]),
        free_text: None,
    };
    let results = search(scan(&dir), &query);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 3);
    assert_eq!(results[0].matched[0].field, "capabilities");
}

#[test]
fn keyword_comparison_ignores_case_and_separators() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("mixed.yml"),
        "# @tags: Wash Trade\nbody\n",
    )
    .expect("write");

    let query = MatchQuery {
        report_type: None,
        keywords: keywords(&["WASH_TRADE"]),
        free_text: None,
    };
    let results = search(scan(&dir), &query);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 3);
}

#[test]
fn zero_scores_are_excluded_entirely() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("a_detection.yml"), "# @tags: spoofing\n").expect("write");
    fs::write(dir.path().join("unrelated.yml"), "fee schedule\n").expect("write");

    let query = MatchQuery {
        report_type: None,
        keywords: keywords(&["spoofing"]),
        free_text: None,
    };
    let results = search(scan(&dir), &query);

    assert_eq!(results.len(), 1);
    assert!(path_ends_with(&results[0], "a_detection.yml"));
}

#[test]
fn empty_query_matches_nothing() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("a_detection.yml"), "# @tags: spoofing\n").expect("write");

    assert!(search(scan(&dir), &MatchQuery::default()).is_empty());
}

#[test]
fn tied_scores_keep_scan_order() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("alpha.yml"), "# @tags: spoofing\n").expect("write");
    fs::write(dir.path().join("beta.yml"), "# @tags: spoofing\n").expect("write");

    let query = MatchQuery {
        report_type: None,
        keywords: keywords(&["spoofing"]),
        free_text: None,
    };
    let results = search(scan(&dir), &query);

    assert_eq!(results.len(), 2);
    assert!(path_ends_with(&results[0], "alpha.yml"));
    assert!(path_ends_with(&results[1], "beta.yml"));
}
