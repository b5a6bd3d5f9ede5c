//! Additive scoring of catalog records against a match query.
//!
//! Every rule contributes points independently; nothing suppresses anything
//! else. Records that score zero are dropped, and ties keep their scan
//! order, so the ranking is deterministic for a fixed catalog.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CatalogRecord;

/// Points for an exact report-type match.
const REPORT_TYPE_POINTS: u32 = 10;
/// Points per keyword equal to a tag or capability.
const TAG_POINTS: u32 = 3;
/// Points per keyword found in the domain or the record name.
const NAME_POINTS: u32 = 2;
/// Points for a free-text hit in the raw content.
const FREE_TEXT_POINTS: u32 = 1;

/// What to look for in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuery {
    /// Canonical report type the inquiry is about.
    pub report_type: Option<String>,
    /// Topic keywords, deduplicated by the builder.
    pub keywords: Vec<String>,
    /// Raw text for content substring matching.
    pub free_text: Option<String>,
}

/// One scoring rule that fired, for explainability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedField {
    /// Record field the rule hit (`report_type`, `tags`, `capabilities`,
    /// `domain`, `name`, `content`).
    pub field: String,
    /// The value that matched.
    pub value: String,
}

/// A scored catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The record itself.
    pub record: CatalogRecord,
    /// Total additive score.
    pub score: u32,
    /// Which rules fired.
    pub matched: Vec<MatchedField>,
}

/// Score every record against the query, drop zero scores, and sort by
/// score descending. The sort is stable, so tied records keep their scan
/// order.
pub fn search(records: Vec<CatalogRecord>, query: &MatchQuery) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = records
        .into_iter()
        .filter_map(|record| {
            let (score, matched) = score_record(&record, query);
            (score > 0).then(|| MatchResult {
                record,
                score,
                matched,
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    debug!(results = results.len(), "catalog search complete");
    results
}

/// Apply every scoring rule to one record.
fn score_record(record: &CatalogRecord, query: &MatchQuery) -> (u32, Vec<MatchedField>) {
    let mut score: u32 = 0;
    let mut matched = Vec::new();

    if let (Some(wanted), Some(declared)) = (&query.report_type, &record.report_type) {
        if wanted.eq_ignore_ascii_case(declared) {
            score = score.saturating_add(REPORT_TYPE_POINTS);
            matched.push(MatchedField {
                field: "report_type".to_owned(),
                value: declared.clone(),
            });
        }
    }

    let name = normalize(&record.display_name());
    let domain = record.domain.as_deref().map(normalize);

    for keyword in &query.keywords {
        let keyword = normalize(keyword);
        if keyword.is_empty() {
            continue;
        }

        if record.tags.iter().any(|t| normalize(t) == keyword) {
            score = score.saturating_add(TAG_POINTS);
            matched.push(MatchedField {
                field: "tags".to_owned(),
                value: keyword.clone(),
            });
        } else if record.capabilities.iter().any(|c| normalize(c) == keyword) {
            score = score.saturating_add(TAG_POINTS);
            matched.push(MatchedField {
                field: "capabilities".to_owned(),
                value: keyword.clone(),
            });
        }

        if domain.as_deref().is_some_and(|d| d.contains(&keyword)) {
            score = score.saturating_add(NAME_POINTS);
            matched.push(MatchedField {
                field: "domain".to_owned(),
                value: keyword.clone(),
            });
        } else if name.contains(&keyword) {
            score = score.saturating_add(NAME_POINTS);
            matched.push(MatchedField {
                field: "name".to_owned(),
                value: keyword,
            });
        }
    }

    if let Some(free_text) = &query.free_text {
        if !free_text.is_empty()
            && record
                .raw_content
                .to_lowercase()
                .contains(&free_text.to_lowercase())
        {
            score = score.saturating_add(FREE_TEXT_POINTS);
            matched.push(MatchedField {
                field: "content".to_owned(),
                value: free_text.clone(),
            });
        }
    }

    (score, matched)
}

/// Normalization for keyword comparison: lowercase, underscores as spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase().replace('_', " ")
}
