//! Recursive directory scan producing catalog records.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::CatalogConfig;

use super::annotations::{parse_config_metadata, parse_test_metadata};
use super::{CatalogRecord, RecordKind};

/// Walks the configured roots and parses every config and test-definition
/// file into a [`CatalogRecord`].
#[derive(Debug, Clone)]
pub struct CatalogScanner {
    roots: Vec<PathBuf>,
    config_extensions: Vec<String>,
    test_extensions: Vec<String>,
}

impl CatalogScanner {
    /// Create a scanner from the catalog section of the configuration.
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            roots: config.roots.clone(),
            config_extensions: config.config_extensions.clone(),
            test_extensions: config.test_extensions.clone(),
        }
    }

    /// Scan all roots, in order, and return the records found.
    ///
    /// Entries are visited sorted by file name at every directory level, so
    /// the output order is deterministic for a fixed tree. Missing roots and
    /// unreadable files are logged at warn level and skipped; the scan
    /// itself never fails.
    pub fn scan(&self) -> Vec<CatalogRecord> {
        let mut records = Vec::new();

        for root in &self.roots {
            if !root.exists() {
                warn!(root = %root.display(), "catalog root does not exist, skipping");
                continue;
            }

            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable directory entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let path = entry.path();
                let Some(kind) = self.kind_for(path) else {
                    continue;
                };

                let text = match std::fs::read_to_string(path) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable file");
                        continue;
                    }
                };

                debug!(path = %path.display(), ?kind, "parsed catalog record");
                records.push(build_record(path.to_path_buf(), kind, text));
            }
        }

        info!(records = records.len(), "catalog scan complete");
        records
    }

    /// Decide the record kind from the file extension, if it is one we index.
    fn kind_for(&self, path: &Path) -> Option<RecordKind> {
        let ext = path.extension()?.to_str()?;
        if self.config_extensions.iter().any(|e| e == ext) {
            return Some(RecordKind::Config);
        }
        if self.test_extensions.iter().any(|e| e == ext) {
            return Some(RecordKind::TestDefinition);
        }
        None
    }
}

/// Turn one file's text into a record.
fn build_record(source_path: PathBuf, kind: RecordKind, text: String) -> CatalogRecord {
    match kind {
        RecordKind::Config => {
            let fields = parse_config_metadata(&text);
            CatalogRecord {
                source_path,
                kind,
                declared_name: fields.declared_name,
                report_type: fields.report_type,
                domain: fields.domain,
                capabilities: fields.capabilities,
                tags: fields.tags,
                linked_config: None,
                parameters: Vec::new(),
                issues: fields.issues,
                raw_content: text,
            }
        }
        RecordKind::TestDefinition => {
            let meta = parse_test_metadata(&text);
            CatalogRecord {
                source_path,
                kind,
                declared_name: meta.fields.declared_name,
                report_type: meta.fields.report_type,
                domain: meta.fields.domain,
                capabilities: meta.fields.capabilities,
                tags: meta.fields.tags,
                linked_config: meta.fields.linked_config,
                parameters: meta.parameters,
                issues: meta.fields.issues,
                raw_content: text,
            }
        }
    }
}
