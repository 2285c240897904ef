//! Merging a parsed backup into the local collection.
//!
//! Nothing local is ever discarded: when both sides hold different text for
//! the same day, the imported text is appended under a labelled separator.

use crate::clock::local_date;
use crate::journal::markup::{is_blank, plain_to_markup, strip_markup, EMPTY_LINE};
use crate::journal::model::{sort_newest_first, JournalEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One day read back from a backup document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedEntry {
    pub date: NaiveDate,
    /// Plain text body
    pub content: String,
    pub started_at: Option<i64>,
}

/// What a merge did, per imported day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Days that did not exist locally
    pub inserted: usize,
    /// Days whose imported text was appended to local text
    pub merged: usize,
    /// Days left as they were (same text, or nothing to import)
    pub unchanged: usize,
}

/// Merge `imported` into `existing`, returning the new collection
pub fn merge_imported(
    existing: &[JournalEntry],
    imported: &[ImportedEntry],
    import_timestamp: i64,
) -> Vec<JournalEntry> {
    merge_with_report(existing, imported, import_timestamp).0
}

/// Merge `imported` into `existing`, also reporting what changed
pub fn merge_with_report(
    existing: &[JournalEntry],
    imported: &[ImportedEntry],
    import_timestamp: i64,
) -> (Vec<JournalEntry>, MergeReport) {
    let mut by_date: BTreeMap<NaiveDate, JournalEntry> =
        existing.iter().map(|e| (e.date, e.clone())).collect();
    let mut report = MergeReport::default();

    for incoming in imported {
        let incoming_text = incoming.content.trim();

        match by_date.get_mut(&incoming.date) {
            None => {
                if incoming_text.is_empty() {
                    report.unchanged += 1;
                    continue;
                }
                by_date.insert(
                    incoming.date,
                    JournalEntry {
                        date: incoming.date,
                        content: plain_to_markup(&incoming.content),
                        title: None,
                        started_at: Some(incoming.started_at.unwrap_or(import_timestamp)),
                        last_modified: Some(import_timestamp),
                    },
                );
                report.inserted += 1;
            }
            Some(local) => {
                let local_text = strip_markup(&local.content);
                if incoming_text.is_empty() || local_text.trim() == incoming_text {
                    report.unchanged += 1;
                    continue;
                }

                if is_blank(&local.content) {
                    local.content = plain_to_markup(&incoming.content);
                } else {
                    local.content = format!(
                        "{}{}{}{}",
                        local.content,
                        EMPTY_LINE,
                        backup_label(import_timestamp),
                        plain_to_markup(&incoming.content)
                    );
                }

                if let Some(imported_start) = incoming.started_at {
                    if local.started_at.map_or(true, |s| imported_start < s) {
                        local.started_at = Some(imported_start);
                    }
                }
                local.last_modified = Some(
                    local
                        .last_modified
                        .map_or(import_timestamp, |m| m.max(import_timestamp)),
                );
                report.merged += 1;
            }
        }
    }

    let mut merged: Vec<JournalEntry> = by_date.into_values().collect();
    sort_newest_first(&mut merged);
    (merged, report)
}

/// Separator paragraph placed before appended backup text
pub fn backup_label(import_timestamp: i64) -> String {
    format!(
        "<p><em>from {} backup:</em></p>",
        local_date(import_timestamp).format("%Y-%m-%d")
    )
}
