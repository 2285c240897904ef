//! Plain-text backup document.
//!
//! ```text
//! # Journal Backup
//!
//! ---
//!
//! ## Monday, January 27, 2025
//!
//! *Started at 09:15:02*
//!
//! Body text, one line per paragraph.
//! ```
//!
//! Entries are written oldest first. Body lines that would read as a heading
//! or a started-at line are prefixed with a backslash.

use crate::{
    clock::{local_datetime, local_millis},
    journal::{markup::strip_markup, ImportedEntry, JournalEntry},
};
use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::{debug, warn};

/// First line of every exported document
pub const BACKUP_TITLE: &str = "# Journal Backup";

const HEADING_PREFIX: &str = "## ";
const LONG_DATE_FORMAT: &str = "%A, %B %-d, %Y";
const STARTED_PREFIX: &str = "*Started at ";
const STARTED_SUFFIX: &str = "*";

/// Render `entries` as a backup document
///
/// Entries without visible text are left out.
pub fn export_backup(entries: &[JournalEntry]) -> String {
    let mut sorted: Vec<&JournalEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut out = String::new();
    out.push_str(BACKUP_TITLE);
    out.push_str("\n\n---\n");

    let mut written = 0;
    for entry in sorted {
        let text = strip_markup(&entry.content);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        out.push('\n');
        out.push_str(HEADING_PREFIX);
        out.push_str(&entry.date.format(LONG_DATE_FORMAT).to_string());
        out.push_str("\n\n");

        if let Some(started_at) = entry.started_at {
            out.push_str(STARTED_PREFIX);
            out.push_str(&local_datetime(started_at).format("%H:%M:%S").to_string());
            out.push_str(STARTED_SUFFIX);
            out.push_str("\n\n");
        }

        for line in text.lines() {
            if needs_escape(line) {
                out.push('\\');
            }
            out.push_str(line);
            out.push('\n');
        }
        written += 1;
    }

    debug!("Exported {} entries", written);
    out
}

/// Parse a backup document into entries ready for merging
///
/// Sections whose heading is not a recognizable date are skipped along with
/// their body. Anything before the first heading is ignored.
pub fn parse_backup(text: &str) -> Vec<ImportedEntry> {
    let mut parsed = Vec::new();
    let mut current: Option<Section> = None;
    let mut skipping = false;

    for line in text.lines() {
        if let Some(heading) = line.strip_prefix(HEADING_PREFIX) {
            if let Some(section) = current.take() {
                parsed.push(section.finish());
            }
            match parse_long_date(heading) {
                Some(date) => {
                    current = Some(Section::new(date));
                    skipping = false;
                }
                None => {
                    warn!("Skipping backup section with unreadable heading: {}", heading);
                    skipping = true;
                }
            }
            continue;
        }

        if skipping {
            continue;
        }
        if let Some(section) = current.as_mut() {
            section.push_line(line);
        }
    }

    if let Some(section) = current.take() {
        parsed.push(section.finish());
    }

    debug!("Parsed {} entries from backup", parsed.len());
    parsed
}

struct Section {
    date: NaiveDate,
    started_at: Option<i64>,
    lines: Vec<String>,
}

impl Section {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            started_at: None,
            lines: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        // The started-at line may only precede the body
        let body_started = self.lines.iter().any(|l| !l.trim().is_empty());
        if !body_started && self.started_at.is_none() {
            if let Some(time) = parse_started_line(line) {
                self.started_at = Some(local_millis(
                    self.date,
                    time.hour(),
                    time.minute(),
                    time.second(),
                ));
                return;
            }
        }

        let line = match line.strip_prefix('\\') {
            Some(rest) if needs_escape(rest) => rest,
            _ => line,
        };
        self.lines.push(line.to_string());
    }

    fn finish(self) -> ImportedEntry {
        let content = self.lines.join("\n");
        ImportedEntry {
            date: self.date,
            content: content.trim_matches('\n').trim_end().to_string(),
            started_at: self.started_at,
        }
    }
}

fn needs_escape(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('*') || line.starts_with('\\')
}

fn parse_long_date(heading: &str) -> Option<NaiveDate> {
    let heading = heading.trim();
    if let Ok(date) = NaiveDate::parse_from_str(heading, "%A, %B %d, %Y") {
        return Some(date);
    }
    // Tolerate a weekday that disagrees with the date, or none at all
    let without_weekday = heading.split_once(", ").map_or(heading, |(_, rest)| rest);
    NaiveDate::parse_from_str(without_weekday, "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(heading, "%B %d, %Y"))
        .ok()
}

fn parse_started_line(line: &str) -> Option<NaiveTime> {
    let time = line
        .trim()
        .strip_prefix(STARTED_PREFIX)?
        .strip_suffix(STARTED_SUFFIX)?;
    NaiveTime::parse_from_str(time.trim(), "%H:%M:%S").ok()
}
