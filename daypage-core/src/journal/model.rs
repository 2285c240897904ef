//! Journal entry model and structural validation of persisted data.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Format of the `date` key
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One calendar day's journal content
///
/// Serialized with the camelCase field names used by the persisted
/// `journalEntries` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Primary key, `YYYY-MM-DD`
    pub date: NaiveDate,

    /// Rich-text markup, may be empty
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Epoch milliseconds of the first write to this date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,

    /// Epoch milliseconds of the most recent write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

impl JournalEntry {
    pub fn new(date: NaiveDate, content: impl Into<String>, now_millis: i64) -> Self {
        Self {
            date,
            content: content.into(),
            title: None,
            started_at: Some(now_millis),
            last_modified: Some(now_millis),
        }
    }

    /// Validate one element of the persisted array
    ///
    /// Accepts the element only if `date` is a `YYYY-MM-DD` calendar date,
    /// `content` is a string, and `title`, `startedAt` and `lastModified`
    /// have the right type when present. `null` counts as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let date = object.get("date")?.as_str()?;
        if !date_pattern().is_match(date) {
            return None;
        }
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;

        let content = object.get("content")?.as_str()?.to_string();

        let title = match optional_field(object, "title") {
            None => None,
            Some(v) => Some(v.as_str()?.to_string()),
        };
        let started_at = match optional_field(object, "startedAt") {
            None => None,
            Some(v) => Some(as_millis(v)?),
        };
        let last_modified = match optional_field(object, "lastModified") {
            None => None,
            Some(v) => Some(as_millis(v)?),
        };

        Some(Self {
            date,
            content,
            title,
            started_at,
            last_modified,
        })
    }
}

/// Parse the persisted `journalEntries` document
///
/// Never fails: unparsable JSON yields an empty collection and malformed
/// elements are dropped. When a date appears twice the most recently
/// modified copy wins. The result is sorted newest date first.
pub fn parse_entries(raw: &str) -> Vec<JournalEntry> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Stored journal entries are not valid JSON, ignoring: {}", e);
            return Vec::new();
        }
    };

    let Some(items) = value.as_array() else {
        warn!("Stored journal entries are not an array, ignoring");
        return Vec::new();
    };

    let mut entries: Vec<JournalEntry> = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for item in items {
        let Some(entry) = JournalEntry::from_value(item) else {
            dropped += 1;
            continue;
        };

        match entries.iter_mut().find(|e| e.date == entry.date) {
            Some(existing) => {
                debug!("Duplicate entry for {}, keeping the newer one", entry.date);
                if entry.last_modified.unwrap_or(0) > existing.last_modified.unwrap_or(0) {
                    *existing = entry;
                }
            }
            None => entries.push(entry),
        }
    }

    if dropped > 0 {
        debug!("Dropped {} malformed journal entries", dropped);
    }

    sort_newest_first(&mut entries);
    entries
}

/// Display order: descending by date
pub fn sort_newest_first(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"))
}

fn optional_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn as_millis(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}
