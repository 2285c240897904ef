//! The authoritative collection of journal entries.
//!
//! Every mutator builds the next collection, writes it to the durable store,
//! and only then replaces the in-memory copy. There is no await point
//! between the two, so a reader of the durable store never sees a state the
//! in-memory collection has moved past.

use crate::{
    clock::Clock,
    context::AppContext,
    journal::{
        markup::is_blank,
        merge::{merge_with_report, ImportedEntry, MergeReport},
        model::{parse_entries, sort_newest_first, JournalEntry, DATE_FORMAT},
    },
    storage::{KeyValueStore, JOURNAL_ENTRIES_KEY, LAST_TYPED_TIME_KEY, SELECTED_DATE_KEY},
    Result,
};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_TIMESTAMP_GAP_MINUTES: i64 = 30;

/// Owns the per-day entries and the current selection
pub struct EntryStore {
    durable: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    timestamp_gap: Duration,
    entries: Vec<JournalEntry>,
    selected_date: NaiveDate,
    observed_today: NaiveDate,
}

impl EntryStore {
    /// Create an empty store, restoring the persisted selection
    ///
    /// Entries are not read until [`EntryStore::load`] or
    /// [`EntryStore::reload_entries`].
    pub fn new(ctx: &AppContext) -> Result<Self> {
        let today = ctx.clock.today();
        let selected_date = ctx
            .durable
            .get(SELECTED_DATE_KEY)?
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
            .unwrap_or(today);

        Ok(Self {
            durable: Arc::clone(&ctx.durable),
            clock: Arc::clone(&ctx.clock),
            timestamp_gap: Duration::try_minutes(ctx.config.timestamp_gap_minutes)
                .unwrap_or_else(|| Duration::minutes(DEFAULT_TIMESTAMP_GAP_MINUTES)),
            entries: Vec::new(),
            selected_date,
            observed_today: today,
        })
    }

    /// Create a store, load it, and make sure today's entry exists
    pub fn open(ctx: &AppContext) -> Result<Self> {
        let mut store = Self::new(ctx)?;
        store.load()?;
        store.ensure_today_entry()?;
        Ok(store)
    }

    /// Read and validate the persisted collection
    ///
    /// Malformed or unparsable data is dropped, never reported as an error.
    pub fn load(&mut self) -> Result<&[JournalEntry]> {
        self.entries = match self.durable.get(JOURNAL_ENTRIES_KEY)? {
            Some(raw) => parse_entries(&raw),
            None => Vec::new(),
        };
        debug!("Loaded {} journal entries", self.entries.len());
        Ok(&self.entries)
    }

    /// Save editor content for the selected date
    ///
    /// Blank content keeps an empty entry for today but deletes the entry
    /// for any other day. `timestamp` seeds `startedAt` when the day has
    /// none yet. The collection is on the durable store when this returns.
    pub fn save_entry(&mut self, content: &str, timestamp: Option<i64>) -> Result<()> {
        self.save_entry_for(self.selected_date, content, timestamp)
    }

    /// Save content for `date` without moving the selection
    ///
    /// Same rules as [`EntryStore::save_entry`].
    pub fn save_entry_for(
        &mut self,
        date: NaiveDate,
        content: &str,
        timestamp: Option<i64>,
    ) -> Result<()> {
        let today = self.clock.today();
        let now = self.clock.now_millis();
        let blank = is_blank(content);

        let mut next = self.entries.clone();

        if blank && date != today {
            next.retain(|e| e.date != date);
        } else {
            let content = if blank { String::new() } else { content.to_string() };
            match next.iter_mut().find(|e| e.date == date) {
                Some(entry) => {
                    entry.content = content;
                    entry.last_modified = Some(now);
                    if entry.started_at.is_none() {
                        entry.started_at = Some(timestamp.unwrap_or(now));
                    }
                }
                None => {
                    let mut entry = JournalEntry::new(date, content, now);
                    entry.started_at = Some(timestamp.unwrap_or(now));
                    next.push(entry);
                }
            }
        }

        sort_newest_first(&mut next);
        let serialized = serde_json::to_string(&next)?;
        if blank {
            self.durable.set(JOURNAL_ENTRIES_KEY, &serialized)?;
        } else {
            let typed_at = now.to_string();
            self.durable.set_many(&[
                (JOURNAL_ENTRIES_KEY, serialized.as_str()),
                (LAST_TYPED_TIME_KEY, typed_at.as_str()),
            ])?;
        }
        self.entries = next;

        self.ensure_today_entry()?;
        Ok(())
    }

    /// Create an empty entry for today if there is none
    ///
    /// Returns whether an entry was created.
    pub fn ensure_today_entry(&mut self) -> Result<bool> {
        let today = self.clock.today();
        if self.entries.iter().any(|e| e.date == today) {
            return Ok(false);
        }

        let mut next = self.entries.clone();
        next.push(JournalEntry::new(today, "", self.clock.now_millis()));
        sort_newest_first(&mut next);

        self.persist(&next)?;
        self.entries = next;

        debug!("Created entry for {}", today);
        Ok(true)
    }

    /// Re-read the durable collection and return the selected day's content
    ///
    /// Used after an unlock, when the in-memory copy may be stale.
    pub fn reload_entries(&mut self) -> Result<String> {
        self.load()?;
        self.ensure_today_entry()?;
        Ok(self.selected_content())
    }

    /// Merge a parsed backup into the collection and persist the result
    pub fn import_backup(
        &mut self,
        imported: &[ImportedEntry],
        import_timestamp: i64,
    ) -> Result<MergeReport> {
        let (next, report) = merge_with_report(&self.entries, imported, import_timestamp);

        self.persist(&next)?;
        self.entries = next;
        self.ensure_today_entry()?;

        info!(
            "Imported backup: {} inserted, {} merged, {} unchanged",
            report.inserted, report.merged, report.unchanged
        );
        Ok(report)
    }

    /// Persist content that may still be waiting for a save
    ///
    /// Last-resort path for shutdown; a no-op when the selected day already
    /// holds `content`.
    pub fn flush_pending(&mut self, content: &str) -> Result<()> {
        let unchanged = match self.entry(self.selected_date) {
            Some(entry) => entry.content == content,
            None => is_blank(content),
        };
        if unchanged {
            return Ok(());
        }
        self.save_entry(content, None)
    }

    /// Move the selection to `date` and persist it
    ///
    /// Returns the content stored for that day.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<String> {
        self.durable
            .set(SELECTED_DATE_KEY, &date.format(DATE_FORMAT).to_string())?;
        self.selected_date = date;
        Ok(self.selected_content())
    }

    /// Handle the calendar day changing under a running session
    ///
    /// If the selection was on the old today it follows to the new one.
    /// Returns whether a rollover happened.
    pub fn roll_over_if_needed(&mut self) -> Result<bool> {
        let today = self.clock.today();
        if today == self.observed_today {
            return Ok(false);
        }

        let previous = std::mem::replace(&mut self.observed_today, today);
        if self.selected_date == previous {
            self.select_date(today)?;
        }
        self.ensure_today_entry()?;

        info!("Day rolled over from {} to {}", previous, today);
        Ok(true)
    }

    /// Epoch milliseconds of the last non-empty save, if any
    ///
    /// Unparsable values and values outside `0..=now` read as absent.
    pub fn last_typed_time(&self) -> Result<Option<i64>> {
        let Some(raw) = self.durable.get(LAST_TYPED_TIME_KEY)? else {
            return Ok(None);
        };
        let now = self.clock.now_millis();
        match raw.trim().parse::<i64>() {
            Ok(millis) if (0..=now).contains(&millis) => Ok(Some(millis)),
            _ => {
                warn!("Ignoring implausible last typed time: {}", raw);
                Ok(None)
            }
        }
    }

    /// Whether the idle gap since the last keystroke calls for a timestamp
    /// line before new text
    pub fn needs_timestamp(&self) -> Result<bool> {
        let Some(last) = self.last_typed_time()? else {
            return Ok(false);
        };
        let idle = self.clock.now_millis().saturating_sub(last);
        Ok(idle >= self.timestamp_gap.num_milliseconds())
    }

    /// All entries, newest first
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entry(&self, date: NaiveDate) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.date == date)
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// Content stored for `date`, empty when there is no entry
    pub fn content_for(&self, date: NaiveDate) -> String {
        self.entry(date)
            .map(|e| e.content.clone())
            .unwrap_or_default()
    }

    pub fn selected_content(&self) -> String {
        self.content_for(self.selected_date)
    }

    fn persist(&self, entries: &[JournalEntry]) -> Result<()> {
        let serialized = serde_json::to_string(entries)?;
        self.durable.set(JOURNAL_ENTRIES_KEY, &serialized)?;
        Ok(())
    }
}
