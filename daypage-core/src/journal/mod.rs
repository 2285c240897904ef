//! Journal entries: model, markup helpers, backup merge and the store.

pub mod markup;
pub mod merge;
pub mod model;
mod store;

pub use merge::{backup_label, merge_imported, merge_with_report, ImportedEntry, MergeReport};
pub use model::{parse_entries, JournalEntry, DATE_FORMAT};
pub use store::EntryStore;
