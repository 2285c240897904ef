//! Backup documents: the plain-text export format and its optional
//! encrypted envelope.

pub mod envelope;
pub mod text;

pub use crate::journal::ImportedEntry;
pub use envelope::{decrypt_backup, encrypt_backup, is_encrypted_backup, ENVELOPE_HEADER};
pub use text::{export_backup, parse_backup, BACKUP_TITLE};

use crate::Result;

/// Parse a backup document, opening the envelope first when present
pub fn read_backup(document: &str) -> Result<Vec<ImportedEntry>> {
    if is_encrypted_backup(document) {
        let text = decrypt_backup(document)?;
        Ok(parse_backup(&text))
    } else {
        Ok(parse_backup(document))
    }
}
