//! Zeroizing buffer for password entry.
//!
//! The gate reads candidate passwords from a [`PasswordInput`] and wipes it
//! after every submit, successful or not.

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Text typed into the password prompt
#[derive(Default, ZeroizeOnDrop)]
pub struct PasswordInput {
    text: String,
}

impl PasswordInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer contents, wiping the previous value
    pub fn set(&mut self, text: &str) {
        self.text.zeroize();
        self.text.push_str(text);
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Remove the last character, as a backspace would
    pub fn pop(&mut self) -> Option<char> {
        self.text.pop()
    }

    /// Wipe the buffer
    pub fn clear(&mut self) {
        self.text.zeroize();
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Get the typed text (use carefully!)
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Copy the trimmed contents into a buffer that wipes itself on drop
    pub(crate) fn trimmed_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.text.trim().as_bytes().to_vec())
    }
}

impl From<&str> for PasswordInput {
    fn from(text: &str) -> Self {
        let mut input = Self::new();
        input.set(text);
        input
    }
}
