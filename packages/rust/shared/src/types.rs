//! Core domain types for msgview bundles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Conversation file that is never bundled (messages with no known chat).
pub const SENTINEL_FILE_NAME: &str = "orphaned.txt";

/// Default glob for conversation transcripts.
pub const DEFAULT_PATTERN: &str = "*.txt";

/// Placeholder the template must contain; only its first occurrence is filled.
pub const DATA_MARKER: &str = "window.IMESSAGE_DATA = {};";

/// Left-hand side of the marker assignment.
pub const DATA_ASSIGNMENT: &str = "window.IMESSAGE_DATA = ";

// ---------------------------------------------------------------------------
// ConversationFile
// ---------------------------------------------------------------------------

/// A single transcript read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationFile {
    /// File name within the messages directory (e.g. `alice.txt`).
    pub name: String,
    /// Decoded text; invalid UTF-8 sequences have already been dropped.
    pub content: String,
}

impl ConversationFile {
    /// Size of the decoded content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MessageDataset
// ---------------------------------------------------------------------------

/// Mapping of conversation file name to its full text.
///
/// Serializes as a plain JSON object. Entries keep insertion order, which
/// only affects how the viewer lists conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageDataset(IndexMap<String, String>);

impl MessageDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conversation, replacing any previous entry with the same name.
    pub fn insert(&mut self, file: ConversationFile) {
        self.0.insert(file.name, file.content);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Conversation names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Sum of all content lengths in bytes.
    pub fn total_bytes(&self) -> usize {
        self.0.values().map(String::len).sum()
    }
}

impl FromIterator<ConversationFile> for MessageDataset {
    fn from_iter<I: IntoIterator<Item = ConversationFile>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for file in iter {
            dataset.insert(file);
        }
        dataset
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
