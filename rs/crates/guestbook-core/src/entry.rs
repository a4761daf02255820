use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One signed line in the guest book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestEntry {
    /// Primary key and sort key. Unique for the process lifetime.
    pub id: u64,
    pub name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Embedding host that submitted the entry. `None` for the standalone page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_host: Option<String>,
}

impl GuestEntry {
    /// Build a candidate entry from raw form values. Fields are trimmed;
    /// the result still has to pass [`is_valid`] before it may be stored.
    pub fn candidate(id: u64, form: &EntryForm, timestamp: DateTime<Utc>) -> Self {
        GuestEntry {
            id,
            name: form.name.trim().to_string(),
            message: form.message.trim().to_string(),
            timestamp,
            origin_host: None,
        }
    }

    pub fn with_origin_host(mut self, host: impl Into<String>) -> Self {
        self.origin_host = Some(host.into());
        self
    }

    /// Display format used by the rendered entry list
    pub fn display_time(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// Transient form values; cleared after every submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

impl EntryForm {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        EntryForm {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// True iff both name and message are non-empty after trimming.
pub fn is_valid(entry: &GuestEntry) -> bool {
    !entry.name.trim().is_empty() && !entry.message.trim().is_empty()
}
