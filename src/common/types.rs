use serde::{Deserialize, Serialize};

/// A single chat line as stored in the remote collection.
///
/// On the wire the text lives under `name` and the label under `time`; the
/// collection was shared with an older contact form and existing records use
/// that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "name")]
    text: String,
    #[serde(rename = "time")]
    time_label: String,
}

impl Message {
    /// Builds a message from raw user input. Returns `None` when the input is
    /// empty after trimming.
    pub fn compose(raw: &str, time_label: impl Into<String>) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        Some(Self {
            text: text.to_string(),
            time_label: time_label.into(),
        })
    }

    /// Wraps a record read back from a store. Stored data is taken as-is.
    pub fn stored(text: impl Into<String>, time_label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            time_label: time_label.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pre-formatted `HH:MM` label. Not sortable across days.
    pub fn time_label(&self) -> &str {
        &self.time_label
    }
}
