use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "Prompt";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("no prompt at index {index} (queue holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("prompt text must not be empty")]
    EmptyText,
    #[error("prompt \"{title}\" is no longer queued")]
    RecordGone { title: String },
}

/// One queued prompt as persisted under the `promptQueue` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    pub text: String,
    #[serde(default = "default_title")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sent_count: u32,
    #[serde(default)]
    pub is_sent: bool,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl PromptRecord {
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QueueError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QueueError::EmptyText);
        }
        let title = title.into();
        let title = if title.trim().is_empty() {
            default_title()
        } else {
            title
        };
        Ok(Self {
            text,
            title,
            created_at,
            sent_count: 0,
            is_sent: false,
        })
    }

    /// Same prompt as `other`, whatever its send counters say.
    pub fn same_prompt(&self, other: &PromptRecord) -> bool {
        self.created_at == other.created_at && self.title == other.title && self.text == other.text
    }

    /// First `max_chars` characters of the text, with an ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Ordered prompt queue. The head is the next record due for automatic
/// submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptQueue {
    records: Vec<PromptRecord>,
}

impl PromptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptRecord> {
        self.records.iter()
    }

    pub fn head(&self) -> Option<&PromptRecord> {
        self.records.first()
    }

    pub fn get(&self, index: usize) -> Result<&PromptRecord, QueueError> {
        let len = self.records.len();
        self.records
            .get(index)
            .ok_or(QueueError::IndexOutOfRange { index, len })
    }

    pub fn position_of(&self, record: &PromptRecord) -> Option<usize> {
        self.records.iter().position(|queued| queued.same_prompt(record))
    }

    pub fn append(&mut self, records: impl IntoIterator<Item = PromptRecord>) {
        self.records.extend(records);
    }

    pub fn pop_head(&mut self) -> Option<PromptRecord> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records.remove(0))
        }
    }

    /// Puts a record back in front of everything else.
    pub fn push_head(&mut self, record: PromptRecord) {
        self.records.insert(0, record);
    }

    pub fn remove(&mut self, index: usize) -> Result<PromptRecord, QueueError> {
        self.check_index(index)?;
        Ok(self.records.remove(index))
    }

    /// Replaces the text of a record; send counters, title and creation
    /// time stay as they were.
    pub fn edit(&mut self, index: usize, text: impl Into<String>) -> Result<(), QueueError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QueueError::EmptyText);
        }
        self.check_index(index)?;
        self.records[index].text = text;
        Ok(())
    }

    /// Moves the record at `from` so that it ends up at position `to`.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), QueueError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let record = self.records.remove(from);
        self.records.insert(to, record);
        Ok(())
    }

    /// Records a manual send of the record at `index`.
    pub fn mark_sent(&mut self, index: usize) -> Result<&PromptRecord, QueueError> {
        self.check_index(index)?;
        let record = &mut self.records[index];
        record.sent_count = record.sent_count.saturating_add(1);
        record.is_sent = true;
        Ok(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn check_index(&self, index: usize) -> Result<(), QueueError> {
        let len = self.records.len();
        if index < len {
            Ok(())
        } else {
            Err(QueueError::IndexOutOfRange { index, len })
        }
    }
}

impl FromIterator<PromptRecord> for PromptQueue {
    fn from_iter<I: IntoIterator<Item = PromptRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PromptQueue {
    type Item = PromptRecord;
    type IntoIter = std::vec::IntoIter<PromptRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
