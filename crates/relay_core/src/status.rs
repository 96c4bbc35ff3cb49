use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse classification of what the remote page appears to be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Completed,
    Processing,
    ReadyForInput,
    VideoAvailable,
    Unknown,
}

impl StatusKind {
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Completed => "Completed",
            StatusKind::Processing => "Processing",
            StatusKind::ReadyForInput => "Ready for input",
            StatusKind::VideoAvailable => "Video available",
            StatusKind::Unknown => "Status unknown",
        }
    }

    /// `None` when the kind says nothing about processing.
    pub fn is_processing(self) -> Option<bool> {
        match self {
            StatusKind::Processing => Some(true),
            StatusKind::Completed | StatusKind::ReadyForInput | StatusKind::VideoAvailable => {
                Some(false)
            }
            StatusKind::Unknown => None,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Advisory page status shown to the control surface. Never persisted and
/// never consulted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStatus {
    pub text: String,
    pub is_processing: bool,
}

impl Default for PageStatus {
    fn default() -> Self {
        Self::not_connected()
    }
}

impl PageStatus {
    pub fn new(text: impl Into<String>, is_processing: bool) -> Self {
        Self {
            text: text.into(),
            is_processing,
        }
    }

    pub fn not_connected() -> Self {
        Self::new("Not connected", false)
    }

    pub fn submitted() -> Self {
        Self::new("Prompt submitted", true)
    }

    /// Status after observing `kind`; an unknown reading keeps the previous
    /// processing flag.
    pub fn observed(kind: StatusKind, previous: &PageStatus) -> Self {
        Self::new(
            kind.label(),
            kind.is_processing().unwrap_or(previous.is_processing),
        )
    }
}
