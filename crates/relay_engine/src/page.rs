use std::fmt;

use relay_core::StatusKind;
use serde::{Deserialize, Serialize};

/// Element category of a located control. Drives how text is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlKind {
    TextArea,
    TextInput,
    ContentEditable,
    Button,
    Other,
}

/// Address of a control on the live page: the `index`-th element matching
/// `selector` in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlHandle {
    pub selector: String,
    pub index: usize,
    pub kind: ControlKind,
}

impl fmt::Display for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub kind: PageFailureKind,
    pub message: String,
}

impl PageError {
    pub fn new(kind: PageFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PageError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    UnsupportedControl(ControlKind),
    Network,
}

impl fmt::Display for PageFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageFailureKind::InvalidUrl => write!(f, "invalid url"),
            PageFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            PageFailureKind::Timeout => write!(f, "timeout"),
            PageFailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "document too large (max {max_bytes}, actual {actual:?})")
            }
            PageFailureKind::Decode => write!(f, "undecodable document"),
            PageFailureKind::UnsupportedControl(kind) => {
                write!(f, "cannot inject text into {kind:?} control")
            }
            PageFailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Live page collaborator: locates the prompt form, injects text, clicks,
/// and reports an advisory status.
#[async_trait::async_trait]
pub trait PageAdapter: Send + Sync {
    async fn find_input(&self) -> Result<Option<ControlHandle>, PageError>;

    async fn find_submit(&self) -> Result<Option<ControlHandle>, PageError>;

    /// Sets the control's content in a way the page's own input handling
    /// notices (native setter plus input events), not a bare attribute write.
    async fn set_value(&self, handle: &ControlHandle, text: &str) -> Result<(), PageError>;

    async fn click(&self, handle: &ControlHandle) -> Result<(), PageError>;

    /// Best-effort reading of the page's progress indicators.
    async fn poll_status(&self) -> Result<StatusKind, PageError>;
}
