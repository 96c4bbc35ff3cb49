use std::sync::{Arc, Mutex, PoisonError};

use relay_core::{PageStatus, StatusKind};

/// Shared advisory status. Written by the poller, the control channel and
/// successful submissions; read by `getStatus`.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<PageStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> PageStatus {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, status: PageStatus) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Records a classified reading and returns the resulting status.
    pub fn observe(&self, kind: StatusKind) -> PageStatus {
        let mut current = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let next = PageStatus::observed(kind, &current);
        *current = next.clone();
        next
    }
}
