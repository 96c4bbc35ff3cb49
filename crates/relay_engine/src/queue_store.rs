use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use relay_core::{PromptQueue, PromptRecord, QueueError, Settings, SplitPrompt};
use relay_logging::{relay_debug, relay_info, relay_warn};
use serde_json::Value;
use thiserror::Error;

use crate::store::{KeyValueStore, StoreError, QUEUE_KEY, SETTINGS_KEY};

#[derive(Debug, Error)]
pub enum QueueStoreError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("stored {key} is malformed: {message}")]
    Malformed { key: &'static str, message: String },
}

/// Typed access to the `settings` and `promptQueue` keys.
///
/// Queue mutations always read the latest persisted queue right before
/// writing it back; an in-process lock keeps concurrent mutations from this
/// process from interleaving.
pub struct QueueStore {
    kv: Arc<dyn KeyValueStore>,
    queue_lock: Mutex<()>,
}

impl QueueStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            queue_lock: Mutex::new(()),
        }
    }

    /// First-run setup: default settings, upgrade partial settings, and an
    /// empty queue when none exists.
    pub fn ensure_initialized(&self) -> Result<Settings, QueueStoreError> {
        let settings = match self.kv.get(SETTINGS_KEY)? {
            None => {
                relay_info!("Initializing default settings");
                let settings = Settings::default();
                self.save_settings(&settings)?;
                settings
            }
            Some(raw) => {
                let settings = parse_settings(raw.clone());
                let normalized = encode(SETTINGS_KEY, &settings)?;
                if normalized != raw {
                    relay_info!("Upgrading stored settings to {:?}", settings);
                    self.kv.set(SETTINGS_KEY, normalized)?;
                }
                settings
            }
        };

        if self.kv.get(QUEUE_KEY)?.is_none() {
            relay_info!("Initializing empty prompt queue");
            self.kv.set(QUEUE_KEY, encode(QUEUE_KEY, &PromptQueue::new())?)?;
        }
        Ok(settings)
    }

    /// Current settings, written back as defaults when absent.
    pub fn settings(&self) -> Result<Settings, QueueStoreError> {
        match self.kv.get(SETTINGS_KEY)? {
            Some(raw) => Ok(parse_settings(raw)),
            None => {
                let settings = Settings::default();
                self.save_settings(&settings)?;
                Ok(settings)
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), QueueStoreError> {
        let settings = settings.sanitized();
        self.kv.set(SETTINGS_KEY, encode(SETTINGS_KEY, &settings)?)?;
        Ok(())
    }

    pub fn queue(&self) -> Result<PromptQueue, QueueStoreError> {
        match self.kv.get(QUEUE_KEY)? {
            None | Some(Value::Null) => Ok(PromptQueue::new()),
            Some(raw) => {
                serde_json::from_value(raw).map_err(|err| QueueStoreError::Malformed {
                    key: QUEUE_KEY,
                    message: err.to_string(),
                })
            }
        }
    }

    /// Read-modify-write of the persisted queue. Nothing is written when
    /// `mutate` fails or leaves the queue unchanged.
    pub fn update_queue<T>(
        &self,
        mutate: impl FnOnce(&mut PromptQueue) -> Result<T, QueueError>,
    ) -> Result<T, QueueStoreError> {
        let _guard = self
            .queue_lock
            .lock()
            .map_err(|_| QueueStoreError::Store(StoreError::Poisoned))?;
        let before = self.queue()?;
        let mut queue = before.clone();
        let result = mutate(&mut queue)?;
        if queue != before {
            self.kv.set(QUEUE_KEY, encode(QUEUE_KEY, &queue)?)?;
        }
        Ok(result)
    }

    /// Appends split prompts in order; returns how many were added.
    pub fn add_prompts(
        &self,
        prompts: &[SplitPrompt],
        now: DateTime<Utc>,
    ) -> Result<usize, QueueStoreError> {
        let records = prompts
            .iter()
            .map(|prompt| PromptRecord::new(prompt.title.as_str(), prompt.text.as_str(), now))
            .collect::<Result<Vec<_>, _>>()?;
        let added = records.len();
        self.update_queue(|queue| {
            queue.append(records);
            Ok(())
        })?;
        relay_debug!("Added {} prompt(s) to queue", added);
        Ok(added)
    }

    pub fn pop_head(&self) -> Result<Option<PromptRecord>, QueueStoreError> {
        self.update_queue(|queue| Ok(queue.pop_head()))
    }

    /// Puts `record` back at the head; returns the new queue length.
    pub fn push_head(&self, record: PromptRecord) -> Result<usize, QueueStoreError> {
        self.update_queue(|queue| {
            queue.push_head(record);
            Ok(queue.len())
        })
    }

    pub fn remove(&self, index: usize) -> Result<PromptRecord, QueueStoreError> {
        self.update_queue(|queue| queue.remove(index))
    }

    pub fn edit(&self, index: usize, text: &str) -> Result<(), QueueStoreError> {
        self.update_queue(|queue| queue.edit(index, text))
    }

    pub fn move_prompt(&self, from: usize, to: usize) -> Result<(), QueueStoreError> {
        self.update_queue(|queue| queue.move_to(from, to))
    }

    /// Records a manual send of `record` wherever it sits in the queue now.
    pub fn mark_sent(&self, record: &PromptRecord) -> Result<PromptRecord, QueueStoreError> {
        self.update_queue(|queue| {
            let index = queue
                .position_of(record)
                .ok_or_else(|| QueueError::RecordGone {
                    title: record.title.clone(),
                })?;
            queue.mark_sent(index).cloned()
        })
    }

    /// Empties the queue; returns how many prompts were dropped.
    pub fn clear(&self) -> Result<usize, QueueStoreError> {
        self.update_queue(|queue| {
            let dropped = queue.len();
            queue.clear();
            Ok(dropped)
        })
    }
}

fn parse_settings(raw: Value) -> Settings {
    match serde_json::from_value::<Settings>(raw) {
        Ok(settings) => settings.sanitized(),
        Err(err) => {
            relay_warn!("Stored settings are malformed, using defaults: {}", err);
            Settings::default()
        }
    }
}

fn encode<T: serde::Serialize>(key: &'static str, value: &T) -> Result<Value, QueueStoreError> {
    serde_json::to_value(value).map_err(|err| {
        QueueStoreError::Store(StoreError::Encode {
            key: key.to_string(),
            message: err.to_string(),
        })
    })
}
