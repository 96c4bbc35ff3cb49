use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::persist::{write_atomically, PersistError};

pub const SETTINGS_KEY: &str = "settings";
pub const QUEUE_KEY: &str = "promptQueue";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("store {path:?} is not a JSON object: {message}")]
    Corrupt { path: PathBuf, message: String },
    #[error("failed to write store: {0}")]
    Write(#[from] PersistError),
    #[error("failed to encode value for key {key}: {message}")]
    Encode { key: String, message: String },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Host-provided key-value storage. No schema, no transactions: callers
/// default and validate what they read.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// All keys in one JSON object file. Every `get` re-reads the file so that
/// writes from other processes are seen; every `set` rewrites it atomically.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                message: format!("top level is {}", json_kind(&other)),
            }),
            Err(err) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                message: err.to_string(),
            }),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&Value::Object(all)).map_err(|err| {
            StoreError::Encode {
                key: key.to_string(),
                message: err.to_string(),
            }
        })?;
        write_atomically(&self.path, &content)?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
