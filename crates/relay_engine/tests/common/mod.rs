#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use chrono::{DateTime, TimeZone, Utc};
use relay_core::{Settings, StatusKind};
use relay_engine::{
    ControlHandle, ControlKind, KeyValueStore, MemoryStore, PageAdapter, PageError,
    PageFailureKind, PersistError, QueueStore, StoreError,
};
use serde_json::Value;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).unwrap()
}

/// In-memory queue store holding `texts`, with the given auto-submit delay.
pub fn store_with(texts: &[&str], delay_seconds: u64) -> Arc<QueueStore> {
    let store = Arc::new(QueueStore::new(Arc::new(MemoryStore::new())));
    store
        .save_settings(&Settings {
            auto_submit_delay_seconds: delay_seconds,
            ..Settings::default()
        })
        .unwrap();
    seed(&store, texts);
    store
}

/// Initializes `store` and appends `texts` as untitled prompts.
pub fn seed(store: &QueueStore, texts: &[&str]) {
    store.ensure_initialized().unwrap();
    let prompts = texts
        .iter()
        .map(|text| relay_core::SplitPrompt {
            title: relay_core::DEFAULT_TITLE.to_string(),
            text: text.to_string(),
        })
        .collect::<Vec<_>>();
    store.add_prompts(&prompts, epoch()).unwrap();
}

pub fn queued_texts(store: &QueueStore) -> Vec<String> {
    store
        .queue()
        .unwrap()
        .iter()
        .map(|record| record.text.clone())
        .collect()
}

/// Memory store with one scheduled write failure.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    /// Writes left to succeed before the failing one.
    fail_after: Mutex<Option<usize>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `successes` writes through, then fails exactly one.
    pub fn fail_set_after(&self, successes: usize) {
        *self.fail_after.lock().unwrap() = Some(successes);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut fail_after = self.fail_after.lock().unwrap();
        match *fail_after {
            Some(0) => {
                *fail_after = None;
                Err(StoreError::Write(PersistError::Io(std::io::Error::other(
                    "disk full",
                ))))
            }
            Some(left) => {
                *fail_after = Some(left - 1);
                self.inner.set(key, value)
            }
            None => self.inner.set(key, value),
        }
    }
}

#[derive(Default)]
struct Script {
    input: Option<ControlHandle>,
    submit: Option<ControlHandle>,
    failing_clicks: usize,
    staged: Option<String>,
    submitted: Vec<String>,
    actions: Vec<String>,
    status: Option<StatusKind>,
}

/// Page double with scripted controls and click failures.
pub struct ScriptedPage {
    script: Mutex<Script>,
}

impl ScriptedPage {
    /// A page with a prompt textarea and a submit button.
    pub fn ready() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                input: Some(textarea()),
                submit: Some(button()),
                ..Script::default()
            }),
        })
    }

    pub fn without_input() -> Arc<Self> {
        let page = Self::ready();
        page.script.lock().unwrap().input = None;
        page
    }

    pub fn without_submit() -> Arc<Self> {
        let page = Self::ready();
        page.script.lock().unwrap().submit = None;
        page
    }

    /// The next `count` clicks fail with a network error.
    pub fn fail_clicks(&self, count: usize) {
        self.script.lock().unwrap().failing_clicks = count;
    }

    pub fn set_status(&self, kind: StatusKind) {
        self.script.lock().unwrap().status = Some(kind);
    }

    /// Texts whose submit click went through, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.script.lock().unwrap().submitted.clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.script.lock().unwrap().actions.clone()
    }
}

pub fn textarea() -> ControlHandle {
    ControlHandle {
        selector: "textarea".to_string(),
        index: 0,
        kind: ControlKind::TextArea,
    }
}

pub fn button() -> ControlHandle {
    ControlHandle {
        selector: "button".to_string(),
        index: 0,
        kind: ControlKind::Button,
    }
}

#[async_trait::async_trait]
impl PageAdapter for ScriptedPage {
    async fn find_input(&self) -> Result<Option<ControlHandle>, PageError> {
        Ok(self.script.lock().unwrap().input.clone())
    }

    async fn find_submit(&self) -> Result<Option<ControlHandle>, PageError> {
        Ok(self.script.lock().unwrap().submit.clone())
    }

    async fn set_value(&self, handle: &ControlHandle, text: &str) -> Result<(), PageError> {
        let mut script = self.script.lock().unwrap();
        script.actions.push(format!("set {handle} {text}"));
        script.staged = Some(text.to_string());
        Ok(())
    }

    async fn click(&self, handle: &ControlHandle) -> Result<(), PageError> {
        let mut script = self.script.lock().unwrap();
        script.actions.push(format!("click {handle}"));
        if script.failing_clicks > 0 {
            script.failing_clicks -= 1;
            return Err(PageError::new(PageFailureKind::Network, "page went away"));
        }
        if let Some(text) = script.staged.take() {
            script.submitted.push(text);
        }
        Ok(())
    }

    async fn poll_status(&self) -> Result<StatusKind, PageError> {
        Ok(self
            .script
            .lock()
            .unwrap()
            .status
            .unwrap_or(StatusKind::Unknown))
    }
}
