//! HTTP adapter for a page-resident bridge.
//!
//! The bridge serves the current document at `GET {base}/document` and
//! performs injections and clicks posted as JSON to `POST {base}/actions`.

use std::time::Duration;

use futures_util::StreamExt;
use relay_core::StatusKind;
use relay_logging::relay_trace;
use reqwest::header::CONTENT_TYPE;
use scraper::Html;
use serde::Serialize;
use url::Url;

use crate::classify::classify_status;
use crate::decode::decode_document;
use crate::locate::{describe_controls, locate_input, locate_submit, ControlSummary};
use crate::page::{ControlHandle, ControlKind, PageAdapter, PageError, PageFailureKind};

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_document_bytes: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            max_document_bytes: 5 * 1024 * 1024,
        }
    }
}

/// How the bridge should write text into a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InjectionMode {
    /// Native `value` setter followed by bubbling `input` and `change` events.
    NativeSetter,
    /// Replace the element content followed by a bubbling `input` event.
    ContentEditable,
}

impl InjectionMode {
    pub fn for_kind(kind: ControlKind) -> Option<Self> {
        match kind {
            ControlKind::TextArea | ControlKind::TextInput => Some(InjectionMode::NativeSetter),
            ControlKind::ContentEditable => Some(InjectionMode::ContentEditable),
            ControlKind::Button | ControlKind::Other => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum PageAction<'a> {
    SetValue {
        selector: &'a str,
        index: usize,
        mode: InjectionMode,
        text: &'a str,
    },
    Click {
        selector: &'a str,
        index: usize,
    },
}

/// Everything the locator and classifier see in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInspection {
    pub input: Option<ControlHandle>,
    pub submit: Option<ControlHandle>,
    pub status: StatusKind,
    pub controls: Vec<ControlSummary>,
}

#[derive(Debug, Clone)]
pub struct BridgePage {
    client: reqwest::Client,
    document_url: Url,
    actions_url: Url,
    settings: BridgeSettings,
}

impl BridgePage {
    pub fn new(base_url: &str, settings: BridgeSettings) -> Result<Self, PageError> {
        let mut base = Url::parse(base_url)
            .map_err(|err| PageError::new(PageFailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let join = |segment: &str| {
            base.join(segment)
                .map_err(|err| PageError::new(PageFailureKind::InvalidUrl, err.to_string()))
        };
        let document_url = join("document")?;
        let actions_url = join("actions")?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| PageError::new(PageFailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            document_url,
            actions_url,
            settings,
        })
    }

    /// Current page HTML, decoded to UTF-8.
    pub async fn snapshot(&self) -> Result<String, PageError> {
        let response = self
            .client
            .get(self.document_url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::new(
                PageFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_document_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(PageError::new(
                    PageFailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "document too large",
                ));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(PageError::new(
                    PageFailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "document too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        relay_trace!("Fetched document snapshot ({} bytes)", bytes.len());

        decode_document(&bytes, content_type.as_deref())
    }

    pub async fn inspect(&self) -> Result<PageInspection, PageError> {
        let html = self.snapshot().await?;
        Ok(with_document(&html, |doc| PageInspection {
            input: locate_input(doc),
            submit: locate_submit(doc),
            status: classify_status(doc),
            controls: describe_controls(doc),
        }))
    }

    async fn post_action(&self, action: &PageAction<'_>) -> Result<(), PageError> {
        let body = serde_json::to_vec(action)
            .map_err(|err| PageError::new(PageFailureKind::Network, err.to_string()))?;
        let response = self
            .client
            .post(self.actions_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PageError::new(
                PageFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ))
        }
    }
}

// `Html` is not `Send`; keep it out of any await.
fn with_document<T>(html: &str, inspect: impl FnOnce(&Html) -> T) -> T {
    let doc = Html::parse_document(html);
    inspect(&doc)
}

#[async_trait::async_trait]
impl PageAdapter for BridgePage {
    async fn find_input(&self) -> Result<Option<ControlHandle>, PageError> {
        let html = self.snapshot().await?;
        Ok(with_document(&html, locate_input))
    }

    async fn find_submit(&self) -> Result<Option<ControlHandle>, PageError> {
        let html = self.snapshot().await?;
        Ok(with_document(&html, locate_submit))
    }

    async fn set_value(&self, handle: &ControlHandle, text: &str) -> Result<(), PageError> {
        let mode = InjectionMode::for_kind(handle.kind).ok_or_else(|| {
            PageError::new(
                PageFailureKind::UnsupportedControl(handle.kind),
                handle.to_string(),
            )
        })?;
        self.post_action(&PageAction::SetValue {
            selector: &handle.selector,
            index: handle.index,
            mode,
            text,
        })
        .await
    }

    async fn click(&self, handle: &ControlHandle) -> Result<(), PageError> {
        self.post_action(&PageAction::Click {
            selector: &handle.selector,
            index: handle.index,
        })
        .await
    }

    async fn poll_status(&self) -> Result<StatusKind, PageError> {
        let html = self.snapshot().await?;
        Ok(with_document(&html, classify_status))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> PageError {
    if err.is_timeout() {
        return PageError::new(PageFailureKind::Timeout, err.to_string());
    }
    PageError::new(PageFailureKind::Network, err.to_string())
}
