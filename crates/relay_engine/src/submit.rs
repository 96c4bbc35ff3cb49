use std::fmt;
use std::time::Duration;

use relay_logging::{relay_debug, relay_info, relay_warn};
use thiserror::Error;

use crate::page::{PageAdapter, PageError};

/// Pause between injecting text and clicking, so the page's input handling
/// can react.
pub const SETTLING_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRole {
    Input,
    Submit,
}

impl fmt::Display for ControlRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlRole::Input => write!(f, "prompt input"),
            ControlRole::Submit => write!(f, "submit button"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0} not found on page")]
    ControlNotFound(ControlRole),
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] PageError),
}

/// Injects `text` into the page's prompt input and clicks submit.
///
/// Both controls are located before anything is touched; a missing control
/// fails the attempt with no side effects. Success means the click was
/// dispatched, not that the page accepted the prompt.
pub async fn submit_prompt(
    page: &dyn PageAdapter,
    text: &str,
    settle: Duration,
) -> Result<(), SubmitError> {
    relay_debug!("Attempting to submit prompt ({} chars)", text.chars().count());

    let input = page
        .find_input()
        .await?
        .ok_or(SubmitError::ControlNotFound(ControlRole::Input))?;
    let submit = page
        .find_submit()
        .await?
        .ok_or(SubmitError::ControlNotFound(ControlRole::Submit))?;
    relay_debug!("Located input {} and submit {}", input, submit);

    page.set_value(&input, text).await?;
    tokio::time::sleep(settle).await;
    page.click(&submit).await?;

    relay_info!("Prompt dispatched via {}", submit);
    Ok(())
}

/// [`submit_prompt`] with failures logged and folded into a flag.
pub async fn try_submit(page: &dyn PageAdapter, text: &str, settle: Duration) -> bool {
    match submit_prompt(page, text, settle).await {
        Ok(()) => true,
        Err(err) => {
            relay_warn!("Prompt submission failed: {}", err);
            false
        }
    }
}
