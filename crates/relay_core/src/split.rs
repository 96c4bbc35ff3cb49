//! Splits pasted text into individual prompts.
//!
//! Recognised blocks look like
//!
//! ```text
//! **1. Sunset over the bay**
//! *"Golden light on calm water"*
//! ```
//!
//! or `2. Title` followed by a `"quoted"` body. Asterisks around the title
//! are optional; the body delimiter must close with the same character it
//! opened with.

use std::sync::OnceLock;

use regex::Regex;

use crate::record::DEFAULT_TITLE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPrompt {
    pub title: String,
    pub text: String,
}

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:\*\*)?(\d+\.\s+[^*\n]+)(?:\*\*)?\s*(?:"([\s\S]+?)"|\*([\s\S]+?)\*)"#)
            .expect("prompt block pattern is valid")
    })
}

/// Splits `raw` into ordered `(title, text)` pairs.
///
/// Blank input yields nothing. Input without a single numbered block
/// becomes one prompt titled [`DEFAULT_TITLE`].
pub fn split_prompts(raw: &str) -> Vec<SplitPrompt> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let prompts: Vec<SplitPrompt> = block_pattern()
        .captures_iter(trimmed)
        .filter_map(|caps| {
            let title = caps.get(1)?.as_str().trim();
            let body = caps.get(2).or_else(|| caps.get(3))?.as_str();
            let text = clean_body(body);
            if text.is_empty() {
                return None;
            }
            Some(SplitPrompt {
                title: title.to_string(),
                text,
            })
        })
        .collect();

    if prompts.is_empty() {
        vec![SplitPrompt {
            title: DEFAULT_TITLE.to_string(),
            text: trimmed.to_string(),
        }]
    } else {
        prompts
    }
}

fn clean_body(body: &str) -> String {
    let body = body.trim();
    let body = body
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(body);
    body.trim().to_string()
}
