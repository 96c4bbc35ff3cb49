//! Keyword heuristics turning a page snapshot into a [`StatusKind`].

use relay_core::StatusKind;
use scraper::{Html, Selector};

/// Elements that carry status explicitly, most specific first.
const STATUS_SELECTORS: &[&str] = &[
    r#"[aria-label*="status"]"#,
    "[data-status]",
    ".status-indicator",
    ".progress-indicator",
];

const FREE_TEXT_SELECTOR: &str = "div, span, p";
const FREE_TEXT_KEYWORDS: &[&str] = &["Processing", "Generating", "Completed", "Ready", "Done"];

const COMPLETED_KEYWORDS: &[&str] = &["Complet", "Ready", "Done", "Finish"];
const PROCESSING_KEYWORDS: &[&str] = &["Process", "Generat", "Creating", "Working"];

pub fn classify_document(html: &str) -> StatusKind {
    classify_status(&Html::parse_document(html))
}

/// Explicit status elements win over a free-text scan; with neither, a
/// `video` element counts as finished output.
pub fn classify_status(doc: &Html) -> StatusKind {
    if let Some(text) = indicator_text(doc) {
        return classify_text(&text);
    }
    let has_video = Selector::parse("video")
        .map(|selector| doc.select(&selector).next().is_some())
        .unwrap_or(false);
    if has_video {
        StatusKind::VideoAvailable
    } else {
        StatusKind::Unknown
    }
}

pub fn classify_text(text: &str) -> StatusKind {
    let text = text.trim();
    if contains_any(text, COMPLETED_KEYWORDS) {
        StatusKind::Completed
    } else if contains_any(text, PROCESSING_KEYWORDS) {
        StatusKind::Processing
    } else {
        StatusKind::ReadyForInput
    }
}

fn indicator_text(doc: &Html) -> Option<String> {
    let explicit = STATUS_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        doc.select(&selector).next()
    });
    if let Some(element) = explicit {
        return Some(element.text().collect::<String>());
    }

    let selector = Selector::parse(FREE_TEXT_SELECTOR).ok()?;
    doc.select(&selector)
        .map(|element| element.text().collect::<String>())
        .find(|text| contains_any(text, FREE_TEXT_KEYWORDS))
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}
