//! Selector heuristics for finding the prompt form on a page snapshot.

use scraper::{ElementRef, Html, Selector};

use crate::page::{ControlHandle, ControlKind};

/// One lookup strategy. Lists of these are tried in order and the first
/// hit wins, so specific selectors come before generic ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// First element matching a CSS selector.
    Css(&'static str),
    /// First `button` whose text contains the given fragment.
    ButtonText(&'static str),
}

pub const INPUT_LOCATORS: &[Locator] = &[
    Locator::Css(r#"textarea[placeholder*="Describe"]"#),
    Locator::Css(r#"textarea[placeholder*="prompt"]"#),
    Locator::Css(r#"textarea[placeholder*="video"]"#),
    Locator::Css(r#"textarea[aria-label*="prompt"]"#),
    Locator::Css(r#"input[placeholder*="Describe"]"#),
    Locator::Css(r#"input[placeholder*="prompt"]"#),
    Locator::Css(r#"div[contenteditable="true"]"#),
];

pub const SUBMIT_LOCATORS: &[Locator] = &[
    Locator::Css(r#"button[type="submit"]"#),
    Locator::ButtonText("Generate"),
    Locator::ButtonText("Create"),
    Locator::ButtonText("Submit"),
    Locator::Css("button.submit-button"),
    Locator::Css(r#"button[aria-label*="submit"]"#),
    Locator::Css(r#"button[aria-label*="generate"]"#),
];

pub fn locate_input(doc: &Html) -> Option<ControlHandle> {
    locate(doc, INPUT_LOCATORS)
}

pub fn locate_submit(doc: &Html) -> Option<ControlHandle> {
    locate(doc, SUBMIT_LOCATORS)
}

pub fn locate(doc: &Html, locators: &[Locator]) -> Option<ControlHandle> {
    locators.iter().find_map(|locator| match *locator {
        Locator::Css(css) => {
            let selector = Selector::parse(css).ok()?;
            let element = doc.select(&selector).next()?;
            Some(ControlHandle {
                selector: css.to_string(),
                index: 0,
                kind: control_kind(&element),
            })
        }
        Locator::ButtonText(fragment) => {
            let selector = Selector::parse("button").ok()?;
            doc.select(&selector)
                .enumerate()
                .find(|(_, button)| button.text().collect::<String>().contains(fragment))
                .map(|(index, button)| ControlHandle {
                    selector: "button".to_string(),
                    index,
                    kind: control_kind(&button),
                })
        }
    })
}

pub(crate) fn control_kind(element: &ElementRef<'_>) -> ControlKind {
    let value = element.value();
    match value.name() {
        "textarea" => ControlKind::TextArea,
        "input" => ControlKind::TextInput,
        "button" => ControlKind::Button,
        _ if value.attr("contenteditable") == Some("true") => ControlKind::ContentEditable,
        _ => ControlKind::Other,
    }
}

/// One row of a control inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSummary {
    pub handle: ControlHandle,
    pub text: String,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
}

/// Lists textareas, text inputs and buttons, to help adjust the locator
/// lists when a page changes its markup.
pub fn describe_controls(doc: &Html) -> Vec<ControlSummary> {
    ["textarea", r#"input[type="text"]"#, "button"]
        .iter()
        .filter_map(|css| Selector::parse(css).ok().map(|selector| (*css, selector)))
        .flat_map(|(css, selector)| {
            doc.select(&selector)
                .enumerate()
                .map(move |(index, element)| {
                    let value = element.value();
                    ControlSummary {
                        handle: ControlHandle {
                            selector: css.to_string(),
                            index,
                            kind: control_kind(&element),
                        },
                        text: element.text().collect::<String>().trim().to_string(),
                        placeholder: value.attr("placeholder").map(str::to_string),
                        aria_label: value.attr("aria-label").map(str::to_string),
                        id: value.id().map(str::to_string),
                        class: value.attr("class").map(str::to_string),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
