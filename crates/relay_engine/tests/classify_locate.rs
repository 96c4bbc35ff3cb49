use pretty_assertions::assert_eq;
use relay_core::StatusKind;
use relay_engine::{
    classify_document, describe_controls, locate_input, locate_submit, ControlHandle, ControlKind,
};
use scraper::Html;

fn handle(selector: &str, index: usize, kind: ControlKind) -> ControlHandle {
    ControlHandle {
        selector: selector.to_string(),
        index,
        kind,
    }
}

#[test]
fn describe_placeholder_beats_later_strategies() {
    let doc = Html::parse_document(
        r#"<div contenteditable="true"></div>
           <textarea placeholder="Type a prompt"></textarea>
           <textarea placeholder="Describe your video"></textarea>"#,
    );

    assert_eq!(
        locate_input(&doc),
        Some(handle(
            r#"textarea[placeholder*="Describe"]"#,
            0,
            ControlKind::TextArea
        ))
    );
}

#[test]
fn content_editable_is_last_resort() {
    let doc = Html::parse_document(r#"<div contenteditable="true">old</div>"#);

    assert_eq!(
        locate_input(&doc),
        Some(handle(
            r#"div[contenteditable="true"]"#,
            0,
            ControlKind::ContentEditable
        ))
    );
}

#[test]
fn text_input_with_prompt_placeholder() {
    let doc = Html::parse_document(r#"<input type="text" placeholder="Your prompt here">"#);

    let found = locate_input(&doc).unwrap();
    assert_eq!(found.kind, ControlKind::TextInput);
    assert_eq!(found.selector, r#"input[placeholder*="prompt"]"#);
}

#[test]
fn no_input_on_unrelated_page() {
    let doc = Html::parse_document("<p>Nothing to type into</p><textarea></textarea>");
    assert_eq!(locate_input(&doc), None);
}

#[test]
fn submit_button_by_type_first() {
    let doc = Html::parse_document(
        r#"<button>Generate</button><button type="submit">Go</button>"#,
    );

    assert_eq!(
        locate_submit(&doc),
        Some(handle(r#"button[type="submit"]"#, 0, ControlKind::Button))
    );
}

#[test]
fn submit_button_by_text_is_indexed() {
    let doc = Html::parse_document(
        "<button>Cancel</button><button>Settings</button><button>Create video</button>",
    );

    assert_eq!(
        locate_submit(&doc),
        Some(handle("button", 2, ControlKind::Button))
    );
}

#[test]
fn submit_button_by_aria_label() {
    let doc = Html::parse_document(r#"<button aria-label="generate clip"></button>"#);

    let found = locate_submit(&doc).unwrap();
    assert_eq!(found.selector, r#"button[aria-label*="generate"]"#);
}

#[test]
fn explicit_status_element_wins() {
    let html = r#"<div data-status="x">Generating</div><p>Completed yesterday</p>"#;
    assert_eq!(classify_document(html), StatusKind::Processing);
}

#[test]
fn free_text_scan_finds_keywords() {
    let html = "<main><span>Your video is Ready</span></main>";
    assert_eq!(classify_document(html), StatusKind::Completed);
}

#[test]
fn status_element_without_keywords_means_ready_for_input() {
    let html = r#"<div class="status-indicator">Idle</div>"#;
    assert_eq!(classify_document(html), StatusKind::ReadyForInput);
}

#[test]
fn video_is_fallback_completion_signal() {
    let html = r#"<section><video src="clip.mp4"></video></section>"#;
    assert_eq!(classify_document(html), StatusKind::VideoAvailable);
}

#[test]
fn nothing_recognisable_is_unknown() {
    assert_eq!(classify_document("<h1>Welcome</h1>"), StatusKind::Unknown);
}

#[test]
fn inventory_lists_form_controls() {
    let doc = Html::parse_document(
        r#"<textarea id="p" placeholder="Describe"></textarea>
           <input type="text" aria-label="title">
           <button class="primary">Create</button>"#,
    );

    let controls = describe_controls(&doc);

    assert_eq!(controls.len(), 3);
    assert_eq!(controls[0].handle, handle("textarea", 0, ControlKind::TextArea));
    assert_eq!(controls[0].id.as_deref(), Some("p"));
    assert_eq!(controls[1].aria_label.as_deref(), Some("title"));
    assert_eq!(controls[2].text, "Create");
    assert_eq!(controls[2].class.as_deref(), Some("primary"));
}
