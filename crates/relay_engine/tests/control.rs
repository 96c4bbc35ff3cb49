mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{epoch, init_logging, queued_texts, store_with, ScriptedPage};
use pretty_assertions::assert_eq;
use relay_core::{Phase, Settings, StatusKind};
use relay_engine::{
    ControlRequest, ControlResponse, QueueStore, Relay, RelayError, SchedulerTiming, SubmitError,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const NUMBERED: &str = "**1. Sunset**\n*\"Golden light on calm water\"*\n\n**2. Storm**\n*\"Waves crash on the pier\"*";

fn start(store: &Arc<QueueStore>, page: &Arc<ScriptedPage>) -> Relay {
    Relay::start(Arc::clone(store), page.clone(), SchedulerTiming::default()).expect("relay starts")
}

async fn phase(relay: &Relay) -> Phase {
    relay.scheduler().snapshot().await.expect("running").view.phase
}

fn auto_submit(store: &QueueStore, enabled: bool) {
    store
        .save_settings(&Settings {
            auto_submit_enabled: enabled,
            ..Settings::default()
        })
        .unwrap();
}

#[test]
fn requests_parse_from_action_tagged_json() {
    let cases = [
        (
            json!({"action": "sendPrompt", "prompt": "hello"}),
            ControlRequest::SendPrompt {
                prompt: "hello".to_string(),
            },
        ),
        (json!({"action": "enableAutoSubmit"}), ControlRequest::EnableAutoSubmit),
        (json!({"action": "disableAutoSubmit"}), ControlRequest::DisableAutoSubmit),
        (json!({"action": "getStatus"}), ControlRequest::GetStatus),
        (
            json!({"action": "updateStatus", "status": "Processing", "isProcessing": true}),
            ControlRequest::UpdateStatus {
                status: "Processing".to_string(),
                is_processing: true,
            },
        ),
        (
            json!({"action": "addPrompts", "text": "x"}),
            ControlRequest::AddPrompts {
                text: "x".to_string(),
            },
        ),
        (json!({"action": "clearQueue"}), ControlRequest::ClearQueue),
        (json!({"action": "getSchedule"}), ControlRequest::GetSchedule),
        (
            json!({"action": "saveSettings", "settings": {"autoSubmitEnabled": false}}),
            ControlRequest::SaveSettings {
                settings: Settings {
                    auto_submit_enabled: false,
                    ..Settings::default()
                },
            },
        ),
    ];

    for (raw, expected) in cases {
        let parsed: ControlRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed, expected);
    }
}

#[test]
fn responses_serialize_flat() {
    assert_eq!(
        serde_json::to_value(ControlResponse::ack(true)).unwrap(),
        json!({"success": true})
    );
    assert_eq!(
        serde_json::to_value(ControlResponse::Status {
            status: "Ready for input".to_string(),
            is_processing: false,
        })
        .unwrap(),
        json!({"status": "Ready for input", "isProcessing": false})
    );
    assert_eq!(
        serde_json::to_value(ControlResponse::Schedule {
            phase: "idle".to_string(),
            remaining_seconds: None,
            delay_seconds: None,
        })
        .unwrap(),
        json!({"phase": "idle", "remainingSeconds": null, "delaySeconds": null})
    );
}

#[test]
fn unknown_action_is_rejected() {
    let parsed = serde_json::from_value::<ControlRequest>(json!({"action": "reboot"}));
    assert!(parsed.is_err());
}

#[tokio::test(start_paused = true)]
async fn status_updates_are_reported_back() {
    init_logging();
    let relay = start(&store_with(&[], 65), &ScriptedPage::ready());

    assert_eq!(
        relay.handle(ControlRequest::GetStatus).await,
        Some(ControlResponse::Status {
            status: "Not connected".to_string(),
            is_processing: false,
        })
    );

    let ack = relay
        .handle(ControlRequest::UpdateStatus {
            status: "Processing".to_string(),
            is_processing: true,
        })
        .await;
    assert_eq!(ack, None);
    assert_eq!(
        relay.handle(ControlRequest::GetStatus).await,
        Some(ControlResponse::Status {
            status: "Processing".to_string(),
            is_processing: true,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn send_prompt_submits_immediately() {
    init_logging();
    let store = store_with(&["queued"], 65);
    let page = ScriptedPage::ready();
    let relay = start(&store, &page);

    let response = relay
        .handle(ControlRequest::SendPrompt {
            prompt: "right now".to_string(),
        })
        .await;

    assert_eq!(response, Some(ControlResponse::ack(true)));
    assert_eq!(page.submitted(), vec!["right now"]);
    assert_eq!(queued_texts(&store), vec!["queued"]);
    assert_eq!(relay.status().text, "Prompt submitted");
}

#[tokio::test(start_paused = true)]
async fn send_prompt_reports_failure() {
    init_logging();
    let page = ScriptedPage::without_input();
    let relay = start(&store_with(&[], 65), &page);

    let response = relay
        .handle(ControlRequest::SendPrompt {
            prompt: "x".to_string(),
        })
        .await;

    assert_eq!(response, Some(ControlResponse::ack(false)));
    assert_eq!(relay.status().text, "Not connected");
}

#[tokio::test(start_paused = true)]
async fn adding_prompts_splits_and_arms_scheduler() {
    init_logging();
    let store = store_with(&[], 65);
    let relay = start(&store, &ScriptedPage::ready());
    assert_eq!(phase(&relay).await, Phase::Idle);

    let response = relay
        .handle(ControlRequest::AddPrompts {
            text: NUMBERED.to_string(),
        })
        .await;

    assert_eq!(response, Some(ControlResponse::ack(true)));
    let queue = store.queue().unwrap();
    let titles: Vec<_> = queue.iter().map(|record| record.title.as_str()).collect();
    assert_eq!(titles, vec!["1. Sunset", "2. Storm"]);
    assert_eq!(
        queued_texts(&store),
        vec!["Golden light on calm water", "Waves crash on the pier"]
    );
    assert_eq!(phase(&relay).await, Phase::Armed);
}

#[tokio::test(start_paused = true)]
async fn adding_prompts_with_auto_submit_off_stays_idle() {
    init_logging();
    let store = store_with(&[], 65);
    auto_submit(&store, false);
    let relay = start(&store, &ScriptedPage::ready());

    let added = relay.add_prompts("just one prompt", epoch()).unwrap();

    assert_eq!(added, 1);
    assert_eq!(queued_texts(&store), vec!["just one prompt"]);
    assert_eq!(phase(&relay).await, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn blank_input_adds_nothing() {
    init_logging();
    let store = store_with(&[], 65);
    let relay = start(&store, &ScriptedPage::ready());

    let response = relay
        .handle(ControlRequest::AddPrompts {
            text: "   \n ".to_string(),
        })
        .await;

    assert_eq!(response, Some(ControlResponse::ack(false)));
    assert!(store.queue().unwrap().is_empty());
    assert_eq!(phase(&relay).await, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn clearing_queue_disables_scheduler() {
    init_logging();
    let store = store_with(&["A", "B"], 65);
    let relay = start(&store, &ScriptedPage::ready());
    assert_eq!(phase(&relay).await, Phase::Armed);

    let response = relay.handle(ControlRequest::ClearQueue).await;

    assert_eq!(response, Some(ControlResponse::ack(true)));
    assert!(store.queue().unwrap().is_empty());
    assert_eq!(phase(&relay).await, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn start_stays_idle_when_nothing_is_queued() {
    init_logging();
    let relay = start(&store_with(&[], 65), &ScriptedPage::ready());
    assert_eq!(phase(&relay).await, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn control_requests_toggle_scheduler() {
    init_logging();
    let store = store_with(&["A"], 65);
    auto_submit(&store, false);
    let relay = start(&store, &ScriptedPage::ready());
    assert_eq!(phase(&relay).await, Phase::Idle);

    relay.handle(ControlRequest::EnableAutoSubmit).await;
    assert_eq!(phase(&relay).await, Phase::Armed);

    relay.handle(ControlRequest::DisableAutoSubmit).await;
    assert_eq!(phase(&relay).await, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn send_now_submits_first_and_queues_rest() {
    init_logging();
    let store = store_with(&[], 65);
    let page = ScriptedPage::ready();
    let relay = start(&store, &page);

    let queued = relay.send_now(NUMBERED, epoch()).await.unwrap();

    assert_eq!(queued, 1);
    assert_eq!(page.submitted(), vec!["Golden light on calm water"]);
    assert_eq!(queued_texts(&store), vec!["Waves crash on the pier"]);
    assert_eq!(phase(&relay).await, Phase::Armed);
}

#[tokio::test(start_paused = true)]
async fn send_now_failure_queues_nothing() {
    init_logging();
    let store = store_with(&[], 65);
    let relay = start(&store, &ScriptedPage::without_submit());

    let err = relay.send_now(NUMBERED, epoch()).await.unwrap_err();

    assert!(matches!(err, RelayError::Submit(SubmitError::ControlNotFound(_))));
    assert!(store.queue().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn send_from_queue_marks_without_removing() {
    init_logging();
    let store = store_with(&["A", "B"], 65);
    auto_submit(&store, false);
    let page = ScriptedPage::ready();
    let relay = start(&store, &page);

    let record = relay.send_from_queue(1).await.unwrap();

    assert_eq!(page.submitted(), vec!["B"]);
    assert_eq!((record.sent_count, record.is_sent), (1, true));
    assert_eq!(queued_texts(&store), vec!["A", "B"]);

    relay.send_from_queue(1).await.unwrap();
    assert_eq!(store.queue().unwrap().get(1).unwrap().sent_count, 2);
    assert!(matches!(
        relay.send_from_queue(5).await,
        Err(RelayError::Queue(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn send_from_queue_marks_the_record_even_if_queue_shifts() {
    init_logging();
    let store = store_with(&["A", "B", "C"], 1);
    let relay = start(&store, &ScriptedPage::ready());

    // The scheduler pops "A" at 1s, while "B" is still settling.
    tokio::time::sleep(Duration::from_millis(800)).await;
    let record = relay.send_from_queue(1).await.unwrap();

    assert_eq!(record.text, "B");
    assert_eq!(queued_texts(&store), vec!["B", "C"]);
    let queue = store.queue().unwrap();
    assert_eq!(queue.get(0).unwrap().sent_count, 1);
    assert_eq!(queue.get(1).unwrap().sent_count, 0);
    assert!(!queue.get(1).unwrap().is_sent);
}

#[tokio::test(start_paused = true)]
async fn schedule_request_reports_countdown() {
    init_logging();
    let store = store_with(&["A"], 65);
    let relay = start(&store, &ScriptedPage::ready());

    tokio::time::sleep(Duration::from_millis(20_500)).await;
    let response = relay.handle(ControlRequest::GetSchedule).await;

    assert_eq!(
        response,
        Some(ControlResponse::Schedule {
            phase: "armed".to_string(),
            remaining_seconds: Some(45),
            delay_seconds: Some(65),
        })
    );

    relay.handle(ControlRequest::DisableAutoSubmit).await;
    assert_eq!(
        relay.handle(ControlRequest::GetSchedule).await,
        Some(ControlResponse::Schedule {
            phase: "idle".to_string(),
            remaining_seconds: None,
            delay_seconds: None,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn save_settings_request_applies_to_running_relay() {
    init_logging();
    let store = store_with(&["A"], 65);
    let relay = start(&store, &ScriptedPage::ready());
    assert_eq!(phase(&relay).await, Phase::Armed);

    let response = relay
        .handle(ControlRequest::SaveSettings {
            settings: Settings {
                auto_submit_enabled: false,
                auto_submit_delay_seconds: 30,
                ..Settings::default()
            },
        })
        .await;

    assert_eq!(response, Some(ControlResponse::ack(true)));
    assert_eq!(phase(&relay).await, Phase::Idle);
    let saved = store.settings().unwrap();
    assert!(!saved.auto_submit_enabled);
    assert_eq!(saved.auto_submit_delay_seconds, 30);
}

#[tokio::test(start_paused = true)]
async fn saving_settings_follows_auto_submit_flag() {
    init_logging();
    let store = store_with(&["A"], 65);
    let relay = start(&store, &ScriptedPage::ready());
    assert_eq!(phase(&relay).await, Phase::Armed);

    let saved = relay
        .save_settings(&Settings {
            auto_submit_enabled: false,
            auto_submit_delay_seconds: 0,
            ..Settings::default()
        })
        .unwrap();

    assert_eq!(saved.auto_submit_delay_seconds, 65);
    assert_eq!(phase(&relay).await, Phase::Idle);

    relay
        .save_settings(&Settings {
            auto_submit_delay_seconds: 30,
            ..Settings::default()
        })
        .unwrap();
    let snap = relay.scheduler().snapshot().await.unwrap();
    assert_eq!(snap.armed_delay, Some(Duration::from_secs(30)));
}

#[tokio::test(start_paused = true)]
async fn status_poller_updates_board() {
    init_logging();
    let page = ScriptedPage::ready();
    page.set_status(StatusKind::Processing);
    let relay = start(&store_with(&[], 65), &page);
    let cancel = CancellationToken::new();

    let poller = relay.spawn_status_poller(cancel.clone());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(relay.status().text, "Processing");
    assert!(relay.status().is_processing);

    page.set_status(StatusKind::Unknown);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(relay.status().text, "Status unknown");
    assert!(relay.status().is_processing);

    cancel.cancel();
    poller.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn auto_submission_runs_after_start() {
    init_logging();
    let store = store_with(&["A"], 65);
    let page = ScriptedPage::ready();
    let relay = start(&store, &page);

    tokio::time::sleep(Duration::from_secs(66)).await;

    assert_eq!(page.submitted(), vec!["A"]);
    assert!(store.queue().unwrap().is_empty());
    relay.shutdown().await;
}
