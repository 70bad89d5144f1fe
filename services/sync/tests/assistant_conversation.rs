//! Assistant controller contract: turn ordering, failure degradation to the
//! fixed fallback turn, idempotent start, and full reset.

mod common;

use common::ScriptedAssistant;
use madrasa_console_core::domain::{Language, TurnRole};
use std::sync::Arc;
use sync_lib::runtime::{AssistantController, ASSISTANT_FALLBACK_REPLY};

fn controller(service: &ScriptedAssistant) -> AssistantController {
    AssistantController::new(Arc::new(service.clone()))
}

#[tokio::test]
async fn every_send_appends_a_user_turn_then_an_assistant_turn() {
    let service = ScriptedAssistant::new();
    service.queue_reply("Wa alaikum assalam!");
    let mut assistant = controller(&service);

    assistant.send("Assalamu alaikum").await;
    assistant.send("When does Ramadan start?").await;

    let turns = assistant.turns();
    assert_eq!(turns.len(), 4);
    for pair in turns.chunks(2) {
        assert_eq!(pair[0].role, TurnRole::User);
        assert_eq!(pair[1].role, TurnRole::Assistant);
    }
    for (index, turn) in turns.iter().enumerate() {
        assert_eq!(turn.sequence, index as u64);
    }
    assert_eq!(turns[1].text, "Wa alaikum assalam!");
}

#[tokio::test]
async fn service_failure_becomes_the_fallback_turn() {
    let service = ScriptedAssistant::new();
    service.queue_failure("quota exhausted");
    let mut assistant = controller(&service);

    let last = assistant.send("Hello").await;
    assert_eq!(last.role, TurnRole::Assistant);
    assert_eq!(last.text, ASSISTANT_FALLBACK_REPLY);

    // The conversation survives the failure; the next send works normally.
    service.queue_reply("Bismillah. How can I help?");
    let last = assistant.send("Are you back?").await;
    assert_eq!(last.text, "Bismillah. How can I help?");
}

#[tokio::test]
async fn failing_to_open_the_conversation_also_falls_back() {
    let service = ScriptedAssistant::new();
    service.set_fail_start(true);
    let mut assistant = controller(&service);

    let last = assistant.send("Hello").await;
    assert_eq!(last.text, ASSISTANT_FALLBACK_REPLY);
    assert!(!assistant.is_open());

    // Once the service recovers, the next send opens a session and succeeds.
    service.set_fail_start(false);
    service.queue_reply("Bismillah.");
    let last = assistant.send("Hello again").await;
    assert_eq!(last.text, "Bismillah.");
    assert!(assistant.is_open());
}

#[tokio::test]
async fn start_reuses_the_open_session() {
    let service = ScriptedAssistant::new();
    let mut assistant = controller(&service);

    assistant.start().await.unwrap();
    assistant.start().await.unwrap();
    assistant.send("Hello").await;

    assert_eq!(service.start_calls(), 1);
}

#[tokio::test]
async fn reset_discards_the_session_and_every_turn() {
    let service = ScriptedAssistant::new();
    let mut assistant = controller(&service);
    assistant.send("Hello").await;
    assert!(assistant.is_open());

    assistant.reset();
    assert!(!assistant.is_open());
    assert!(assistant.turns().is_empty());

    // Restart after reset begins a brand-new dialogue.
    assistant.send("Hello again").await;
    assert_eq!(assistant.turns()[0].sequence, 0);
    assert_eq!(service.start_calls(), 2);
}

#[tokio::test]
async fn drafting_strips_fences_and_carries_the_request_fields() {
    let service = ScriptedAssistant::new();
    service.queue_reply("```html\n<div>Notice: Eid Holiday</div>\n```");
    let assistant = controller(&service);

    let html = assistant
        .draft_notice("Eid Holiday", Language::English)
        .await
        .unwrap();
    assert_eq!(html, "<div>Notice: Eid Holiday</div>");

    let prompt = &service.prompts()[0];
    assert!(prompt.contains("Eid Holiday"));
    assert!(prompt.contains("English"));

    service.queue_reply("Masha'Allah, excellent effort in Arabic.");
    let remark = assistant
        .draft_result_comment("Ayesha", 92, "Arabic", Language::English)
        .await
        .unwrap();
    assert!(remark.contains("excellent effort"));
}

#[tokio::test]
async fn drafting_failure_is_reported_to_the_caller() {
    let service = ScriptedAssistant::new();
    service.queue_failure("network down");
    let assistant = controller(&service);

    let result = assistant
        .draft_question_paper("Fiqh", "Class 5", "Purity, Prayer", "100", Language::Bengali)
        .await;
    assert!(result.is_err());
}
