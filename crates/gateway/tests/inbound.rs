mod common;

use serde_json::{json, Value};

use common::{Harness, CANARY_SENDER, TENANT_KEY, WORKFLOW_ARN};
use wv_domain::trace::TraceEvent;
use wv_gateway::inbound::{normalize, route, RouteOutcome};

fn event(from: &str, message: Value) -> Value {
    let mut message = message;
    message["from"] = json!(from);
    message["id"] = json!("wamid.HBgM");
    message["timestamp"] = json!("1735725600");
    json!({
        "aws_account_id": "123456789012",
        "context": {
            "MetaWabaIds": [{"wabaId": "waba-1"}],
            "MetaPhoneNumberIds": [{"arn": TENANT_KEY, "metaPhoneNumberId": "111"}]
        },
        "message_timestamp": "2025-01-01T10:00:00Z",
        "whatsAppWebhookEntry": json!({
            "id": "waba-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"display_phone_number": "39021234", "phone_number_id": "111"},
                    "contacts": [{"profile": {"name": "Mario Rossi"}, "wa_id": from}],
                    "messages": [message]
                }
            }]
        })
        .to_string()
    })
}

fn text(from: &str, body: &str) -> Value {
    event(from, json!({"type": "text", "text": {"body": body}}))
}

/// Wrap an event the way the notification topic delivers it.
fn notification(inner: &Value) -> Value {
    json!({"Type": "Notification", "MessageId": "n-1", "Message": inner.to_string()})
}

#[tokio::test]
async fn text_message_starts_the_live_workflow() {
    let h = Harness::new();
    h.add_tenant("Dottor Rossi");

    let msg = normalize(notification(&text("393331234567", "Ciao!")))
        .unwrap()
        .unwrap();
    let outcome = route(&h.ctx, msg).await.unwrap();
    assert!(matches!(outcome, RouteOutcome::Started { .. }));

    let started = h.workflow.started();
    assert_eq!(started.len(), 1);
    let exec = &started[0];
    assert_eq!(exec.target, format!("{WORKFLOW_ARN}:live"));
    assert!(exec.name.starts_with("dottor-rossi_"));

    assert_eq!(exec.input["text"], json!({"body": "Ciao!"}));
    assert_eq!(exec.input["message_ts"], "1735725600");
    assert_eq!(exec.input["reply_to_wa_id"], "+393331234567");
    assert_eq!(exec.input["wa_contact"]["profile"]["name"], "Mario Rossi");
    assert_eq!(exec.input["config"]["wa_phone_number_arn"], TENANT_KEY);
    assert_eq!(exec.input["config"]["name"], "Dottor Rossi");
    // Deployment defaults are applied before the config is forwarded.
    assert_eq!(
        exec.input["config"]["response_generator"]["knowledge_base_id"],
        "KB-DEFAULT"
    );
}

#[tokio::test]
async fn canary_sender_runs_the_base_target() {
    let h = Harness::new();
    h.add_tenant("Demo");
    let msg = normalize(text(CANARY_SENDER, "test")).unwrap().unwrap();
    route(&h.ctx, msg).await.unwrap();
    assert_eq!(h.workflow.started()[0].target, WORKFLOW_ARN);
}

#[tokio::test]
async fn audio_is_stored_before_the_workflow_starts() {
    let h = Harness::new();
    h.add_tenant("Demo");
    let raw = event(
        "393331234567",
        json!({
            "type": "audio",
            "audio": {
                "id": "media-42",
                "mime_type": "audio/ogg; codecs=opus",
                "sha256": "abc",
                "voice": true
            }
        }),
    );

    let msg = normalize(raw).unwrap().unwrap();
    route(&h.ctx, msg).await.unwrap();

    assert_eq!(h.media.fetched(), vec!["media-42"]);
    let stored = h
        .objects_root
        .path()
        .join("wave-media/pn-1/audio_in/media-42.ogg");
    assert_eq!(std::fs::read(stored).unwrap(), b"voice-note");

    let exec = &h.workflow.started()[0];
    assert_eq!(
        exec.input["audio"],
        json!({"s3_uri": "s3://wave-media/pn-1/audio_in/media-42.ogg"})
    );
    assert!(exec.input.get("text").is_none());
    assert!(h
        .events()
        .iter()
        .any(|e| matches!(e, TraceEvent::MediaStored { bytes: 10, .. })));
}

#[tokio::test]
async fn unsupported_types_start_nothing() {
    let h = Harness::new();
    h.add_tenant("Demo");
    let raw = event(
        "393331234567",
        json!({"type": "image", "image": {"id": "img-1", "mime_type": "image/jpeg"}}),
    );

    let msg = normalize(raw).unwrap().unwrap();
    let outcome = route(&h.ctx, msg).await.unwrap();

    assert!(matches!(outcome, RouteOutcome::Dropped { .. }));
    assert!(h.workflow.started().is_empty());
    assert!(h.media.fetched().is_empty());
}

#[tokio::test]
async fn unknown_tenant_is_dropped() {
    let h = Harness::new();
    let msg = normalize(text("393331234567", "Ciao")).unwrap().unwrap();
    let outcome = route(&h.ctx, msg).await.unwrap();

    match outcome {
        RouteOutcome::Dropped { reason } => assert!(reason.contains("tenant")),
        other => panic!("expected drop, got {other:?}"),
    }
    assert!(h.workflow.started().is_empty());
    assert!(h
        .events()
        .iter()
        .any(|e| matches!(e, TraceEvent::InboundDropped { .. })));
}

#[tokio::test]
async fn redelivery_starts_a_second_execution() {
    let h = Harness::new();
    h.add_tenant("Demo");
    for _ in 0..2 {
        let msg = normalize(text("393331234567", "Ciao")).unwrap().unwrap();
        route(&h.ctx, msg).await.unwrap();
    }
    let started = h.workflow.started();
    assert_eq!(started.len(), 2);
    assert_ne!(started[0].name, started[1].name);
}
