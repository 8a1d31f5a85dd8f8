//! Webhook envelope normalisation.
//!
//! Deliveries arrive either as the platform event itself or wrapped in a
//! notification whose `Message` field holds the event as a JSON string.
//! The webhook entry inside the event may also be a JSON string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wv_domain::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Normalized message
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Phone number ARN of the business number that received the message.
    pub tenant_key: String,
    pub message_id: String,
    /// The sender's chat id.
    pub sender_id: String,
    pub contact: Contact,
    pub timestamp: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text { body: String },
    Audio(AudioAttachment),
    Unsupported { kind: String },
}

impl MessageContent {
    pub fn kind(&self) -> &str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Audio(_) => "audio",
            MessageContent::Unsupported { kind } => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAttachment {
    pub id: String,
    pub mime_type: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub voice: bool,
}

impl AudioAttachment {
    /// File extension from an `audio/*` MIME type, parameters dropped.
    pub fn extension(&self) -> Result<&str> {
        self.mime_type
            .strip_prefix("audio/")
            .map(|rest| rest.split(';').next().unwrap_or(rest).trim())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| Error::Input(format!("unknown mime type: {}", self.mime_type)))
    }

    pub fn file_name(&self) -> Result<String> {
        Ok(format!("{}.{}", self.id, self.extension()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    pub wa_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct PlatformEvent {
    context: EventContext,
}

#[derive(Debug, Deserialize)]
struct EventContext {
    #[serde(rename = "MetaPhoneNumberIds", default)]
    phone_numbers: Vec<PhoneNumberRef>,
}

#[derive(Debug, Deserialize)]
struct PhoneNumberRef {
    arn: String,
    #[serde(rename = "metaPhoneNumberId", default)]
    meta_phone_number_id: String,
}

#[derive(Debug, Deserialize)]
struct WebhookEntry {
    #[serde(default)]
    changes: Vec<EntryChange>,
}

#[derive(Debug, Deserialize)]
struct EntryChange {
    value: ChangeValue,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(default)]
    phone_number_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    from: String,
    id: String,
    #[serde(default)]
    timestamp: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<TextBody>,
    #[serde(default)]
    audio: Option<AudioAttachment>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Normalisation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Normalize one delivery. `Ok(None)` means the event carries no user
/// message (status updates, read receipts).
pub fn normalize(raw: Value) -> Result<Option<InboundMessage>> {
    let event = unwrap_notification(raw)?;
    let entry_value = event
        .get("whatsAppWebhookEntry")
        .cloned()
        .ok_or_else(|| Error::Input("event has no whatsAppWebhookEntry".into()))?;
    let entry: WebhookEntry = serde_json::from_value(decode_if_string(entry_value)?)
        .map_err(|e| Error::Input(format!("webhook entry: {e}")))?;
    let event: PlatformEvent =
        serde_json::from_value(event).map_err(|e| Error::Input(format!("event: {e}")))?;

    let Some(change) = entry.changes.into_iter().next() else {
        return Ok(None);
    };
    let value = change.value;
    let Some(message) = value.messages.into_iter().next() else {
        return Ok(None);
    };

    let metadata_id = value.metadata.and_then(|m| m.phone_number_id);
    let tenant_key = pick_tenant_key(&event.context.phone_numbers, metadata_id.as_deref())?;

    let contact = value.contacts.into_iter().next().unwrap_or_else(|| Contact {
        profile: None,
        wa_id: message.from.clone(),
    });

    let content = match message.kind.as_str() {
        "text" => MessageContent::Text {
            body: message
                .text
                .ok_or_else(|| Error::Input("text message without body".into()))?
                .body,
        },
        "audio" => MessageContent::Audio(
            message
                .audio
                .ok_or_else(|| Error::Input("audio message without attachment".into()))?,
        ),
        other => MessageContent::Unsupported {
            kind: other.to_owned(),
        },
    };

    Ok(Some(InboundMessage {
        tenant_key,
        message_id: message.id,
        sender_id: contact.wa_id.clone(),
        contact,
        timestamp: message.timestamp,
        content,
    }))
}

fn unwrap_notification(raw: Value) -> Result<Value> {
    match raw.get("Message") {
        Some(Value::String(inner)) if raw.get("context").is_none() => Ok(serde_json::from_str(inner)
            .map_err(|e| Error::Input(format!("notification message: {e}")))?),
        _ => Ok(raw),
    }
}

fn decode_if_string(v: Value) -> Result<Value> {
    match v {
        Value::String(s) => {
            serde_json::from_str(&s).map_err(|e| Error::Input(format!("webhook entry: {e}")))
        }
        other => Ok(other),
    }
}

/// The receiving number's ARN: the one whose platform id matches the
/// webhook metadata, else the first listed.
fn pick_tenant_key(numbers: &[PhoneNumberRef], metadata_id: Option<&str>) -> Result<String> {
    metadata_id
        .and_then(|id| numbers.iter().find(|n| n.meta_phone_number_id == id))
        .or_else(|| numbers.first())
        .map(|n| n.arn.clone())
        .ok_or_else(|| Error::Input("event names no receiving phone number".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn text_event(body: &str) -> Value {
        serde_json::json!({
            "aws_account_id": "123456789012",
            "context": {
                "MetaWabaIds": [],
                "MetaPhoneNumberIds": [
                    {"arn": "arn:aws:social-messaging:eu-west-1:1:phone-number-id/other", "metaPhoneNumberId": "999"},
                    {"arn": "arn:aws:social-messaging:eu-west-1:1:phone-number-id/pn-1", "metaPhoneNumberId": "111"}
                ]
            },
            "message_timestamp": "2025-01-01T10:00:00Z",
            "whatsAppWebhookEntry": {
                "id": "waba-1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {"display_phone_number": "39021234", "phone_number_id": "111"},
                        "contacts": [{"profile": {"name": "Mario"}, "wa_id": "393331234567"}],
                        "messages": [{
                            "from": "393331234567",
                            "id": "wamid.A",
                            "timestamp": "1735725600",
                            "type": "text",
                            "text": {"body": body}
                        }]
                    }
                }]
            }
        })
    }

    #[test]
    fn text_event_normalizes() {
        let msg = normalize(text_event("Ciao")).unwrap().unwrap();
        assert_eq!(
            msg.tenant_key,
            "arn:aws:social-messaging:eu-west-1:1:phone-number-id/pn-1"
        );
        assert_eq!(msg.sender_id, "393331234567");
        assert_eq!(msg.timestamp, "1735725600");
        assert_eq!(
            msg.content,
            MessageContent::Text {
                body: "Ciao".into()
            }
        );
        assert_eq!(msg.contact.profile.as_ref().unwrap().name, "Mario");
    }

    #[test]
    fn notification_wrapper_and_string_entry_are_unwrapped() {
        let mut event = text_event("Ciao");
        let entry = event["whatsAppWebhookEntry"].to_string();
        event["whatsAppWebhookEntry"] = Value::String(entry);
        let wrapped = serde_json::json!({
            "Type": "Notification",
            "Message": event.to_string()
        });
        let msg = normalize(wrapped).unwrap().unwrap();
        assert_eq!(msg.message_id, "wamid.A");
    }

    #[test]
    fn status_updates_carry_no_message() {
        let mut event = text_event("x");
        event["whatsAppWebhookEntry"]["changes"][0]["value"]["messages"] = serde_json::json!([]);
        assert!(normalize(event).unwrap().is_none());
    }

    #[test]
    fn other_types_are_unsupported() {
        let mut event = text_event("x");
        event["whatsAppWebhookEntry"]["changes"][0]["value"]["messages"][0]["type"] =
            Value::String("sticker".into());
        let msg = normalize(event).unwrap().unwrap();
        assert_eq!(msg.content.kind(), "sticker");
    }

    #[test]
    fn audio_extension_comes_from_mime() {
        let audio = AudioAttachment {
            id: "wamid.B".into(),
            mime_type: "audio/ogg; codecs=opus".into(),
            sha256: String::new(),
            voice: true,
        };
        assert_eq!(audio.file_name().unwrap(), "wamid.B.ogg");

        let bad = AudioAttachment {
            mime_type: "video/mp4".into(),
            ..audio
        };
        assert!(matches!(bad.extension(), Err(Error::Input(_))));
    }
}
