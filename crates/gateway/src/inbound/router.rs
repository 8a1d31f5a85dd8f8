//! Per-type processors and workflow start.
//!
//! Starts are fire-and-forget and at-least-once: a redelivered webhook
//! starts a second execution under a fresh name.

use serde_json::{json, Value};

use wv_domain::error::{Error, Result};
use wv_domain::tenant::TenantConfig;
use wv_domain::trace::TraceEvent;
use wv_platform::ObjectUri;

use super::envelope::{AudioAttachment, InboundMessage, MessageContent};
use super::media_key;
use crate::runtime::{PipelineContext, PipelineSettings};

/// Longest execution name the executor accepts.
const MAX_EXECUTION_NAME: usize = 80;
const LIVE_SUFFIX: &str = ":live";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Started {
        target: String,
        execution_name: String,
    },
    Dropped {
        reason: String,
    },
}

pub async fn route(ctx: &PipelineContext, msg: InboundMessage) -> Result<RouteOutcome> {
    let Some(tenant) = ctx.tenants.get(&msg.tenant_key) else {
        tracing::error!(
            tenant_key = %msg.tenant_key,
            message_id = %msg.message_id,
            "no tenant config for receiving number"
        );
        return Ok(drop_message(ctx, &msg, "tenant config not found".into()));
    };

    let payload = match &msg.content {
        MessageContent::Text { body } => json!({ "text": { "body": body } }),
        MessageContent::Audio(audio) => {
            let uri = store_audio(ctx, &tenant, audio).await?;
            json!({ "audio": { "s3_uri": uri.to_string() } })
        }
        MessageContent::Unsupported { kind } => {
            tracing::warn!(message_id = %msg.message_id, kind = %kind, "unsupported message type");
            let reason = format!("unsupported message type '{kind}'");
            return Ok(drop_message(ctx, &msg, reason));
        }
    };
    let input = enrich(payload, &msg, &tenant)?;

    let target = workflow_target(&ctx.settings, &msg.sender_id);
    let name = execution_name(&tenant.name);
    tracing::info!(target = %target, name = %name, kind = msg.content.kind(), "starting workflow");
    ctx.workflow.start(&target, &name, &input).await?;

    ctx.sink.record(TraceEvent::WorkflowStarted {
        target: target.clone(),
        execution_name: name.clone(),
        message_kind: msg.content.kind().to_owned(),
    });
    Ok(RouteOutcome::Started {
        target,
        execution_name: name,
    })
}

fn drop_message(ctx: &PipelineContext, msg: &InboundMessage, reason: String) -> RouteOutcome {
    ctx.sink.record(TraceEvent::InboundDropped {
        message_id: msg.message_id.clone(),
        reason: reason.clone(),
    });
    RouteOutcome::Dropped { reason }
}

/// Download the attachment and keep it under the tenant's `audio_in/`.
async fn store_audio(
    ctx: &PipelineContext,
    tenant: &TenantConfig,
    audio: &AudioAttachment,
) -> Result<ObjectUri> {
    let uri = ObjectUri::new(
        ctx.settings.media_bucket.clone(),
        media_key(tenant.phone_number_id(), "audio_in", &audio.file_name()?),
    );
    let bytes = ctx.media.fetch(&audio.id).await?;
    ctx.objects.put(&uri, &bytes).await?;
    ctx.sink.record(TraceEvent::MediaStored {
        uri: uri.to_string(),
        bytes: bytes.len(),
    });
    Ok(uri)
}

/// Merge the type payload with the fields every execution receives.
fn enrich(payload: Value, msg: &InboundMessage, tenant: &TenantConfig) -> Result<Value> {
    let Value::Object(mut input) = payload else {
        return Err(Error::Other("workflow payload is not an object".into()));
    };
    input.insert("message_ts".into(), Value::String(msg.timestamp.clone()));
    input.insert(
        "reply_to_wa_id".into(),
        Value::String(reply_to(&msg.sender_id)),
    );
    input.insert("wa_contact".into(), serde_json::to_value(&msg.contact)?);
    input.insert("config".into(), serde_json::to_value(tenant)?);
    Ok(Value::Object(input))
}

fn reply_to(sender_id: &str) -> String {
    if sender_id.starts_with('+') {
        sender_id.to_owned()
    } else {
        format!("+{sender_id}")
    }
}

/// Canary senders run the base target; everyone else runs its live alias.
pub fn workflow_target(settings: &PipelineSettings, sender_id: &str) -> String {
    let base = settings.workflow_arn.as_str();
    if settings.canary_sender_ids.iter().any(|id| id == sender_id) {
        base.to_owned()
    } else if base.ends_with(LIVE_SUFFIX) {
        base.to_owned()
    } else {
        format!("{base}{LIVE_SUFFIX}")
    }
}

/// `kebab(tenant name) + "_" + uuid`, within the executor's name limit.
pub fn execution_name(tenant_name: &str) -> String {
    let suffix = uuid::Uuid::new_v4().to_string();
    let budget = MAX_EXECUTION_NAME - suffix.len() - 1;
    let mut prefix = kebab(tenant_name);
    if prefix.is_empty() {
        prefix.push_str("tenant");
    }
    prefix.truncate(budget);
    let prefix = prefix.trim_end_matches('-');
    format!("{prefix}_{suffix}")
}

/// Lower-case words joined by `-`. Word breaks are non-alphanumeric runs
/// and lower-to-upper case changes.
fn kebab(s: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join("-")
}
