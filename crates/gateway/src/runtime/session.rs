//! `session-manager`: map a contact to a session id.
//!
//! The lookup, the decision and the write are separate store calls with
//! nothing held across them. Two turns from one contact racing through
//! here can each mint a session; the later write simply becomes the
//! contact's most recent one.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use wv_domain::error::{Error, Result};
use wv_domain::trace::TraceEvent;
use wv_sessions::{decide, SessionDecision, SessionRecord};

use super::PipelineContext;

#[derive(Debug, Deserialize)]
pub struct SessionInput {
    #[serde(default)]
    pub wa_contact_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutput {
    pub session_id: String,
    /// The session's current topic; for a replaced session, the seed
    /// carried over from the expired one.
    pub topic_id: Option<String>,
    pub is_new_session: bool,
}

pub async fn resolve_session(ctx: &PipelineContext, input: SessionInput) -> Result<SessionOutput> {
    let contact_id = input
        .wa_contact_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::Input("missing wa_contact_id".into()))?;

    let now = Utc::now();
    let latest = ctx.sessions.latest_for_contact(&contact_id).await?;

    let (out, carried_topic_id) = match decide(latest.as_ref(), now, ctx.settings.session_idle) {
        SessionDecision::Resume {
            session_id,
            topic_id,
        } => {
            ctx.sessions.touch(&session_id, now).await?;
            let out = SessionOutput {
                session_id,
                topic_id,
                is_new_session: false,
            };
            (out, None)
        }
        SessionDecision::Expired { carried_topic_id } => {
            let record = SessionRecord::start(&contact_id, carried_topic_id.clone(), now);
            let out = SessionOutput {
                session_id: record.session_id.clone(),
                topic_id: carried_topic_id.clone(),
                is_new_session: true,
            };
            ctx.sessions.put(record).await?;
            (out, carried_topic_id)
        }
        SessionDecision::Fresh => {
            let record = SessionRecord::start(&contact_id, None, now);
            let out = SessionOutput {
                session_id: record.session_id.clone(),
                topic_id: None,
                is_new_session: true,
            };
            ctx.sessions.put(record).await?;
            (out, None)
        }
    };

    ctx.sink.record(TraceEvent::SessionResolved {
        contact_id,
        session_id: out.session_id.clone(),
        is_new: out.is_new_session,
        carried_topic_id,
    });
    Ok(out)
}
