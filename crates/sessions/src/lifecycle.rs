//! Session continuity decision.
//!
//! Evaluated once per inbound turn. A session resumes while it has been
//! idle for less than the window; otherwise a fresh session is minted and
//! the previous session's topic is carried forward as a seed.

use chrono::{DateTime, Duration, Utc};

use crate::store::SessionRecord;

/// Outcome of looking at a contact's most recent session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionDecision {
    /// Same session; bump its activity timestamp.
    Resume {
        session_id: String,
        topic_id: Option<String>,
    },
    /// The previous session went idle; start over with its topic as seed.
    Expired { carried_topic_id: Option<String> },
    /// The contact has never had a session.
    Fresh,
}

/// `true` while `now - last_active_at` is strictly below `idle`.
pub fn is_active(last_active_at: DateTime<Utc>, now: DateTime<Utc>, idle: Duration) -> bool {
    now.signed_duration_since(last_active_at) < idle
}

pub fn decide(
    latest: Option<&SessionRecord>,
    now: DateTime<Utc>,
    idle: Duration,
) -> SessionDecision {
    match latest {
        Some(rec) if is_active(rec.last_active_at, now, idle) => SessionDecision::Resume {
            session_id: rec.session_id.clone(),
            topic_id: rec.current_topic_id.clone(),
        },
        Some(rec) => SessionDecision::Expired {
            carried_topic_id: rec.current_topic_id.clone(),
        },
        None => SessionDecision::Fresh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(last_active_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord::start("c1", Some("t-1".into()), last_active_at)
    }

    #[test]
    fn ten_minutes_idle_resumes() {
        let now = Utc::now();
        let r = rec(now - Duration::minutes(10));
        match decide(Some(&r), now, Duration::minutes(30)) {
            SessionDecision::Resume {
                session_id,
                topic_id,
            } => {
                assert_eq!(session_id, r.session_id);
                assert_eq!(topic_id.as_deref(), Some("t-1"));
            }
            other => panic!("expected resume, got {other:?}"),
        }
    }

    #[test]
    fn exactly_thirty_minutes_expires() {
        let now = Utc::now();
        let r = rec(now - Duration::minutes(30));
        assert_eq!(
            decide(Some(&r), now, Duration::minutes(30)),
            SessionDecision::Expired {
                carried_topic_id: Some("t-1".into())
            }
        );
    }

    #[test]
    fn forty_five_minutes_expires_with_seed() {
        let now = Utc::now();
        let r = rec(now - Duration::minutes(45));
        assert!(matches!(
            decide(Some(&r), now, Duration::minutes(30)),
            SessionDecision::Expired { .. }
        ));
    }

    #[test]
    fn no_history_is_fresh() {
        assert_eq!(
            decide(None, Utc::now(), Duration::minutes(30)),
            SessionDecision::Fresh
        );
    }
}
