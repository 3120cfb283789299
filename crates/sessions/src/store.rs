//! In-memory, per-session conversation histories.
//!
//! Each session key owns its own [`History`]. Nothing is persisted; a
//! history lives until the process exits or the session is reset.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use cm_domain::trace::TraceEvent;
use cm_domain::{Message, Turn};

use crate::history::History;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
struct SessionEntry {
    history: History,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionEntry {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            history: History::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing row for a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_key: String,
    pub messages: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Registry of histories keyed by session key.
///
/// Callers that need a multi-step turn to be atomic per session (append,
/// await the model, append) must serialize on the session themselves; this
/// store only guarantees each individual call is consistent.
#[derive(Default)]
pub struct SessionHistories {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionHistories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered turns for a session. Unknown keys render as empty.
    pub fn view(&self, session_key: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .get(session_key)
            .map(|e| e.history.turns())
            .unwrap_or_default()
    }

    /// Snapshot of a session's full history.
    pub fn history(&self, session_key: &str) -> History {
        self.sessions
            .read()
            .get(session_key)
            .map(|e| e.history.clone())
            .unwrap_or_default()
    }

    /// Append the user message and return the truncated copy to prompt with.
    ///
    /// Creates the session on first use.
    pub fn begin_turn(&self, session_key: &str, user: Message, keep_turns: usize) -> Vec<Message> {
        let mut sessions = self.sessions.write();
        let entry = sessions.entry(session_key.to_owned()).or_insert_with(|| {
            TraceEvent::SessionCreated {
                session_key: session_key.to_owned(),
            }
            .emit();
            SessionEntry::new()
        });
        entry.history.append(user);
        entry.updated_at = Utc::now();

        let window = entry.history.truncated(keep_turns);
        if window.len() < entry.history.len() {
            TraceEvent::HistoryTruncated {
                session_key: session_key.to_owned(),
                stored_messages: entry.history.len(),
                prompt_messages: window.len(),
            }
            .emit();
        }
        window
    }

    /// Append a message to the end of a session's history and return the
    /// re-rendered turns.
    pub fn append(&self, session_key: &str, message: Message) -> Vec<Turn> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .entry(session_key.to_owned())
            .or_insert_with(SessionEntry::new);
        entry.history.append(message);
        entry.updated_at = Utc::now();
        entry.history.turns()
    }

    /// Forget a session. Returns the number of messages dropped.
    pub fn reset(&self, session_key: &str) -> usize {
        let dropped = self
            .sessions
            .write()
            .remove(session_key)
            .map(|e| e.history.len())
            .unwrap_or(0);

        TraceEvent::SessionReset {
            session_key: session_key.to_owned(),
            dropped_messages: dropped,
        }
        .emit();

        dropped
    }

    /// All sessions, most recently updated first.
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut out: Vec<SessionSummary> = self
            .sessions
            .read()
            .iter()
            .map(|(key, e)| SessionSummary {
                session_key: key.clone(),
                messages: e.history.len(),
                created_at: e.created_at,
                updated_at: e.updated_at,
            })
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        out
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
