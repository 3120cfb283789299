use serde::Serialize;

/// Structured trace events emitted across all CodeMitra crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ModelRequest {
        model: String,
        endpoint: String,
        prompt_chars: usize,
        duration_ms: u64,
        status: Option<u16>,
        error_kind: Option<String>,
    },
    HistoryTruncated {
        session_key: String,
        stored_messages: usize,
        prompt_messages: usize,
    },
    TurnCompleted {
        session_key: String,
        turns: usize,
        failed: bool,
    },
    SessionCreated {
        session_key: String,
    },
    SessionReset {
        session_key: String,
        dropped_messages: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cm_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let ev = TraceEvent::SessionReset {
            session_key: "cli:chat".into(),
            dropped_messages: 4,
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event"], "SessionReset");
        assert_eq!(v["dropped_messages"], 4);
    }
}
