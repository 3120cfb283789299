//! Turn orchestration: history update, prompt rendering and the model call
//! for one user message.
//!
//! Entry points: [`TurnOrchestrator::respond`] for multi-turn chat and
//! [`TurnOrchestrator::ask`] for one-shot questions.

use std::sync::Arc;

use tracing::Instrument;

use cm_domain::config::ChatConfig;
use cm_domain::trace::TraceEvent;
use cm_domain::{Message, ModelError, Turn};
use cm_providers::{GenerateOptions, ModelClient};
use cm_sessions::{build_prompt, one_shot_prompt, SessionHistories};

use super::session_lock::SessionLockMap;

/// Marker placed in front of failure text so errors stand out in the
/// transcript.
pub const ERROR_TAG: &str = "[Error]";

/// Render a model failure as a transcript/payload string.
pub fn error_reply(err: &ModelError) -> String {
    format!("{ERROR_TAG} {err}")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct TurnOrchestrator {
    model: Arc<dyn ModelClient>,
    sessions: SessionHistories,
    locks: SessionLockMap,
    system_prompt: String,
    max_turns: usize,
}

impl TurnOrchestrator {
    pub fn new(chat: &ChatConfig, model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            sessions: SessionHistories::new(),
            locks: SessionLockMap::new(),
            system_prompt: chat.system_prompt.clone(),
            max_turns: chat.max_turns,
        }
    }

    /// Run one chat turn for `session_key` and return the full rendered
    /// conversation.
    ///
    /// Blank input is a no-op: nothing is appended and the model is not
    /// called. Model failures become a tagged assistant message instead of
    /// an error.
    ///
    /// The turn runs on its own task, so dropping the returned future (a
    /// client hanging up mid-generation) does not cut it short: the reply
    /// is still recorded.
    pub async fn respond(
        self: &Arc<Self>,
        session_key: &str,
        user_text: &str,
        opts: &GenerateOptions,
    ) -> Vec<Turn> {
        let text = user_text.trim();
        if text.is_empty() {
            return self.sessions.view(session_key);
        }

        let this = Arc::clone(self);
        let key = session_key.to_owned();
        let text = text.to_owned();
        let opts = opts.clone();
        let turn_span = tracing::info_span!("turn", session_key = %key);

        let handle = tokio::spawn(
            async move { this.run_turn(&key, text, &opts).await }.instrument(turn_span),
        );

        match handle.await {
            Ok(turns) => turns,
            Err(e) => {
                tracing::error!(session_key, error = %e, "turn task failed");
                self.sessions.view(session_key)
            }
        }
    }

    /// Steps of one turn, serialized per session.
    async fn run_turn(&self, session_key: &str, text: String, opts: &GenerateOptions) -> Vec<Turn> {
        let turns = {
            let _guard = self.locks.acquire(session_key).await;

            let window = self
                .sessions
                .begin_turn(session_key, Message::user(text), self.max_turns);
            let prompt = build_prompt(&self.system_prompt, &window);

            let (reply, failed) = match self.model.generate(&prompt, opts).await {
                Ok(reply) => (reply.trim().to_owned(), false),
                Err(e) => (error_reply(&e), true),
            };

            let turns = self.sessions.append(session_key, Message::assistant(reply));

            TraceEvent::TurnCompleted {
                session_key: session_key.to_owned(),
                turns: turns.len(),
                failed,
            }
            .emit();

            turns
        };
        self.locks.prune_idle();
        turns
    }

    /// One-shot question: preamble plus a single user turn, no history.
    pub async fn ask(&self, question: &str, opts: &GenerateOptions) -> Result<String, ModelError> {
        let prompt = one_shot_prompt(&self.system_prompt, question.trim());
        self.model.generate(&prompt, opts).await
    }

    /// Current rendered view of a session.
    pub fn view(&self, session_key: &str) -> Vec<Turn> {
        self.sessions.view(session_key)
    }

    /// Forget a session's history. Waits for an in-flight turn to finish.
    pub async fn reset(&self, session_key: &str) -> usize {
        let dropped = {
            let _guard = self.locks.acquire(session_key).await;
            self.sessions.reset(session_key)
        };
        self.locks.prune_idle();
        dropped
    }

    pub fn sessions(&self) -> &SessionHistories {
        &self.sessions
    }

    pub fn model(&self) -> &dyn ModelClient {
        self.model.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Model stub that replays canned results and records every prompt.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, ModelError>>>,
        prompts: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl ScriptedModel {
        fn with(replies: Vec<Result<String, ModelError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            })
        }

        fn slow(reply: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(vec![Ok(reply.to_owned())].into()),
                delay,
                ..Self::default()
            })
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate(&self, prompt: &str, _: &GenerateOptions) -> Result<String, ModelError> {
            self.prompts.lock().push(prompt.to_owned());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok("default".into()))
        }

        async fn ping(&self) -> Result<(), ModelError> {
            Ok(())
        }

        fn default_model(&self) -> &str {
            "stub"
        }

        fn endpoint(&self) -> &str {
            "stub://"
        }
    }

    fn chat_config(max_turns: usize) -> ChatConfig {
        ChatConfig {
            system_prompt: "  SYS  ".into(),
            max_turns,
        }
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let model = ScriptedModel::with(vec![Ok("first".into())]);
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model.clone()));
        let opts = GenerateOptions::default();

        let before = orch.respond("s", "hello", &opts).await;
        let after = orch.respond("s", "   \n\t", &opts).await;

        assert_eq!(before, after);
        assert_eq!(model.prompts.lock().len(), 1);
        assert_eq!(orch.sessions().history("s").len(), 2);
    }

    #[tokio::test]
    async fn reply_is_trimmed_and_paired() {
        let model = ScriptedModel::with(vec![Ok("  A list is...\n".into())]);
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model.clone()));

        let turns = orch
            .respond("s", "  what is a list?  ", &GenerateOptions::default())
            .await;

        assert_eq!(turns, vec![Turn::new("what is a list?", "A list is...")]);
        assert_eq!(
            model.prompts.lock()[0],
            "SYS\nUser: what is a list?\nAssistant:"
        );
    }

    #[tokio::test]
    async fn failure_is_tagged_in_transcript() {
        let model = ScriptedModel::with(vec![Err(ModelError::Server {
            status: 500,
            body: "oops".into(),
        })]);
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model));

        let turns = orch.respond("s", "hi", &GenerateOptions::default()).await;

        assert_eq!(turns.len(), 1);
        assert_eq!(
            turns[0].assistant,
            "[Error] Error from server (status 500): oops"
        );
    }

    #[tokio::test]
    async fn prompt_window_is_truncated_but_view_is_not() {
        let model = ScriptedModel::with(Vec::new());
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(1), model.clone()));
        let opts = GenerateOptions::default();

        orch.respond("s", "q1", &opts).await;
        orch.respond("s", "q2", &opts).await;
        let turns = orch.respond("s", "q3", &opts).await;

        assert_eq!(turns.len(), 3);
        // Window of one turn = two messages: previous reply + new question.
        assert_eq!(
            model.prompts.lock()[2],
            "SYS\nAssistant: default\nUser: q3\nAssistant:"
        );
    }

    #[tokio::test]
    async fn earlier_turns_feed_later_prompts() {
        let model = ScriptedModel::with(vec![Ok("B".into()), Ok("D".into())]);
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model.clone()));
        let opts = GenerateOptions::default();

        orch.respond("s", "A", &opts).await;
        let turns = orch.respond("s", "C", &opts).await;

        assert_eq!(turns, vec![Turn::new("A", "B"), Turn::new("C", "D")]);
        assert_eq!(
            model.prompts.lock()[1],
            "SYS\nUser: A\nAssistant: B\nUser: C\nAssistant:"
        );
    }

    #[tokio::test]
    async fn sessions_do_not_leak() {
        let model = ScriptedModel::with(Vec::new());
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model.clone()));
        let opts = GenerateOptions::default();

        orch.respond("alice", "secret", &opts).await;
        orch.respond("bob", "hello", &opts).await;

        assert_eq!(model.prompts.lock()[1], "SYS\nUser: hello\nAssistant:");
        assert_eq!(orch.view("bob").len(), 1);
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_session_do_not_interleave() {
        let model = ScriptedModel::with(Vec::new());
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model));
        let opts = GenerateOptions::default();

        let mut handles = Vec::new();
        for i in 0..8 {
            let orch = orch.clone();
            let opts = opts.clone();
            handles.push(tokio::spawn(async move {
                orch.respond("shared", &format!("q{i}"), &opts).await
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let turns = orch.view("shared");
        assert_eq!(turns.len(), 8);
        assert!(turns.iter().all(|t| t.assistant == "default"));
    }

    #[tokio::test]
    async fn ask_uses_single_turn_prompt_and_leaves_history_alone() {
        let model = ScriptedModel::with(vec![Ok("answer".into())]);
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model.clone()));

        let answer = orch.ask(" explain ", &GenerateOptions::default()).await.unwrap();

        assert_eq!(answer, "answer");
        assert_eq!(model.prompts.lock()[0], "SYS\nUser: explain\nAssistant:");
        assert!(orch.sessions().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_the_view() {
        let model = ScriptedModel::with(Vec::new());
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model));
        orch.respond("s", "hi", &GenerateOptions::default()).await;

        assert_eq!(orch.reset("s").await, 2);
        assert!(orch.view("s").is_empty());
    }

    #[tokio::test]
    async fn abandoned_caller_does_not_cut_the_turn_short() {
        let model = ScriptedModel::slow("late reply", Duration::from_millis(200));
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model));

        let early = tokio::time::timeout(
            Duration::from_millis(20),
            orch.respond("s", "q1", &GenerateOptions::default()),
        )
        .await;
        assert!(early.is_err(), "caller should have given up first");

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(orch.view("s"), vec![Turn::new("q1", "late reply")]);
        assert_eq!(orch.sessions().history("s").len(), 2);
    }

    #[tokio::test]
    async fn idle_session_locks_are_released_after_each_turn() {
        let model = ScriptedModel::with(Vec::new());
        let orch = Arc::new(TurnOrchestrator::new(&chat_config(6), model));
        let opts = GenerateOptions::default();

        for i in 0..5 {
            orch.respond(&format!("web:{i}"), "hi", &opts).await;
        }

        assert_eq!(orch.locks.session_count(), 0);
        assert_eq!(orch.sessions().len(), 5);
    }
}
