use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const DEFAULT_SYSTEM_PROMPT: &str = "SYSTEM: You are a code teaching assistant named \
CodeMITRA created by SOURABH. Answer code-related questions clearly, give examples, and \
show runnable snippets where useful.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Preamble prepended to every prompt.
    #[serde(default = "d_system_prompt")]
    pub system_prompt: String,
    /// Number of recent user/assistant pairs sent to the model.
    /// Display history is not affected.
    #[serde(default = "d_max_turns")]
    pub max_turns: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: d_system_prompt(),
            max_turns: d_max_turns(),
        }
    }
}

fn d_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn d_max_turns() -> usize {
    6
}
