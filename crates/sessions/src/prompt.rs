//! Flat-text prompt rendering for completion-style models.
//!
//! ```text
//! <preamble>
//! User: ...
//! Assistant: ...
//! Assistant:
//! ```

use cm_domain::Message;
use serde::{Deserialize, Serialize};

/// Cue line that asks the model to continue as the assistant.
pub const ASSISTANT_CUE: &str = "Assistant:";

/// Render `preamble` and `messages` into a single prompt string.
///
/// Pure: identical input always yields a byte-identical prompt.
pub fn build_prompt(preamble: &str, messages: &[Message]) -> String {
    let mut lines = Vec::with_capacity(messages.len() + 2);
    lines.push(preamble.trim().to_owned());
    for msg in messages {
        lines.push(format!("{}: {}", msg.role().label(), msg.content().trim()));
    }
    lines.push(ASSISTANT_CUE.to_owned());
    lines.join("\n")
}

/// Prompt for a single question with no prior conversation.
pub fn one_shot_prompt(preamble: &str, question: &str) -> String {
    build_prompt(preamble, &[Message::user(question)])
}

/// How a raw request is phrased before it becomes the user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptTemplate {
    /// Free-form question, passed through unchanged.
    #[default]
    Ask,
    /// The input is a code snippet to be explained.
    Explain,
    /// The input describes code to be written.
    Generate,
}

impl PromptTemplate {
    pub fn apply(self, input: &str) -> String {
        match self {
            PromptTemplate::Ask => input.to_owned(),
            PromptTemplate::Explain => format!("Please explain this code:\n\n{input}"),
            PromptTemplate::Generate => format!("Generate code for: {input}"),
        }
    }
}
