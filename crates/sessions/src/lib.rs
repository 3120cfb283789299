//! Conversation state for CodeMitra.
//!
//! Holds the role-tagged message log of each session, renders it into
//! display turns, and turns a (truncated) log into the flat-text prompt the
//! inference daemon expects.

pub mod history;
pub mod prompt;
pub mod store;

pub use history::{render_turns, History, DEFAULT_KEEP_TURNS};
pub use prompt::{build_prompt, one_shot_prompt, PromptTemplate};
pub use store::{SessionHistories, SessionSummary};
