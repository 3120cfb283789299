//! Core runtime: ties per-session history, prompt rendering and the model
//! client into one turn.

pub mod session_lock;
pub mod turn;

pub use turn::{error_reply, TurnOrchestrator, ERROR_TAG};
