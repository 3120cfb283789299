//! Shared types for the CodeMitra relay: conversation messages, the model
//! error taxonomy, configuration and structured trace events.

pub mod config;
pub mod error;
pub mod message;
pub mod trace;

pub use error::{Error, ModelError, Result};
pub use message::{Message, Role, Turn};
