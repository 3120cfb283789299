pub mod ollama;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use ollama::{parse_generation, OllamaClient, TEXT_FIELDS};
pub use traits::{GenerateOptions, ModelClient};
