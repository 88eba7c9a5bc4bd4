//! Retrieval-augmented answering over a docchat index.
pub mod gemini;
pub mod orchestrator;
pub mod retriever;
pub mod synthesizer;

pub use gemini::GeminiGenerator;
pub use orchestrator::{Orchestrator, SessionState};
pub use retriever::Retriever;
pub use synthesizer::{build_prompt, synthesize, DECLINE_PHRASE};
