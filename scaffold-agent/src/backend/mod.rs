//! LLM Backend abstraction layer.
//!
//! Provides a trait-based interface for the inference engines behind the
//! suggestion oracle:
//! - OpenAI-compatible (Ollama, vLLM, OpenAI, etc.)
//! - Mock backend for testing

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use traits::{CompletionRequest, CompletionResponse, FinishReason, LlmBackend, LlmError, Usage};
