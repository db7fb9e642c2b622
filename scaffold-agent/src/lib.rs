//! Scaffold Agent - LLM oracle for prerequisite suggestion
//!
//! This crate connects the prerequisite walk to a language model. It is
//! deliberately small: the model proposes, the catalog decides.
//!
//! ## Key Components
//!
//! - **Backends**: OpenAI-compatible HTTP backends (Ollama, vLLM) plus a
//!   scriptable mock for tests
//! - **Prompt assembly**: renders the analyzed chapter and the previous
//!   year's chapter index into the suggestion prompt
//! - **Suggestion parsing**: recovers the JSON span from free-form model
//!   chatter and decodes candidate chapters leniently
//! - **Audit**: bounded in-memory log of every oracle invocation

pub mod audit;
pub mod backend;
pub mod prompt;
pub mod suggestion;

pub use audit::{AuditEntry, AuditLog, AuditStats, CallOutcome};
pub use backend::{
    CompletionRequest, CompletionResponse, FinishReason, LlmBackend, LlmError, MockBackend,
    OpenAiBackend, Usage,
};
pub use prompt::{PromptAssembler, QuestionCounts};
pub use suggestion::{extract_json_span, parse_suggestions, SuggestedChapter, SuggestionOutcome};
