//! Mock LLM backend for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::*;

/// Mock backend for testing.
///
/// Serves a fixed response, or a scripted sequence of responses when the
/// test drives several oracle calls.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    response_content: String,
    scripted: Mutex<VecDeque<String>>,
    call_count: AtomicU32,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            response_content: "Mock response".to_string(),
            scripted: Mutex::new(VecDeque::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the fixed response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response_content = content.into();
        self
    }

    /// Queue a response served once, before the fixed response.
    pub fn with_scripted_response(self, content: impl Into<String>) -> Self {
        self.scripted
            .lock()
            .expect("script queue poisoned")
            .push_back(content.into());
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }

        let content = self
            .scripted
            .lock()
            .expect("script queue poisoned")
            .pop_front()
            .unwrap_or_else(|| self.response_content.clone());

        let prompt_tokens = request.prompt.len() as u32 / 4;
        let completion_tokens = content.len() as u32 / 4;

        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockBackend::new("test-model").with_response("Hello, world!");

        assert!(backend.is_available().await);
        assert_eq!(backend.call_count(), 0);

        let response = backend
            .complete(CompletionRequest::new("Hi"))
            .await
            .unwrap();

        assert_eq!(response.content, "Hello, world!");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let backend = MockBackend::new("test-model").with_available(false);

        assert!(!backend.is_available().await);

        let result = backend.complete(CompletionRequest::new("Hi")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scripted_responses_serve_in_order() {
        let backend = MockBackend::new("test-model")
            .with_scripted_response("first")
            .with_scripted_response("second")
            .with_response("steady state");

        let a = backend.complete(CompletionRequest::new("1")).await.unwrap();
        let b = backend.complete(CompletionRequest::new("2")).await.unwrap();
        let c = backend.complete(CompletionRequest::new("3")).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert_eq!(c.content, "steady state");
        assert_eq!(backend.call_count(), 3);
    }
}
