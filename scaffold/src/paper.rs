//! Question-paper generation from the assembled tree.
//!
//! The flattened tree text goes into the paper prompt, the oracle
//! answers with a JSON paper, and the recovered span is decoded into
//! [`QuestionPaper`]. A paper with no questions is rejected rather than
//! persisted.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scaffold_agent::{
    extract_json_span, CompletionRequest, LlmBackend, LlmError, PromptAssembler, QuestionCounts,
};
use syllabus::ClassLevel;

use crate::error::ScaffoldError;
use crate::store::{write_as, BlobKey, BlobStore};
use crate::tree::PrerequisiteTree;

const DEFAULT_PAPER_TIMEOUT: Duration = Duration::from_secs(120);

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
}

/// A generated paper, in the oracle's answer shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPaper {
    /// Digits-only class label ("10")
    #[serde(rename = "class", default)]
    pub class_label: String,
    #[serde(rename = "subject", default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Turns a prerequisite tree into a multiple-choice paper.
pub struct PaperGenerator {
    backend: Arc<dyn LlmBackend>,
    store: Arc<dyn BlobStore>,
    timeout: Duration,
}

impl PaperGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            backend,
            store,
            timeout: DEFAULT_PAPER_TIMEOUT,
        }
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate and persist a paper for `class` over `subjects`.
    pub async fn generate(
        &self,
        class: ClassLevel,
        subjects: &[String],
        tree: &PrerequisiteTree,
        counts: &QuestionCounts,
    ) -> Result<QuestionPaper, ScaffoldError> {
        let outline = tree.flatten();
        let request = CompletionRequest::new(PromptAssembler::paper_prompt(
            &class.label(),
            subjects,
            &outline,
            counts,
        ))
        .with_system(PromptAssembler::paper_system_prompt(counts))
        .with_json_output();

        let response = tokio::time::timeout(self.timeout, self.backend.complete(request))
            .await
            .map_err(|_| {
                ScaffoldError::Oracle(LlmError::RequestFailed(format!(
                    "paper generation timed out after {:?}",
                    self.timeout
                )))
            })??;

        let Some(span) = extract_json_span(&response.content) else {
            warn!(
                model = %self.backend.id(),
                "Paper response contained no JSON object"
            );
            return Err(ScaffoldError::EmptyPaper);
        };
        let paper: QuestionPaper = serde_json::from_str(span)?;

        if paper.questions.is_empty() {
            warn!(model = %self.backend.id(), "Paper came back without questions");
            return Err(ScaffoldError::EmptyPaper);
        }

        write_as(self.store.as_ref(), &BlobKey::QuestionPaper, &paper).await?;
        info!(
            class = %class,
            questions = paper.questions.len(),
            "Generated question paper"
        );
        Ok(paper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{read_as, MemoryBlobStore};
    use crate::tree::PrerequisiteTreeBuilder;
    use crate::types::SelectedStructure;
    use scaffold_agent::MockBackend;
    use syllabus::Chapter;

    fn seeded_tree() -> PrerequisiteTree {
        let mut structure = SelectedStructure::new();
        structure.push(
            ClassLevel::new(10),
            "Mathematics",
            Chapter::new(4, "Quadratic Equations"),
        );
        PrerequisiteTreeBuilder::build(&structure)
    }

    fn paper_json() -> &'static str {
        r#"{
            "class": "10",
            "subject": ["Mathematics"],
            "questions": [
                {
                    "question": "What is the degree of a quadratic polynomial?",
                    "options": ["1", "2", "3", "4"],
                    "correct_answer": "2"
                },
                {
                    "question": "Which of these is a root of x^2 - 4?",
                    "options": ["1", "2", "3", "5"],
                    "correct_answer": "2"
                }
            ]
        }"#
    }

    #[tokio::test]
    async fn test_generate_recovers_json_from_chatter() {
        let backend = Arc::new(
            MockBackend::new("mock-model")
                .with_response(format!("Here is your paper:\n{}\nGood luck!", paper_json())),
        );
        let store = Arc::new(MemoryBlobStore::default());
        let generator = PaperGenerator::new(backend, store.clone());

        let paper = generator
            .generate(
                ClassLevel::new(10),
                &["Mathematics".to_string()],
                &seeded_tree(),
                &QuestionCounts::default(),
            )
            .await
            .unwrap();

        assert_eq!(paper.class_label, "10");
        assert_eq!(paper.questions.len(), 2);
        assert_eq!(paper.questions[0].correct_answer, "2");

        let persisted: QuestionPaper = read_as(store.as_ref(), &BlobKey::QuestionPaper)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted, paper);
    }

    #[tokio::test]
    async fn test_generate_rejects_paper_without_questions() {
        let backend = Arc::new(
            MockBackend::new("mock-model")
                .with_response(r#"{"class": "10", "subject": [], "questions": []}"#),
        );
        let store = Arc::new(MemoryBlobStore::default());
        let generator = PaperGenerator::new(backend, store.clone());

        let err = generator
            .generate(
                ClassLevel::new(10),
                &["Mathematics".to_string()],
                &seeded_tree(),
                &QuestionCounts::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::EmptyPaper));
        // Nothing gets persisted for a rejected paper.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_generate_rejects_response_without_json() {
        let backend =
            Arc::new(MockBackend::new("mock-model").with_response("I cannot generate that."));
        let store = Arc::new(MemoryBlobStore::default());
        let generator = PaperGenerator::new(backend, store);

        let err = generator
            .generate(
                ClassLevel::new(10),
                &["Mathematics".to_string()],
                &seeded_tree(),
                &QuestionCounts::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::EmptyPaper));
    }
}
