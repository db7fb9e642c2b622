//! Prerequisite suggestion.
//!
//! One pass walks every `(subject, chapter)` pair selected at the level
//! above, asks the oracle which previous-year chapters that chapter leans
//! on, and mints render items for the teacher to confirm. The oracle is
//! only trusted for the *edge* (which number, why); chapter identity and
//! topics always come from the supplied catalog. Per-pair failures are
//! logged and skipped so one bad call never sinks the batch.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use scaffold_agent::{
    parse_suggestions, AuditEntry, AuditLog, CallOutcome, CompletionRequest, LlmBackend,
    PromptAssembler, SuggestionOutcome,
};
use syllabus::SubjectOutline;

use crate::error::ScaffoldError;
use crate::store::{write_as, BlobKey, BlobStore};
use crate::types::RenderItem;

const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs one suggestion pass against the oracle.
pub struct PrerequisiteSuggestionStep {
    backend: Arc<dyn LlmBackend>,
    store: Arc<dyn BlobStore>,
    audit: AuditLog,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl PrerequisiteSuggestionStep {
    /// Create a step with default timeout and sampling.
    pub fn new(backend: Arc<dyn LlmBackend>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            backend,
            store,
            audit: AuditLog::new(),
            timeout: DEFAULT_ORACLE_TIMEOUT,
            temperature: 0.2,
            max_tokens: 2048,
        }
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set sampling parameters.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// The audit trail of oracle calls made by this step.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Suggest prerequisites for every selected `(subject, chapter)` pair.
    ///
    /// The resulting batch is persisted under
    /// `prereq_render_items_level_<level>`, replacing any earlier batch
    /// there. An all-empty pass is a normal empty batch, not an error.
    pub async fn suggest(
        &self,
        level: u32,
        selections: &SubjectOutline,
        previous_year: &SubjectOutline,
    ) -> Result<Vec<RenderItem>, ScaffoldError> {
        let mut pairs = BTreeSet::new();
        for (subject, chapters) in selections {
            for chapter in chapters {
                pairs.insert((subject.clone(), chapter.name.clone()));
            }
        }

        let mut items: Vec<RenderItem> = Vec::new();
        for (subject, chapter_name) in &pairs {
            let Some(prev_chapters) = previous_year.get(subject) else {
                debug!(subject = %subject, "No previous-year chapters for subject, skipping pair");
                continue;
            };
            if prev_chapters.is_empty() {
                debug!(subject = %subject, "Previous-year subject is empty, skipping pair");
                continue;
            }

            let prompt = PromptAssembler::prerequisite_prompt(subject, chapter_name, prev_chapters);
            let request = CompletionRequest::new(prompt)
                .with_temperature(self.temperature)
                .with_max_tokens(self.max_tokens)
                .with_json_output();

            let started = Instant::now();
            let completion = tokio::time::timeout(self.timeout, self.backend.complete(request)).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match completion {
                Err(_) => {
                    warn!(subject = %subject, chapter = %chapter_name, "Oracle call timed out");
                    CallOutcome::TimedOut
                }
                Ok(Err(e)) => {
                    warn!(subject = %subject, chapter = %chapter_name, error = %e, "Oracle call failed");
                    CallOutcome::Failed(e.to_string())
                }
                Ok(Ok(completion)) => {
                    match parse_suggestions(&completion.content, subject) {
                        SuggestionOutcome::Malformed { raw } => {
                            warn!(
                                subject = %subject,
                                chapter = %chapter_name,
                                raw_len = raw.len(),
                                "Oracle output had no recoverable JSON"
                            );
                            CallOutcome::Malformed
                        }
                        SuggestionOutcome::Parsed(suggestions) => {
                            let before = items.len();
                            for suggestion in suggestions {
                                let Some(number) = suggestion.number else {
                                    debug!(subject = %subject, "Suggestion carries no chapter number, dropping");
                                    continue;
                                };
                                let Some(catalog_chapter) =
                                    prev_chapters.iter().find(|c| c.number == number)
                                else {
                                    debug!(
                                        subject = %subject,
                                        number,
                                        claimed = %suggestion.chapter,
                                        "Suggested number not in previous-year catalog, dropping"
                                    );
                                    continue;
                                };

                                let prerequisite_for = suggestion
                                    .prerequisite_for
                                    .filter(|f| !f.is_empty())
                                    .unwrap_or_else(|| chapter_name.clone());

                                items.push(RenderItem::from_catalog(
                                    subject,
                                    catalog_chapter,
                                    suggestion.reason,
                                    prerequisite_for,
                                ));
                            }
                            let accepted = items.len() - before;
                            debug!(
                                subject = %subject,
                                chapter = %chapter_name,
                                accepted,
                                "Accepted oracle suggestions"
                            );
                            CallOutcome::Suggested(accepted)
                        }
                    }
                }
            };

            self.audit
                .record(AuditEntry::new(
                    subject,
                    chapter_name,
                    self.backend.id(),
                    duration_ms,
                    outcome,
                ))
                .await;
        }

        write_as(self.store.as_ref(), &BlobKey::RenderItems(level), &items).await?;
        info!(level, items = items.len(), "Persisted render-item batch");

        Ok(items)
    }
}
