//! One teacher-facing walk from target class to prerequisite paper.
//!
//! The session strings the steps together and owns their shared
//! handles. Every step round-trips through the blob store, so a session
//! can be dropped and resumed from persisted state at any point:
//!
//! 1. [`target_catalog`](PaperSession::target_catalog) persists the
//!    target-class catalog
//! 2. [`seed_selection`](PaperSession::seed_selection) records the
//!    chapters the paper is for
//! 3. [`suggest_level`](PaperSession::suggest_level) /
//!    [`confirm_level`](PaperSession::confirm_level) walk one year back
//!    per level, as many times as the depth budget allows
//! 4. [`finish`](PaperSession::finish) assembles the tree,
//!    [`generate_paper`](PaperSession::generate_paper) turns it into
//!    questions

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use scaffold_agent::{AuditLog, LlmBackend, QuestionCounts};
use syllabus::{
    class_outline, normalize_subject_outline, CatalogSource, ClassLevel, HttpCatalog,
    SubjectOutline,
};

use crate::config::ScaffoldConfig;
use crate::error::ScaffoldError;
use crate::fetch::PreviousYearFetcher;
use crate::merge::{Confirmation, SelectionMerger};
use crate::paper::{PaperGenerator, QuestionPaper};
use crate::store::{read_as, write_as, BlobKey, BlobStore, FileBlobStore};
use crate::suggest::PrerequisiteSuggestionStep;
use crate::tree::{PrerequisiteTree, PrerequisiteTreeBuilder};
use crate::types::{RenderItem, SelectedStructure};

/// A prerequisite-resolution session for one question paper.
pub struct PaperSession {
    catalog: Arc<dyn CatalogSource>,
    store: Arc<dyn BlobStore>,
    config: ScaffoldConfig,
    target: ClassLevel,
    subjects: Vec<String>,
    fetcher: PreviousYearFetcher,
    suggester: PrerequisiteSuggestionStep,
    paper: PaperGenerator,
}

impl PaperSession {
    /// Create a session over explicit catalog, oracle and store handles.
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        backend: Arc<dyn LlmBackend>,
        store: Arc<dyn BlobStore>,
        config: ScaffoldConfig,
        target: ClassLevel,
        subjects: Vec<String>,
    ) -> Self {
        let oracle_timeout = Duration::from_millis(config.oracle.timeout_ms);
        let fetcher = PreviousYearFetcher::new(catalog.clone(), store.clone());
        let suggester = PrerequisiteSuggestionStep::new(backend.clone(), store.clone())
            .with_timeout(oracle_timeout)
            .with_sampling(config.oracle.temperature, config.oracle.max_tokens);
        let paper = PaperGenerator::new(backend, store.clone()).with_timeout(oracle_timeout);

        Self {
            catalog,
            store,
            config,
            target,
            subjects,
            fetcher,
            suggester,
            paper,
        }
    }

    /// Create a session wired to the configured HTTP catalog, oracle
    /// endpoint and on-disk blob store.
    pub async fn from_config(
        config: ScaffoldConfig,
        target: ClassLevel,
        subjects: Vec<String>,
    ) -> Result<Self, ScaffoldError> {
        let catalog: Arc<dyn CatalogSource> = Arc::new(HttpCatalog::new(&config.catalog));
        let backend: Arc<dyn LlmBackend> = Arc::new(config.oracle.backend());
        let store: Arc<dyn BlobStore> =
            Arc::new(FileBlobStore::new(&config.storage.data_dir).await?);
        Ok(Self::new(catalog, backend, store, config, target, subjects))
    }

    pub fn target(&self) -> ClassLevel {
        self.target
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// The audit trail of oracle calls made so far.
    pub fn audit(&self) -> &AuditLog {
        self.suggester.audit()
    }

    /// Fetch and persist the target-class catalog the teacher picks from.
    pub async fn target_catalog(&self) -> Result<SubjectOutline, ScaffoldError> {
        let outline = class_outline(
            self.catalog.as_ref(),
            &self.config.walk.board,
            self.target,
            &self.subjects,
        )
        .await;

        write_as(self.store.as_ref(), &BlobKey::AllChapters, &outline).await?;
        info!(
            class = %self.target,
            subjects = outline.len(),
            "Persisted target-class catalog"
        );
        Ok(outline)
    }

    /// Record the target-class chapters the paper is for.
    ///
    /// Picks are `(subject, chapter name)` pairs resolved against the
    /// persisted catalog; a pick naming an unknown chapter is skipped.
    /// Seeding replaces any structure left by an earlier session.
    pub async fn seed_selection(
        &self,
        picks: &[(String, String)],
    ) -> Result<SelectedStructure, ScaffoldError> {
        let Some(raw) = self.store.read(&BlobKey::AllChapters).await? else {
            return Err(ScaffoldError::MissingBlob(BlobKey::AllChapters));
        };
        let outline = normalize_subject_outline(&raw)?;

        let mut structure = SelectedStructure::new();
        for (subject, chapter_name) in picks {
            let Some(chapter) = outline
                .get(subject)
                .and_then(|chapters| chapters.iter().find(|c| &c.name == chapter_name))
            else {
                warn!(
                    subject = %subject,
                    chapter = %chapter_name,
                    "Seed pick not in target catalog, skipping"
                );
                continue;
            };
            structure.push_unique(self.target, subject, chapter.clone());
        }

        write_as(self.store.as_ref(), &BlobKey::SelectedStructure, &structure).await?;
        info!(
            class = %self.target,
            chapters = structure.len(),
            "Seeded selection"
        );
        Ok(structure)
    }

    /// Run the suggestion oracle for one walk level (1-based).
    ///
    /// Level `N` analyzes the bucket confirmed at level `N - 1` (the
    /// seeds for level 1) against the catalog `N` years below the
    /// target. Past the bottom of the class range the batch is empty
    /// but still persisted, so the walk ends cleanly.
    pub async fn suggest_level(&self, level: u32) -> Result<Vec<RenderItem>, ScaffoldError> {
        let structure = self.selected_structure().await?;
        let analyzed = u8::try_from(level.saturating_sub(1))
            .ok()
            .and_then(|back| self.target.back(back));
        let selections = match analyzed {
            Some(class) => structure.bucket(class).cloned().unwrap_or_default(),
            None => SubjectOutline::new(),
        };

        let previous_class = u8::try_from(level).ok().and_then(|back| self.target.back(back));
        let previous = match previous_class {
            Some(class) => {
                self.fetcher
                    .fetch(
                        &self.config.walk.board,
                        self.target,
                        class,
                        &self.subjects,
                        level,
                        self.config.walk.max_depth,
                    )
                    .await?
            }
            None => {
                debug!(level, "Walked past the lowest class, nothing to suggest from");
                SubjectOutline::new()
            }
        };

        self.suggester.suggest(level, &selections, &previous).await
    }

    /// Merge the teacher's confirmation of one level into the structure.
    ///
    /// Requires the render batch persisted by
    /// [`suggest_level`](PaperSession::suggest_level) for the same level.
    pub async fn confirm_level(
        &self,
        level: u32,
        confirmation: &Confirmation,
    ) -> Result<SelectedStructure, ScaffoldError> {
        let items: Vec<RenderItem> = read_as(self.store.as_ref(), &BlobKey::RenderItems(level))
            .await?
            .ok_or(ScaffoldError::MissingBatch(level))?;

        let previous = match self.store.read(&BlobKey::PreviousYearDepth(level)).await? {
            Some(raw) => normalize_subject_outline(&raw)?,
            None => SubjectOutline::new(),
        };

        let mut structure = self.selected_structure().await?;
        let Some(bucket_class) = u8::try_from(level).ok().and_then(|b| self.target.back(b))
        else {
            warn!(level, "No class bucket this far down, nothing to confirm");
            return Ok(structure);
        };

        SelectionMerger::merge(bucket_class, confirmation, &items, &previous, &mut structure);

        write_as(self.store.as_ref(), &BlobKey::SelectedStructure, &structure).await?;
        info!(
            level,
            class = %bucket_class,
            total = structure.len(),
            "Merged confirmed selections"
        );
        Ok(structure)
    }

    /// Assemble and persist the prerequisite tree from everything
    /// confirmed so far.
    pub async fn finish(&self) -> Result<PrerequisiteTree, ScaffoldError> {
        let structure = self.selected_structure().await?;
        let tree = PrerequisiteTreeBuilder::build(&structure);

        write_as(self.store.as_ref(), &BlobKey::PrerequisiteTree, &tree).await?;
        info!(root = ?tree.root_class(), "Assembled prerequisite tree");
        Ok(tree)
    }

    /// Generate a question paper from the persisted tree.
    pub async fn generate_paper(
        &self,
        counts: &QuestionCounts,
    ) -> Result<QuestionPaper, ScaffoldError> {
        let tree: PrerequisiteTree = read_as(self.store.as_ref(), &BlobKey::PrerequisiteTree)
            .await?
            .ok_or(ScaffoldError::MissingBlob(BlobKey::PrerequisiteTree))?;

        self.paper
            .generate(self.target, &self.subjects, &tree, counts)
            .await
    }

    /// The persisted cross-year structure, empty if nothing is seeded yet.
    pub async fn selected_structure(&self) -> Result<SelectedStructure, ScaffoldError> {
        match self.store.read(&BlobKey::SelectedStructure).await? {
            Some(raw) => Ok(SelectedStructure::from_value(&raw)?),
            None => Ok(SelectedStructure::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;
    use scaffold_agent::MockBackend;
    use syllabus::{PageAttribute, StaticCatalog, Textbook};

    fn catalog_with_maths_10() -> StaticCatalog {
        StaticCatalog::new().with_book(
            Textbook::new("book-10", "CBSE", ClassLevel::new(10), "Mathematics"),
            vec![
                PageAttribute::chapter("Real Numbers", 1.0),
                PageAttribute::chapter("Quadratic Equations", 2.0),
            ],
        )
    }

    fn session(catalog: StaticCatalog) -> (PaperSession, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryBlobStore::default());
        let session = PaperSession::new(
            Arc::new(catalog),
            Arc::new(MockBackend::default()),
            store.clone(),
            ScaffoldConfig::default(),
            ClassLevel::new(10),
            vec!["Mathematics".to_string()],
        );
        (session, store)
    }

    #[tokio::test]
    async fn test_target_catalog_persists_outline() {
        let (session, store) = session(catalog_with_maths_10());

        let outline = session.target_catalog().await.unwrap();
        assert_eq!(outline["Mathematics"].len(), 2);

        let raw = store.read(&BlobKey::AllChapters).await.unwrap().unwrap();
        assert_eq!(raw["Mathematics"][1]["chapter"], "Quadratic Equations");
    }

    #[tokio::test]
    async fn test_seed_selection_skips_unknown_picks() {
        let (session, _store) = session(catalog_with_maths_10());
        session.target_catalog().await.unwrap();

        let structure = session
            .seed_selection(&[
                ("Mathematics".to_string(), "Quadratic Equations".to_string()),
                ("Mathematics".to_string(), "Linear Programming".to_string()),
                ("History".to_string(), "Quadratic Equations".to_string()),
            ])
            .await
            .unwrap();

        let bucket = structure.bucket(ClassLevel::new(10)).unwrap();
        assert_eq!(bucket["Mathematics"].len(), 1);
        assert_eq!(bucket["Mathematics"][0].name, "Quadratic Equations");
    }

    #[tokio::test]
    async fn test_seed_selection_requires_catalog() {
        let (session, _store) = session(catalog_with_maths_10());

        let err = session
            .seed_selection(&[("Mathematics".to_string(), "Real Numbers".to_string())])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::MissingBlob(BlobKey::AllChapters)
        ));
    }

    #[tokio::test]
    async fn test_confirm_level_requires_render_batch() {
        let (session, _store) = session(catalog_with_maths_10());

        let err = session
            .confirm_level(1, &Confirmation::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::MissingBatch(1)));
    }
}
