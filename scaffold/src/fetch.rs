//! Previous-year catalog fetching.
//!
//! One fetch resolves each subject's name for the class being walked
//! (the class 10 teacher asks for "Mathematics"; the class 9 book is
//! "Maths"), assembles that class's chapter outlines, and caches the
//! result under `previous_year_depth_<N>`. Results are keyed by the
//! starting-class subject names so every later stage speaks one naming
//! frame.

use std::sync::Arc;

use tracing::{debug, info, warn};

use syllabus::{
    normalize_subject_outline, subject_outline, CatalogSource, ClassLevel, SubjectOutline,
    SubjectRegistry,
};

use crate::error::ScaffoldError;
use crate::store::{BlobKey, BlobStore};

/// Fetches and caches chapter outlines for earlier classes.
pub struct PreviousYearFetcher {
    catalog: Arc<dyn CatalogSource>,
    store: Arc<dyn BlobStore>,
    subjects: SubjectRegistry,
}

impl PreviousYearFetcher {
    /// Create a fetcher with the stock subject alias table.
    pub fn new(catalog: Arc<dyn CatalogSource>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            catalog,
            store,
            subjects: SubjectRegistry::default(),
        }
    }

    /// Replace the subject alias registry.
    pub fn with_registry(mut self, subjects: SubjectRegistry) -> Self {
        self.subjects = subjects;
        self
    }

    /// Fetch the catalog for the class `depth` years below the start.
    ///
    /// `subjects` carries the starting-class names; results come back under
    /// those same names. A depth beyond `max_depth` is an empty map, not an
    /// error. A subject whose book is missing or whose fetch fails is
    /// omitted; the call never aborts as a whole.
    pub async fn fetch(
        &self,
        board: &str,
        starting_class: ClassLevel,
        current_class: ClassLevel,
        subjects: &[String],
        depth: u32,
        max_depth: u32,
    ) -> Result<SubjectOutline, ScaffoldError> {
        if depth > max_depth {
            debug!(depth, max_depth, "Depth beyond walk limit, returning empty catalog");
            return Ok(SubjectOutline::new());
        }

        let key = BlobKey::PreviousYearDepth(depth);
        if let Some(cached) = self.store.read(&key).await? {
            let outline = normalize_subject_outline(&cached)?;
            debug!(depth, subjects = outline.len(), "Serving previous-year catalog from cache");
            return Ok(outline);
        }

        debug!(
            start = %starting_class,
            class = %current_class,
            depth,
            "Fetching previous-year catalog"
        );

        let mut outline = SubjectOutline::new();
        for subject in subjects {
            let resolved = self.subjects.resolve(subject, current_class);
            match subject_outline(self.catalog.as_ref(), board, current_class, &resolved).await {
                Ok(Some(chapters)) => {
                    debug!(
                        subject = %subject,
                        resolved = %resolved,
                        chapters = chapters.len(),
                        "Fetched subject outline"
                    );
                    outline.insert(subject.clone(), chapters);
                }
                Ok(None) => {
                    warn!(
                        subject = %subject,
                        resolved = %resolved,
                        class = %current_class,
                        "No textbook in catalog, skipping subject"
                    );
                }
                Err(e) => {
                    warn!(
                        subject = %subject,
                        class = %current_class,
                        error = %e,
                        "Catalog fetch failed, skipping subject"
                    );
                }
            }
        }

        let value = serde_json::to_value(&outline)?;
        self.store.write(&key, &value).await?;
        info!(
            class = %current_class,
            depth,
            subjects = outline.len(),
            "Cached previous-year catalog"
        );

        Ok(outline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;
    use serde_json::json;
    use syllabus::{PageAttribute, StaticCatalog, Textbook};

    fn class_9_maths_catalog() -> StaticCatalog {
        StaticCatalog::new().with_book(
            Textbook::new("bk-9m", "CBSE", ClassLevel::new(9), "Maths"),
            vec![
                PageAttribute::chapter("Number Systems", 1.0),
                PageAttribute::chapter("Polynomials", 2.0),
            ],
        )
    }

    #[tokio::test]
    async fn test_depth_guard_returns_empty() {
        let fetcher = PreviousYearFetcher::new(
            Arc::new(class_9_maths_catalog()),
            Arc::new(MemoryBlobStore::new()),
        );

        let outline = fetcher
            .fetch(
                "CBSE",
                ClassLevel::new(10),
                ClassLevel::new(6),
                &["Mathematics".to_string()],
                4,
                3,
            )
            .await
            .unwrap();

        assert!(outline.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_resolves_alias_but_keys_by_starting_name() {
        let store = Arc::new(MemoryBlobStore::new());
        let fetcher = PreviousYearFetcher::new(Arc::new(class_9_maths_catalog()), store.clone());

        // The class 10 subject is "Mathematics"; the class 9 book is "Maths".
        let outline = fetcher
            .fetch(
                "CBSE",
                ClassLevel::new(10),
                ClassLevel::new(9),
                &["Mathematics".to_string()],
                1,
                3,
            )
            .await
            .unwrap();

        assert_eq!(outline["Mathematics"].len(), 2);
        assert_eq!(outline["Mathematics"][1].name, "Polynomials");

        let cached = store
            .read(&BlobKey::PreviousYearDepth(1))
            .await
            .unwrap()
            .unwrap();
        assert!(cached.get("Mathematics").is_some());
    }

    #[tokio::test]
    async fn test_fetch_skips_missing_subject() {
        let fetcher = PreviousYearFetcher::new(
            Arc::new(class_9_maths_catalog()),
            Arc::new(MemoryBlobStore::new()),
        );

        let outline = fetcher
            .fetch(
                "CBSE",
                ClassLevel::new(10),
                ClassLevel::new(9),
                &["Mathematics".to_string(), "Sanskrit".to_string()],
                1,
                3,
            )
            .await
            .unwrap();

        assert!(outline.contains_key("Mathematics"));
        assert!(!outline.contains_key("Sanskrit"));
    }

    #[tokio::test]
    async fn test_fetch_prefers_cached_blob() {
        let store = Arc::new(MemoryBlobStore::new());
        store
            .write(
                &BlobKey::PreviousYearDepth(1),
                &json!({"Mathematics": [{"number": 1, "chapter": "Cached Chapter"}]}),
            )
            .await
            .unwrap();

        // Empty catalog: a real fetch would find nothing.
        let fetcher = PreviousYearFetcher::new(Arc::new(StaticCatalog::new()), store);

        let outline = fetcher
            .fetch(
                "CBSE",
                ClassLevel::new(10),
                ClassLevel::new(9),
                &["Mathematics".to_string()],
                1,
                3,
            )
            .await
            .unwrap();

        assert_eq!(outline["Mathematics"][0].name, "Cached Chapter");
    }
}
