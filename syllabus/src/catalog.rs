//! Textbook catalog access.
//!
//! The catalog is a static JSON API: one book-list document and one
//! page-attribute document per book. `CatalogSource` abstracts the
//! transport so the walk can run against the hosted API (`HttpCatalog`)
//! or fixtures (`StaticCatalog`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::SyllabusError;
use crate::outline::build_outline;
use crate::types::{Chapter, ClassLevel, PageAttribute, SubjectOutline, Textbook};

/// Configuration for the hosted catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the static textbook API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://staticapis.pragament.com/textbooks".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Read access to the textbook catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The full book list.
    async fn textbooks(&self) -> Result<Vec<Textbook>, SyllabusError>;

    /// Flat page-attribute records for one book.
    async fn page_attributes(&self, book_id: &str) -> Result<Vec<PageAttribute>, SyllabusError>;
}

/// Find the book for a board/class/subject, if the catalog has one.
pub async fn find_book(
    source: &dyn CatalogSource,
    board: &str,
    class: ClassLevel,
    subject: &str,
) -> Result<Option<Textbook>, SyllabusError> {
    let books = source.textbooks().await?;
    Ok(books
        .into_iter()
        .find(|book| book.matches(board, class, subject)))
}

/// Assemble the chapter outline for one subject in one class.
///
/// `None` when the catalog has no matching book.
pub async fn subject_outline(
    source: &dyn CatalogSource,
    board: &str,
    class: ClassLevel,
    subject: &str,
) -> Result<Option<Vec<Chapter>>, SyllabusError> {
    let Some(book) = find_book(source, board, class, subject).await? else {
        return Ok(None);
    };
    let attributes = source.page_attributes(&book.id).await?;
    Ok(Some(build_outline(&attributes)))
}

/// Assemble outlines for several subjects of one class.
///
/// A subject with no book, or whose fetch fails, is omitted rather than
/// failing the rest.
pub async fn class_outline(
    source: &dyn CatalogSource,
    board: &str,
    class: ClassLevel,
    subjects: &[String],
) -> SubjectOutline {
    let mut outline = SubjectOutline::new();
    for subject in subjects {
        match subject_outline(source, board, class, subject).await {
            Ok(Some(chapters)) => {
                outline.insert(subject.clone(), chapters);
            }
            Ok(None) => {
                warn!(%subject, class = %class, "No textbook in catalog, skipping subject");
            }
            Err(e) => {
                warn!(%subject, class = %class, error = %e, "Catalog fetch failed, skipping subject");
            }
        }
    }
    outline
}

/// Catalog client for the hosted static API.
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    books: RwLock<Option<Vec<Textbook>>>,
}

impl HttpCatalog {
    /// Create a client for the configured catalog.
    pub fn new(config: &CatalogConfig) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            books: RwLock::new(None),
        }
    }

    fn allbooks_url(&self) -> String {
        format!("{}/allbooks.json", self.base_url)
    }

    fn attributes_url(&self, book_id: &str) -> String {
        format!("{}/page_attributes/{}.json", self.base_url, book_id)
    }

    async fn get_json(&self, url: &str) -> Result<Value, SyllabusError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SyllabusError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn textbooks(&self) -> Result<Vec<Textbook>, SyllabusError> {
        if let Some(books) = self.books.read().await.as_ref() {
            debug!(count = books.len(), "Serving book list from cache");
            return Ok(books.clone());
        }

        let url = self.allbooks_url();
        let body = self.get_json(&url).await?;
        let records = body
            .get("data")
            .and_then(|data| data.get("getBooks"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut books = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<Textbook>(record) {
                Ok(book) => books.push(book),
                Err(e) => debug!(error = %e, "Skipping malformed book record"),
            }
        }

        debug!(count = books.len(), "Fetched catalog book list");
        *self.books.write().await = Some(books.clone());
        Ok(books)
    }

    async fn page_attributes(&self, book_id: &str) -> Result<Vec<PageAttribute>, SyllabusError> {
        let url = self.attributes_url(book_id);
        let body = self.get_json(&url).await?;
        let records = body.as_array().cloned().unwrap_or_default();

        let mut attributes = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<PageAttribute>(record) {
                Ok(attribute) => attributes.push(attribute),
                Err(e) => debug!(error = %e, book_id, "Skipping malformed page attribute"),
            }
        }
        Ok(attributes)
    }
}

/// In-memory catalog for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    books: Vec<Textbook>,
    attributes: HashMap<String, Vec<PageAttribute>>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a book together with its page attributes.
    pub fn with_book(mut self, book: Textbook, attributes: Vec<PageAttribute>) -> Self {
        self.attributes.insert(book.id.clone(), attributes);
        self.books.push(book);
        self
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn textbooks(&self) -> Result<Vec<Textbook>, SyllabusError> {
        Ok(self.books.clone())
    }

    async fn page_attributes(&self, book_id: &str) -> Result<Vec<PageAttribute>, SyllabusError> {
        self.attributes.get(book_id).cloned().ok_or_else(|| {
            SyllabusError::Status {
                status: 404,
                url: format!("static://page_attributes/{}", book_id),
            }
        })
    }
}
