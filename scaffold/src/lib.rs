//! Scaffold - recursive prerequisite resolution for question papers
//!
//! Walks backward through the textbook catalog one class year at a
//! time, building a prerequisite tree for the chapters a teacher wants
//! to examine:
//!
//! - **Catalog walk**: previous-year chapter outlines, cached per depth
//! - **Oracle suggestions**: an LLM proposes prerequisite chapters,
//!   validated against the real catalog before anyone sees them
//! - **Teacher confirmation**: confirmed suggestions merge into a
//!   persistent cross-year structure, loosely deduplicated by
//!   `(chapter, for)` edge
//! - **Tree assembly**: the flat structure becomes a loop-safe
//!   multi-level tree, flattened into the paper-generation prompt
//!
//! # Walk Shape
//!
//! ```text
//! class_10 (target)   seed_selection
//!     │
//!     ▼
//! class_9   suggest_level(1) ──► confirm_level(1)
//!     │
//!     ▼
//! class_8   suggest_level(2) ──► confirm_level(2)
//!     │
//!     ▼
//!  finish ──► PrerequisiteTree ──► generate_paper
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod paper;
pub mod session;
pub mod store;
pub mod suggest;
pub mod tree;
pub mod types;

// Re-export main types
pub use config::{OracleConfig, ScaffoldConfig, StorageConfig, WalkConfig};
pub use error::ScaffoldError;
pub use fetch::PreviousYearFetcher;
pub use merge::{Confirmation, SelectionMerger};
pub use paper::{PaperGenerator, Question, QuestionPaper};
pub use session::PaperSession;
pub use store::{read_as, write_as, BlobKey, BlobStore, FileBlobStore, MemoryBlobStore};
pub use suggest::PrerequisiteSuggestionStep;
pub use tree::{ChapterNode, MinimalNode, MinimalTree, PrerequisiteTree, PrerequisiteTreeBuilder};
pub use types::{EdgeKey, RenderItem, SelectedStructure};
