//! Textbook Catalog Access and Chapter Outline Assembly
//!
//! This crate covers the catalog side of prerequisite scaffolding: fetching
//! book lists and page attributes from the static textbook API, assembling
//! flat attribute records into chapter/topic/subtopic outlines, resolving
//! subject names that change between classes, and normalizing chapter
//! records that arrive in heterogeneous shapes.
//!
//! # Key Components
//!
//! - [`CatalogSource`]: Trait over catalog transports, with [`HttpCatalog`]
//!   for the hosted API and [`StaticCatalog`] for fixtures
//! - [`build_outline`]: Dense chapter numbering plus dotted-prefix topic
//!   and subtopic attachment
//! - [`SubjectRegistry`]: Cross-year subject alias resolution
//!   ("Mathematics" in class 10, "Maths" in class 9)
//! - [`normalize_chapter`]: Canonicalizes raw chapter records; tolerant of
//!   everything except a missing number or name

pub mod catalog;
pub mod error;
pub mod normalize;
pub mod outline;
pub mod subjects;
pub mod types;

// Re-export main types
pub use catalog::{
    class_outline, find_book, subject_outline, CatalogConfig, CatalogSource, HttpCatalog,
    StaticCatalog,
};
pub use error::SyllabusError;
pub use normalize::{normalize_chapter, normalize_subject_outline};
pub use outline::{build_outline, chapter_index, numeric_prefix, parent_prefix};
pub use subjects::{SubjectGroup, SubjectRegistry};
pub use types::{
    AttributeKind, Chapter, ClassLevel, PageAttribute, SubjectOutline, Subtopic, Textbook, Topic,
};
