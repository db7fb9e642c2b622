//! Core types for the prerequisite walk.
//!
//! `RenderItem` is the unit the teacher confirms: one suggested edge,
//! minted with a fresh id per suggestion pass. `SelectedStructure` is the
//! cross-year accumulation of confirmed chapters, keyed
//! `class_<N> -> subject -> [Chapter]`. `EdgeKey` is the normalized key
//! the reason back-fill matches on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use syllabus::{
    normalize_subject_outline, Chapter, ClassLevel, SubjectOutline, SyllabusError, Topic,
};

/// One suggested prerequisite edge, ready for teacher review.
///
/// Identity (`number`, `chapter`, `topics`) always comes from the catalog;
/// `reason` and `for` come from the oracle. A fresh `id` is minted every
/// suggestion pass, so stale confirmations cannot resolve against a newer
/// batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderItem {
    pub id: Uuid,
    pub subject: String,
    pub number: u32,
    #[serde(rename = "chapter")]
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub reason: String,
    /// The later-year chapter this one supports (never empty)
    #[serde(rename = "for")]
    pub prerequisite_for: String,
}

impl RenderItem {
    /// Mint a render item from a catalog chapter.
    pub fn from_catalog(
        subject: impl Into<String>,
        chapter: &Chapter,
        reason: impl Into<String>,
        prerequisite_for: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            number: chapter.number,
            name: chapter.name.clone(),
            topics: chapter.topics.clone(),
            reason: reason.into(),
            prerequisite_for: prerequisite_for.into(),
        }
    }

    /// The chapter this item merges as, annotations stamped.
    pub fn to_chapter(&self) -> Chapter {
        Chapter {
            number: self.number,
            name: self.name.clone(),
            topics: self.topics.clone(),
            reason: (!self.reason.is_empty()).then(|| self.reason.clone()),
            prerequisite_for: Some(self.prerequisite_for.clone()),
        }
    }
}

/// Normalized identity of one prerequisite edge.
///
/// Lowercased and trimmed so the back-fill matches entries regardless of
/// the casing they were persisted with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub subject: String,
    pub chapter: String,
    pub prerequisite_for: String,
}

impl EdgeKey {
    /// Build the key from raw field values.
    pub fn new(subject: &str, chapter: &str, prerequisite_for: &str) -> Self {
        Self {
            subject: subject.trim().to_lowercase(),
            chapter: chapter.trim().to_lowercase(),
            prerequisite_for: prerequisite_for.trim().to_lowercase(),
        }
    }
}

/// Confirmed chapters accumulated across the walk.
///
/// Buckets are ordered by class so persisted output is deterministic.
/// The selection merger is the sole writer; within one (class, subject)
/// bucket no two explicit edges share `(chapter, for)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectedStructure {
    buckets: BTreeMap<ClassLevel, SubjectOutline>,
}

impl SelectedStructure {
    /// Create an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a persisted structure, normalizing every chapter record.
    pub fn from_value(raw: &Value) -> Result<Self, SyllabusError> {
        let obj = raw.as_object().ok_or_else(|| {
            SyllabusError::MalformedChapter("selected structure is not an object".to_string())
        })?;

        let mut buckets = BTreeMap::new();
        for (class_key, outline) in obj {
            let class: ClassLevel = class_key.parse()?;
            buckets.insert(class, normalize_subject_outline(outline)?);
        }
        Ok(Self { buckets })
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Class levels present, highest first.
    pub fn levels_desc(&self) -> Vec<ClassLevel> {
        self.buckets.keys().rev().copied().collect()
    }

    /// The subject map for one class, if any chapter was confirmed there.
    pub fn bucket(&self, class: ClassLevel) -> Option<&SubjectOutline> {
        self.buckets.get(&class)
    }

    /// The subject map for one class, created on first use.
    pub fn bucket_mut(&mut self, class: ClassLevel) -> &mut SubjectOutline {
        self.buckets.entry(class).or_default()
    }

    /// Whether the bucket already holds an entry with this `(chapter, for)`.
    pub fn contains_edge(&self, class: ClassLevel, subject: &str, chapter: &Chapter) -> bool {
        self.buckets
            .get(&class)
            .and_then(|bucket| bucket.get(subject))
            .map(|entries| {
                entries.iter().any(|existing| {
                    existing.name == chapter.name
                        && existing.prerequisite_for == chapter.prerequisite_for
                })
            })
            .unwrap_or(false)
    }

    /// Append unless an entry with equal `(chapter, for)` already exists.
    ///
    /// Returns whether the chapter was added.
    pub fn push_unique(&mut self, class: ClassLevel, subject: &str, chapter: Chapter) -> bool {
        if self.contains_edge(class, subject, &chapter) {
            return false;
        }
        self.push(class, subject, chapter);
        true
    }

    /// Append unconditionally (the topic-sweep channel).
    pub fn push(&mut self, class: ClassLevel, subject: &str, chapter: Chapter) {
        self.bucket_mut(class)
            .entry(subject.to_string())
            .or_default()
            .push(chapter);
    }

    /// Every chapter in every bucket, with its subject, mutably.
    pub fn chapters_mut(&mut self) -> impl Iterator<Item = (&String, &mut Chapter)> {
        self.buckets.values_mut().flat_map(|bucket| {
            bucket.iter_mut().flat_map(|(subject, chapters)| {
                chapters.iter_mut().map(move |chapter| (subject, chapter))
            })
        })
    }

    /// Total chapter count across all buckets.
    pub fn len(&self) -> usize {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.values())
            .map(Vec::len)
            .sum()
    }
}
