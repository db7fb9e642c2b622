//! Merging confirmed selections into the cross-year structure.
//!
//! Two channels feed one `class_<N>` bucket. Explicit edges resolve
//! confirmed render-item ids back to catalog chapters and stamp the
//! oracle's `for`/`reason` onto them, guarded by the bucket's
//! `(chapter, for)` dedup rule. The topic sweep appends any chapter whose
//! topic or subtopic text the teacher picked, at most once per chapter
//! per sweep; it does not consult the dedup rule. A final back-fill
//! rewrites `reason`/`for` across the whole structure wherever an entry's
//! normalized edge key matches a render item, so re-running a merge never
//! changes the persisted bytes.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use syllabus::{ClassLevel, SubjectOutline};

use crate::types::{EdgeKey, RenderItem, SelectedStructure};

/// The teacher's answer to one suggestion batch.
#[derive(Debug, Clone, Default)]
pub struct Confirmation {
    /// Confirmed render-item ids
    pub ids: Vec<Uuid>,
    /// Free-form topic picks
    pub topics: Vec<String>,
    /// Free-form subtopic picks
    pub subtopics: Vec<String>,
}

impl Confirmation {
    /// Confirm a set of render items by id.
    pub fn of_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            ..Default::default()
        }
    }
}

/// Merges one confirmed batch into the selected structure.
pub struct SelectionMerger;

impl SelectionMerger {
    /// Merge `confirmation` into the bucket for `bucket_class`.
    pub fn merge(
        bucket_class: ClassLevel,
        confirmation: &Confirmation,
        render_items: &[RenderItem],
        previous_year: &SubjectOutline,
        structure: &mut SelectedStructure,
    ) {
        Self::merge_explicit(bucket_class, confirmation, render_items, previous_year, structure);
        Self::sweep_topics(bucket_class, confirmation, previous_year, structure);
        Self::backfill_reasons(render_items, structure);
    }

    fn merge_explicit(
        bucket_class: ClassLevel,
        confirmation: &Confirmation,
        render_items: &[RenderItem],
        previous_year: &SubjectOutline,
        structure: &mut SelectedStructure,
    ) {
        let by_id: HashMap<Uuid, &RenderItem> =
            render_items.iter().map(|item| (item.id, item)).collect();

        for id in &confirmation.ids {
            let Some(item) = by_id.get(id) else {
                warn!(id = %id, "Confirmed id not in render batch, skipping");
                continue;
            };

            let Some(catalog_chapter) = previous_year
                .get(&item.subject)
                .and_then(|chapters| chapters.iter().find(|c| c.name == item.name))
            else {
                warn!(
                    subject = %item.subject,
                    chapter = %item.name,
                    "No previous-year match for confirmed item, skipping"
                );
                continue;
            };

            let mut chapter = catalog_chapter.clone();
            chapter.prerequisite_for = Some(item.prerequisite_for.clone());
            chapter.reason = (!item.reason.is_empty()).then(|| item.reason.clone());

            if structure.push_unique(bucket_class, &item.subject, chapter) {
                debug!(
                    class = %bucket_class,
                    subject = %item.subject,
                    chapter = %item.name,
                    "Added confirmed chapter"
                );
            } else {
                debug!(
                    subject = %item.subject,
                    chapter = %item.name,
                    "Duplicate edge, skipping"
                );
            }
        }
    }

    /// Append every chapter whose topic or subtopic text was picked.
    fn sweep_topics(
        bucket_class: ClassLevel,
        confirmation: &Confirmation,
        previous_year: &SubjectOutline,
        structure: &mut SelectedStructure,
    ) {
        for (subject, chapters) in previous_year {
            for chapter in chapters {
                let hit = chapter.topics.iter().any(|topic| {
                    confirmation.topics.iter().any(|picked| picked == &topic.name)
                        || topic.subtopics.iter().any(|sub| {
                            confirmation.subtopics.iter().any(|picked| picked == &sub.text)
                        })
                });
                if hit {
                    debug!(
                        class = %bucket_class,
                        subject = %subject,
                        chapter = %chapter.name,
                        "Adding chapter via topic sweep"
                    );
                    structure.push(bucket_class, subject, chapter.clone());
                }
            }
        }
    }

    /// Rewrite `reason`/`for` wherever a normalized edge key matches.
    fn backfill_reasons(render_items: &[RenderItem], structure: &mut SelectedStructure) {
        let by_edge: HashMap<EdgeKey, &RenderItem> = render_items
            .iter()
            .map(|item| {
                (
                    EdgeKey::new(&item.subject, &item.name, &item.prerequisite_for),
                    item,
                )
            })
            .collect();

        for (subject, chapter) in structure.chapters_mut() {
            let key = EdgeKey::new(
                subject,
                &chapter.name,
                chapter.prerequisite_for.as_deref().unwrap_or(""),
            );
            if let Some(item) = by_edge.get(&key) {
                chapter.reason = (!item.reason.is_empty()).then(|| item.reason.clone());
                chapter.prerequisite_for = Some(item.prerequisite_for.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syllabus::{Chapter, Topic};

    fn previous_year() -> SubjectOutline {
        let mut outline = SubjectOutline::new();
        outline.insert(
            "Mathematics".to_string(),
            vec![
                Chapter::new(1, "Number Systems"),
                Chapter::new(2, "Polynomials")
                    .with_topic(Topic::new("2.1 Zeros of a Polynomial").with_subtopic("2.1.1 Geometric Meaning")),
            ],
        );
        outline
    }

    fn polynomials_item() -> RenderItem {
        RenderItem::from_catalog(
            "Mathematics",
            &previous_year()["Mathematics"][1],
            "Roots build on factoring",
            "Quadratic Equations",
        )
    }

    #[test]
    fn test_explicit_merge_stamps_edge() {
        let item = polynomials_item();
        let mut structure = SelectedStructure::new();
        let class = ClassLevel::new(9);

        SelectionMerger::merge(
            class,
            &Confirmation::of_ids([item.id]),
            &[item.clone()],
            &previous_year(),
            &mut structure,
        );

        let chapters = &structure.bucket(class).unwrap()["Mathematics"];
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].name, "Polynomials");
        assert_eq!(chapters[0].prerequisite_for.as_deref(), Some("Quadratic Equations"));
        assert_eq!(chapters[0].reason.as_deref(), Some("Roots build on factoring"));

        // Confirming the same edge again is a no-op.
        SelectionMerger::merge(
            class,
            &Confirmation::of_ids([item.id]),
            &[item],
            &previous_year(),
            &mut structure,
        );
        assert_eq!(structure.bucket(class).unwrap()["Mathematics"].len(), 1);
    }

    #[test]
    fn test_same_chapter_different_for_is_a_new_edge() {
        let first = polynomials_item();
        let mut second = polynomials_item();
        second.prerequisite_for = "Arithmetic Progressions".to_string();

        let mut structure = SelectedStructure::new();
        let class = ClassLevel::new(9);

        SelectionMerger::merge(
            class,
            &Confirmation::of_ids([first.id, second.id]),
            &[first, second],
            &previous_year(),
            &mut structure,
        );

        assert_eq!(structure.bucket(class).unwrap()["Mathematics"].len(), 2);
    }

    #[test]
    fn test_unmatched_confirmations_are_skipped() {
        let mut item = polynomials_item();
        item.name = "Chapter Renamed Since Minting".to_string();

        let mut structure = SelectedStructure::new();
        let class = ClassLevel::new(9);

        SelectionMerger::merge(
            class,
            // One id that resolves to a stale item, one that resolves to nothing.
            &Confirmation::of_ids([item.id, Uuid::new_v4()]),
            &[item],
            &previous_year(),
            &mut structure,
        );

        assert!(structure.bucket(class).is_none());
    }

    #[test]
    fn test_topic_sweep_bypasses_edge_dedup() {
        let mut structure = SelectedStructure::new();
        let class = ClassLevel::new(9);
        let confirmation = Confirmation {
            ids: vec![],
            topics: vec!["2.1 Zeros of a Polynomial".to_string()],
            subtopics: vec![],
        };

        SelectionMerger::merge(class, &confirmation, &[], &previous_year(), &mut structure);
        SelectionMerger::merge(class, &confirmation, &[], &previous_year(), &mut structure);

        // The sweep appends without consulting the (chapter, for) rule, so
        // a repeated sweep duplicates the chapter.
        let chapters = &structure.bucket(class).unwrap()["Mathematics"];
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].name, "Polynomials");
        assert!(chapters[0].prerequisite_for.is_none());
    }

    #[test]
    fn test_subtopic_pick_sweeps_owning_chapter() {
        let mut structure = SelectedStructure::new();
        let confirmation = Confirmation {
            ids: vec![],
            topics: vec![],
            subtopics: vec!["2.1.1 Geometric Meaning".to_string()],
        };

        SelectionMerger::merge(
            ClassLevel::new(9),
            &confirmation,
            &[],
            &previous_year(),
            &mut structure,
        );

        let chapters = &structure.bucket(ClassLevel::new(9)).unwrap()["Mathematics"];
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].name, "Polynomials");
    }

    #[test]
    fn test_backfill_is_idempotent_across_buckets() {
        let item = polynomials_item();
        let mut structure = SelectedStructure::new();

        // An entry merged in an earlier session bucket, persisted with
        // different casing and no reason.
        let mut stale = Chapter::new(2, "Polynomials");
        stale.prerequisite_for = Some("QUADRATIC EQUATIONS ".to_string());
        structure.push(ClassLevel::new(8), "Mathematics", stale);

        SelectionMerger::merge(
            ClassLevel::new(9),
            &Confirmation::of_ids([item.id]),
            &[item.clone()],
            &previous_year(),
            &mut structure,
        );

        let class_8 = &structure.bucket(ClassLevel::new(8)).unwrap()["Mathematics"];
        assert_eq!(class_8[0].reason.as_deref(), Some("Roots build on factoring"));
        // The back-fill also rewrites "for" to the item's canonical form.
        assert_eq!(class_8[0].prerequisite_for.as_deref(), Some("Quadratic Equations"));

        let first = serde_json::to_string(&structure).unwrap();
        SelectionMerger::merge(
            ClassLevel::new(9),
            &Confirmation::of_ids([item.id]),
            &[item],
            &previous_year(),
            &mut structure,
        );
        let second = serde_json::to_string(&structure).unwrap();
        assert_eq!(first, second);
    }
}
