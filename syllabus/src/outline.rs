//! Chapter outline assembly from flat page-attribute records.
//!
//! The catalog stores a book as a flat list of records typed
//! `chapter`/`topic`/`subtopic`, each carrying display text and a sort
//! order. Topic and subtopic text begins with a dotted numeric prefix
//! ("2.1 Polynomials in One Variable") which is the only containment
//! signal: topic `2.1` belongs to chapter 2, subtopic `2.1.3` to topic
//! `2.1`. Chapters are numbered densely 1..N by catalog order, not by
//! any number printed in their text.

use std::collections::BTreeMap;

use crate::types::{AttributeKind, Chapter, PageAttribute, Subtopic, Topic};

/// Leading run of digits and dots in the trimmed text, if any.
pub fn numeric_prefix(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    if end == 0 {
        None
    } else {
        Some(&trimmed[..end])
    }
}

/// The prefix one dotted level up ("2.1.3" to "2.1"), if there is one.
pub fn parent_prefix(prefix: &str) -> Option<&str> {
    prefix.rfind('.').map(|i| &prefix[..i]).filter(|p| !p.is_empty())
}

/// Assemble the chapter outline for one book.
pub fn build_outline(attributes: &[PageAttribute]) -> Vec<Chapter> {
    let mut chapters = select_sorted(attributes, AttributeKind::Chapter);
    let topics = select_sorted(attributes, AttributeKind::Topic);
    let subtopics = select_sorted(attributes, AttributeKind::Subtopic);
    chapters.sort_by(|a, b| a.order.total_cmp(&b.order));

    // Insertion order matters: lexicographic prefix order would put
    // "10.1" before "2.1".
    let mut drafts: Vec<(String, Topic)> = Vec::new();
    for topic in &topics {
        let Some(prefix) = numeric_prefix(&topic.text) else {
            continue;
        };
        let draft = Topic::new(topic.text.clone());
        match drafts.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, existing)) => *existing = draft,
            None => drafts.push((prefix.to_string(), draft)),
        }
    }

    for subtopic in &subtopics {
        let Some(parent) = numeric_prefix(&subtopic.text).and_then(parent_prefix) else {
            continue;
        };
        if let Some((_, topic)) = drafts.iter_mut().find(|(p, _)| p == parent) {
            topic.subtopics.push(Subtopic {
                text: subtopic.text.clone(),
            });
        }
    }

    chapters
        .iter()
        .enumerate()
        .map(|(i, ch)| {
            let number = (i + 1) as u32;
            let marker = format!("{}.", number);
            let chapter_topics = drafts
                .iter()
                .filter(|(prefix, _)| prefix.starts_with(&marker))
                .map(|(_, topic)| topic.clone())
                .collect();
            Chapter {
                number,
                name: ch.text.clone(),
                topics: chapter_topics,
                reason: None,
                prerequisite_for: None,
            }
        })
        .collect()
}

/// Chapter number to name index, as handed to the suggestion oracle.
pub fn chapter_index(chapters: &[Chapter]) -> BTreeMap<u32, String> {
    chapters
        .iter()
        .map(|ch| (ch.number, ch.name.clone()))
        .collect()
}

fn select_sorted(attributes: &[PageAttribute], kind: AttributeKind) -> Vec<PageAttribute> {
    let mut selected: Vec<PageAttribute> = attributes
        .iter()
        .filter(|a| a.kind == kind)
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.order.total_cmp(&b.order));
    selected
}
