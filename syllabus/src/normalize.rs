//! Chapter normalization.
//!
//! Chapter records arrive from several sources (catalog fetches, persisted
//! selections, confirmed render items) in slightly different shapes. This
//! module canonicalizes them: topic names may sit under `topic` or the
//! legacy `text` key, subtopics are objects carrying `text`, and absent
//! `topics`/`reason`/`for` fields default instead of erroring. Only a
//! missing chapter number or name is an error.

use serde_json::Value;

use crate::error::SyllabusError;
use crate::types::{Chapter, Subtopic, SubjectOutline, Topic};

/// Canonicalize one raw chapter record.
pub fn normalize_chapter(raw: &Value) -> Result<Chapter, SyllabusError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| SyllabusError::MalformedChapter("not an object".to_string()))?;

    let number = obj
        .get("number")
        .and_then(Value::as_u64)
        .ok_or_else(|| SyllabusError::MalformedChapter("missing chapter number".to_string()))?;

    let name = obj
        .get("chapter")
        .and_then(Value::as_str)
        .ok_or_else(|| SyllabusError::MalformedChapter("missing chapter name".to_string()))?;

    let topics = obj
        .get("topics")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(normalize_topic).collect())
        .unwrap_or_default();

    Ok(Chapter {
        number: number as u32,
        name: name.to_string(),
        topics,
        reason: string_field(obj, "reason"),
        prerequisite_for: string_field(obj, "for"),
    })
}

/// Canonicalize a whole subject → chapters map.
pub fn normalize_subject_outline(raw: &Value) -> Result<SubjectOutline, SyllabusError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| SyllabusError::MalformedChapter("outline is not an object".to_string()))?;

    let mut outline = SubjectOutline::new();
    for (subject, chapters) in obj {
        let chapters = chapters
            .as_array()
            .map(|list| list.iter().map(normalize_chapter).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();
        outline.insert(subject.clone(), chapters);
    }
    Ok(outline)
}

fn normalize_topic(raw: &Value) -> Option<Topic> {
    let obj = raw.as_object()?;
    let name = obj
        .get("topic")
        .and_then(Value::as_str)
        .or_else(|| obj.get("text").and_then(Value::as_str))
        .unwrap_or_default();

    let subtopics = obj
        .get("subtopics")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|sub| {
                    sub.get("text").and_then(Value::as_str).map(|text| Subtopic {
                        text: text.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Topic {
        name: name.to_string(),
        subtopics,
    })
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
