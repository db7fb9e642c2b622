//! Core types for the textbook catalog domain.
//!
//! Chapters carry the wire shape shared with the persistence surface:
//! `number`, `chapter`, `topics` (each `topic` + `subtopics[{text}]`),
//! and the optional `reason`/`for` annotations attached during
//! prerequisite resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SyllabusError;

/// A school class level (e.g. class 10).
///
/// Serializes as the canonical bucket key `class_<N>` and parses back
/// from either that form or a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ClassLevel(u8);

impl ClassLevel {
    /// Create a class level from its number.
    pub fn new(number: u8) -> Self {
        Self(number)
    }

    /// The numeric class (10 for class 10).
    pub fn number(&self) -> u8 {
        self.0
    }

    /// The digits-only label the catalog uses ("10").
    pub fn label(&self) -> String {
        self.0.to_string()
    }

    /// The class one year earlier, if any.
    pub fn previous(&self) -> Option<ClassLevel> {
        if self.0 <= 1 {
            None
        } else {
            Some(ClassLevel(self.0 - 1))
        }
    }

    /// The class `levels` years earlier, if any.
    pub fn back(&self, levels: u8) -> Option<ClassLevel> {
        let target = self.0.checked_sub(levels)?;
        if target == 0 {
            None
        } else {
            Some(ClassLevel(target))
        }
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class_{}", self.0)
    }
}

impl From<ClassLevel> for String {
    fn from(level: ClassLevel) -> Self {
        level.to_string()
    }
}

impl FromStr for ClassLevel {
    type Err = SyllabusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("class_").unwrap_or(s);
        digits
            .trim()
            .parse::<u8>()
            .map(ClassLevel)
            .map_err(|_| SyllabusError::InvalidClassLevel(s.to_string()))
    }
}

impl TryFrom<String> for ClassLevel {
    type Error = SyllabusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single chapter with its topic outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Dense 1-based position within the book
    pub number: u32,
    /// Display name
    #[serde(rename = "chapter")]
    pub name: String,
    /// Topic outline in catalog order
    #[serde(default)]
    pub topics: Vec<Topic>,
    /// Why this chapter was suggested as a prerequisite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The later-year chapter this one is a prerequisite for
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub prerequisite_for: Option<String>,
}

impl Chapter {
    /// Create a bare chapter with no topics or annotations.
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            topics: Vec::new(),
            reason: None,
            prerequisite_for: None,
        }
    }

    /// Attach a topic.
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topics.push(topic);
        self
    }

    /// Set the prerequisite annotations.
    pub fn with_edge(
        mut self,
        prerequisite_for: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.prerequisite_for = Some(prerequisite_for.into());
        self.reason = Some(reason.into());
        self
    }
}

/// A topic inside a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Display name (full text including any numeric prefix).
    ///
    /// Older persisted records carry this under `text`.
    #[serde(rename = "topic", alias = "text")]
    pub name: String,
    /// Subtopics in catalog order
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}

impl Topic {
    /// Create a topic with no subtopics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtopics: Vec::new(),
        }
    }

    /// Attach a subtopic.
    pub fn with_subtopic(mut self, text: impl Into<String>) -> Self {
        self.subtopics.push(Subtopic { text: text.into() });
        self
    }
}

/// A subtopic line under a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    pub text: String,
}

/// Chapters grouped by subject, as one fetch returns them.
pub type SubjectOutline = BTreeMap<String, Vec<Chapter>>;

/// A textbook entry from the catalog book list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Textbook {
    #[serde(deserialize_with = "stringly", default)]
    pub id: String,
    #[serde(default)]
    pub board: String,
    /// The catalog stores class as either a string or a number
    #[serde(rename = "class", deserialize_with = "stringly", default)]
    pub class_label: String,
    #[serde(default)]
    pub subject: String,
}

impl Textbook {
    /// Create a book entry (used by in-memory catalogs and fixtures).
    pub fn new(
        id: impl Into<String>,
        board: impl Into<String>,
        class: ClassLevel,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            board: board.into(),
            class_label: class.label(),
            subject: subject.into(),
        }
    }

    /// Whether this book matches a board/class/subject query.
    ///
    /// Board and subject compare case-insensitively; class compares on
    /// the stringified label.
    pub fn matches(&self, board: &str, class: ClassLevel, subject: &str) -> bool {
        self.board.eq_ignore_ascii_case(board)
            && self.class_label == class.label()
            && self.subject.eq_ignore_ascii_case(subject)
    }
}

/// One page-attribute record from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAttribute {
    #[serde(rename = "type", default)]
    pub kind: AttributeKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub order: f64,
}

impl PageAttribute {
    /// A chapter heading record.
    pub fn chapter(text: impl Into<String>, order: f64) -> Self {
        Self {
            kind: AttributeKind::Chapter,
            text: text.into(),
            order,
        }
    }

    /// A topic record.
    pub fn topic(text: impl Into<String>, order: f64) -> Self {
        Self {
            kind: AttributeKind::Topic,
            text: text.into(),
            order,
        }
    }

    /// A subtopic record.
    pub fn subtopic(text: impl Into<String>, order: f64) -> Self {
        Self {
            kind: AttributeKind::Subtopic,
            text: text.into(),
            order,
        }
    }
}

/// Kind of page-attribute record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Chapter,
    Topic,
    Subtopic,
    /// Anything the outline builder does not consume
    #[serde(other)]
    Other,
}

impl Default for AttributeKind {
    fn default() -> Self {
        AttributeKind::Other
    }
}

/// Accept a JSON string or number as a string field.
fn stringly<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_level_key_round_trip() {
        let level = ClassLevel::new(10);
        assert_eq!(level.to_string(), "class_10");
        assert_eq!("class_10".parse::<ClassLevel>().unwrap(), level);
        assert_eq!("9".parse::<ClassLevel>().unwrap(), ClassLevel::new(9));
        assert!("class_x".parse::<ClassLevel>().is_err());
    }

    #[test]
    fn test_class_level_walks_backward() {
        let level = ClassLevel::new(10);
        assert_eq!(level.previous(), Some(ClassLevel::new(9)));
        assert_eq!(level.back(3), Some(ClassLevel::new(7)));
        assert_eq!(ClassLevel::new(1).previous(), None);
        assert_eq!(level.back(10), None);
    }

    #[test]
    fn test_class_level_serializes_as_bucket_key() {
        let json = serde_json::to_string(&ClassLevel::new(9)).unwrap();
        assert_eq!(json, "\"class_9\"");
        let back: ClassLevel = serde_json::from_str("\"class_9\"").unwrap();
        assert_eq!(back, ClassLevel::new(9));
    }

    #[test]
    fn test_chapter_wire_shape() {
        let chapter = Chapter::new(2, "Polynomials")
            .with_topic(Topic::new("2.1 Degree").with_subtopic("2.1.1 Linear"))
            .with_edge("Quadratic Equations", "Roots build on factoring");

        let json = serde_json::to_value(&chapter).unwrap();
        assert_eq!(json["chapter"], "Polynomials");
        assert_eq!(json["for"], "Quadratic Equations");
        assert_eq!(json["topics"][0]["topic"], "2.1 Degree");
        assert_eq!(json["topics"][0]["subtopics"][0]["text"], "2.1.1 Linear");
    }

    #[test]
    fn test_chapter_omits_absent_annotations() {
        let json = serde_json::to_value(Chapter::new(1, "Sets")).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("reason"));
        assert!(!obj.contains_key("for"));
    }

    #[test]
    fn test_topic_accepts_legacy_text_key() {
        let topic: Topic =
            serde_json::from_value(serde_json::json!({"text": "1.2 Whole Numbers"})).unwrap();
        assert_eq!(topic.name, "1.2 Whole Numbers");
        assert!(topic.subtopics.is_empty());
    }

    #[test]
    fn test_textbook_tolerates_numeric_class() {
        let book: Textbook = serde_json::from_value(serde_json::json!({
            "id": 42,
            "board": "CBSE",
            "class": 9,
            "subject": "Maths"
        }))
        .unwrap();
        assert_eq!(book.id, "42");
        assert!(book.matches("cbse", ClassLevel::new(9), "maths"));
        assert!(!book.matches("CBSE", ClassLevel::new(8), "Maths"));
    }

    #[test]
    fn test_attribute_kind_tolerates_unknown() {
        let attr: PageAttribute = serde_json::from_value(serde_json::json!({
            "type": "illustration",
            "text": "fig 1",
            "order": 3
        }))
        .unwrap();
        assert_eq!(attr.kind, AttributeKind::Other);
    }
}
