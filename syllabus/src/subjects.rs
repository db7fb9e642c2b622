//! Cross-year subject name resolution.
//!
//! Boards rename subjects between classes: the class 10 book "Mathematics"
//! is "Maths" in class 9, "Social Science" becomes "Social Studies" one
//! year and "Social" the next. A registry of alias groups resolves the
//! name a subject carries in a given class so backward walks keep querying
//! the right book.

use std::collections::BTreeMap;

use crate::types::ClassLevel;

/// One subject across years: a canonical name plus per-class labels.
#[derive(Debug, Clone)]
pub struct SubjectGroup {
    canonical: String,
    by_class: BTreeMap<u8, String>,
}

impl SubjectGroup {
    /// Create a group with its canonical name.
    pub fn new(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            by_class: BTreeMap::new(),
        }
    }

    /// Add the label the subject carries in one class.
    pub fn with_label(mut self, class: u8, label: impl Into<String>) -> Self {
        self.by_class.insert(class, label.into());
        self
    }

    /// Whether `subject` names this group, canonically or via any label.
    pub fn covers(&self, subject: &str) -> bool {
        self.canonical == subject || self.by_class.values().any(|label| label == subject)
    }

    /// The label for a class; the queried name itself when unmapped.
    pub fn label_for(&self, class: ClassLevel, fallback: &str) -> String {
        self.by_class
            .get(&class.number())
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Registry of subject alias groups. First matching group wins.
#[derive(Debug, Clone)]
pub struct SubjectRegistry {
    groups: Vec<SubjectGroup>,
}

impl SubjectRegistry {
    /// A registry with no groups; every subject resolves to itself.
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// Add a group.
    pub fn register(&mut self, group: SubjectGroup) {
        self.groups.push(group);
    }

    /// The name `subject` carries in `class`.
    ///
    /// Subjects outside every group pass through unchanged, as does a
    /// grouped subject for a class the group does not map.
    pub fn resolve(&self, subject: &str, class: ClassLevel) -> String {
        for group in &self.groups {
            if group.covers(subject) {
                return group.label_for(class, subject);
            }
        }
        subject.to_string()
    }
}

impl Default for SubjectRegistry {
    /// The stock CBSE-style alias table.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            SubjectGroup::new("Mathematics")
                .with_label(10, "Mathematics")
                .with_label(9, "Maths")
                .with_label(8, "Mathematics")
                .with_label(7, "Mathematics")
                .with_label(6, "Mathematics")
                .with_label(5, "Mathematics")
                .with_label(4, "Maths"),
        );
        registry.register(
            SubjectGroup::new("Science")
                .with_label(10, "Science")
                .with_label(9, "General Science")
                .with_label(8, "Science"),
        );
        registry.register(
            SubjectGroup::new("Social Science")
                .with_label(10, "Social Studies")
                .with_label(9, "Social Science")
                .with_label(8, "Social"),
        );
        registry.register(
            SubjectGroup::new("English")
                .with_label(10, "English")
                .with_label(9, "English")
                .with_label(8, "English"),
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_canonical_name_across_classes() {
        let registry = SubjectRegistry::default();
        assert_eq!(
            registry.resolve("Mathematics", ClassLevel::new(9)),
            "Maths"
        );
        assert_eq!(
            registry.resolve("Mathematics", ClassLevel::new(8)),
            "Mathematics"
        );
    }

    #[test]
    fn test_resolves_from_any_alias() {
        let registry = SubjectRegistry::default();
        // "Maths" is the class 9 label; asking for its class 8 name
        // routes through the same group.
        assert_eq!(registry.resolve("Maths", ClassLevel::new(8)), "Mathematics");
        assert_eq!(
            registry.resolve("Social Studies", ClassLevel::new(9)),
            "Social Science"
        );
    }

    #[test]
    fn test_unmapped_subject_passes_through() {
        let registry = SubjectRegistry::default();
        assert_eq!(registry.resolve("Sanskrit", ClassLevel::new(9)), "Sanskrit");
        // Grouped subject, unmapped class
        assert_eq!(
            registry.resolve("Science", ClassLevel::new(6)),
            "Science"
        );
    }

    #[test]
    fn test_custom_group_registration() {
        let mut registry = SubjectRegistry::empty();
        registry.register(
            SubjectGroup::new("Hindi")
                .with_label(9, "Hindi Course A")
                .with_label(8, "Hindi"),
        );
        assert_eq!(
            registry.resolve("Hindi", ClassLevel::new(9)),
            "Hindi Course A"
        );
        assert_eq!(
            registry.resolve("Hindi Course A", ClassLevel::new(8)),
            "Hindi"
        );
    }
}
