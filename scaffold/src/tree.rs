//! Assembling the multi-level prerequisite tree.
//!
//! The selected structure is a flat map of class buckets; the tree
//! builder turns it into nested chapters rooted at the highest class.
//! Each root chapter pulls candidates from every strictly lower bucket
//! of the same subject. The permissive build attaches a candidate when
//! its `for` names the parent chapter or is empty, guarding each branch
//! with its own visited set so shared prerequisites can appear under
//! several parents while cycles still terminate. The minimal build only
//! follows exact `for` edges and shares one visited set per root, so a
//! revisited chapter keeps its node but loses its subtree.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use syllabus::{Chapter, ClassLevel, SubjectOutline, Topic};

use crate::types::SelectedStructure;

/// One chapter in the assembled tree, carrying its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterNode {
    pub number: u32,
    #[serde(rename = "chapter")]
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Bucket the chapter was selected from
    #[serde(rename = "class")]
    pub class_level: ClassLevel,
    #[serde(default)]
    pub prerequisites: Vec<ChapterNode>,
}

impl ChapterNode {
    fn from_chapter(chapter: &Chapter, class: ClassLevel) -> Self {
        Self {
            number: chapter.number,
            name: chapter.name.clone(),
            topics: chapter.topics.clone(),
            reason: chapter.reason.clone(),
            class_level: class,
            prerequisites: Vec::new(),
        }
    }
}

/// A compact tree node without topic payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimalNode {
    pub number: u32,
    #[serde(rename = "chapter")]
    pub name: String,
    #[serde(rename = "class")]
    pub class_level: ClassLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<MinimalNode>,
}

impl MinimalNode {
    fn from_chapter(chapter: &Chapter, class: ClassLevel) -> Self {
        Self {
            number: chapter.number,
            name: chapter.name.clone(),
            class_level: class,
            reason: chapter.reason.clone().filter(|r| !r.is_empty()),
            prerequisites: Vec::new(),
        }
    }
}

/// Compact variant of the tree, same outer shape.
pub type MinimalTree = BTreeMap<ClassLevel, BTreeMap<String, Vec<MinimalNode>>>;

/// The assembled tree, keyed by the root class only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrerequisiteTree {
    levels: BTreeMap<ClassLevel, BTreeMap<String, Vec<ChapterNode>>>,
}

impl PrerequisiteTree {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The class the tree is rooted at.
    pub fn root_class(&self) -> Option<ClassLevel> {
        self.levels.keys().next().copied()
    }

    /// The subject map under one class key.
    pub fn bucket(&self, class: ClassLevel) -> Option<&BTreeMap<String, Vec<ChapterNode>>> {
        self.levels.get(&class)
    }

    /// Render the tree as indented prompt text.
    ///
    /// One `## subject - class_N` header per subject, then one bullet
    /// per chapter with a `Reason:` line underneath when present, each
    /// tree level indented two further spaces.
    pub fn flatten(&self) -> String {
        let mut lines = Vec::new();
        for (class, subjects) in &self.levels {
            for (subject, chapters) in subjects {
                lines.push(format!("## {subject} - {class}"));
                flatten_nodes(chapters, 1, &mut lines);
            }
        }
        lines.join("\n")
    }
}

fn flatten_nodes(nodes: &[ChapterNode], depth: usize, lines: &mut Vec<String>) {
    for node in nodes {
        lines.push(format!(
            "{}- {} (Chapter {}, {})",
            "  ".repeat(depth),
            node.name,
            node.number,
            node.class_level
        ));
        if let Some(reason) = &node.reason {
            lines.push(format!("{}Reason: {}", "  ".repeat(depth + 1), reason));
        }
        if !node.prerequisites.is_empty() {
            flatten_nodes(&node.prerequisites, depth + 1, lines);
        }
    }
}

/// Builds prerequisite trees from a selected structure.
pub struct PrerequisiteTreeBuilder;

impl PrerequisiteTreeBuilder {
    /// Build the full tree, topics and all.
    pub fn build(structure: &SelectedStructure) -> PrerequisiteTree {
        let levels = Self::levels_desc(structure);
        let Some((root_class, root_bucket)) = levels.first().copied() else {
            return PrerequisiteTree::default();
        };

        let mut subjects = BTreeMap::new();
        for (subject, chapters) in root_bucket {
            let nodes = chapters
                .iter()
                .map(|chapter| {
                    let mut node = ChapterNode::from_chapter(chapter, root_class);
                    node.prerequisites =
                        Self::attach(&levels, subject, &chapter.name, 0, HashSet::new());
                    node
                })
                .collect();
            subjects.insert(subject.clone(), nodes);
        }

        PrerequisiteTree {
            levels: BTreeMap::from([(root_class, subjects)]),
        }
    }

    /// Build the compact tree. Only exact `for` edges are followed.
    pub fn build_minimal(structure: &SelectedStructure) -> MinimalTree {
        let levels = Self::levels_desc(structure);
        let Some((root_class, root_bucket)) = levels.first().copied() else {
            return MinimalTree::new();
        };

        let mut subjects = BTreeMap::new();
        for (subject, chapters) in root_bucket {
            let mut nodes = Vec::new();
            for chapter in chapters {
                let mut visited = HashSet::new();
                let mut node = MinimalNode::from_chapter(chapter, root_class);
                node.prerequisites =
                    Self::attach_minimal(&levels, subject, &chapter.name, 0, &mut visited);
                nodes.push(node);
            }
            subjects.insert(subject.clone(), nodes);
        }

        BTreeMap::from([(root_class, subjects)])
    }

    fn levels_desc(structure: &SelectedStructure) -> Vec<(ClassLevel, &SubjectOutline)> {
        structure
            .levels_desc()
            .into_iter()
            .filter_map(|class| structure.bucket(class).map(|bucket| (class, bucket)))
            .collect()
    }

    /// Collect prerequisites of `chapter_name` from buckets below `rank`.
    ///
    /// `visited` is cloned into each child branch, so one chapter may
    /// serve several parents while any cycle back into the current
    /// branch is cut.
    fn attach(
        levels: &[(ClassLevel, &SubjectOutline)],
        subject: &str,
        chapter_name: &str,
        rank: usize,
        mut visited: HashSet<String>,
    ) -> Vec<ChapterNode> {
        if !visited.insert(chapter_name.to_string()) {
            return Vec::new();
        }

        let mut prereqs = Vec::new();
        for (lower_rank, (class, bucket)) in levels.iter().enumerate().skip(rank + 1) {
            let Some(chapters) = bucket.get(subject) else {
                continue;
            };
            for candidate in chapters {
                if visited.contains(&candidate.name) {
                    continue;
                }
                let matches = match candidate.prerequisite_for.as_deref() {
                    None | Some("") => true,
                    Some(target) => target == chapter_name,
                };
                if !matches {
                    continue;
                }
                let mut node = ChapterNode::from_chapter(candidate, *class);
                node.prerequisites =
                    Self::attach(levels, subject, &candidate.name, lower_rank, visited.clone());
                prereqs.push(node);
            }
        }
        prereqs
    }

    /// Strict variant: only exact (trimmed) `for` matches, one shared
    /// visited set per root chapter. A revisited chapter keeps its node
    /// but gets no subtree.
    fn attach_minimal(
        levels: &[(ClassLevel, &SubjectOutline)],
        subject: &str,
        chapter_name: &str,
        rank: usize,
        visited: &mut HashSet<(String, String)>,
    ) -> Vec<MinimalNode> {
        if !visited.insert((subject.to_string(), chapter_name.to_string())) {
            return Vec::new();
        }

        let mut prereqs = Vec::new();
        for (lower_rank, (class, bucket)) in levels.iter().enumerate().skip(rank + 1) {
            let Some(chapters) = bucket.get(subject) else {
                continue;
            };
            for candidate in chapters {
                let target = candidate.prerequisite_for.as_deref().unwrap_or("").trim();
                if target != chapter_name {
                    continue;
                }
                let mut node = MinimalNode::from_chapter(candidate, *class);
                node.prerequisites =
                    Self::attach_minimal(levels, subject, &candidate.name, lower_rank, visited);
                prereqs.push(node);
            }
        }
        prereqs
    }
}
