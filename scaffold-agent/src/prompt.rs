//! Prompt assembly for the suggestion oracle.
//!
//! Builds the prerequisite-identification prompt sent once per analyzed
//! chapter, and the question-paper prompt driven by a flattened
//! prerequisite outline.

use serde_json::json;

use syllabus::Chapter;

/// Question count bounds for paper generation.
#[derive(Debug, Clone)]
pub struct QuestionCounts {
    /// Minimum questions per chapter
    pub min_per_chapter: u32,
    /// Maximum questions per chapter
    pub max_per_chapter: u32,
    /// Total questions in the paper
    pub total: u32,
}

impl Default for QuestionCounts {
    fn default() -> Self {
        Self {
            min_per_chapter: 1,
            max_per_chapter: 2,
            total: 10,
        }
    }
}

/// Assembles oracle prompts.
pub struct PromptAssembler;

impl PromptAssembler {
    /// Build the prerequisite-identification prompt for one chapter.
    ///
    /// The oracle sees the analyzed chapter plus the previous year's
    /// chapter number-to-name index for the same subject, and is asked
    /// for a strict JSON object keyed by that subject.
    pub fn prerequisite_prompt(
        subject: &str,
        chapter_name: &str,
        previous_year: &[Chapter],
    ) -> String {
        let index: Vec<_> = previous_year
            .iter()
            .map(|ch| json!({"number": ch.number, "chapter": ch.name}))
            .collect();

        let mut prompt = String::new();
        prompt.push_str("You are an academic AI assistant helping to identify prerequisite chapters.\n\n");

        prompt.push_str("Context:\n");
        prompt.push_str("- The user has selected a specific chapter from the current year's syllabus.\n");
        prompt.push_str("- You are also given the chapter list from the previous year's syllabus for the same subject and board.\n\n");

        prompt.push_str("Instructions:\n");
        prompt.push_str("1. Identify only those prerequisite chapters that are clearly and directly related.\n");
        prompt.push_str("2. Avoid abstract or general background prerequisites.\n");
        prompt.push_str("3. All suggested prerequisites must come from the previous year's chapter list.\n\n");

        prompt.push_str("Output Format:\n");
        prompt.push_str("{\n");
        prompt.push_str("  \"prerequisites\": {\n");
        prompt.push_str(&format!("    \"{}\": [\n", subject));
        prompt.push_str("      {\n");
        prompt.push_str("        \"number\": 1,\n");
        prompt.push_str("        \"chapter\": \"Exact Chapter Name\",\n");
        prompt.push_str("        \"reason\": \"Why this chapter is needed\",\n");
        prompt.push_str(&format!("        \"for\": \"{}\"\n", chapter_name));
        prompt.push_str("      }\n");
        prompt.push_str("    ]\n");
        prompt.push_str("  }\n");
        prompt.push_str("}\n\n");

        prompt.push_str("Selected Chapter:\n");
        prompt.push_str(&pretty(&json!([{ "chapter": chapter_name }])));
        prompt.push_str("\n\nPrevious Year Chapters:\n");
        prompt.push_str(&pretty(&json!(index)));
        prompt.push('\n');

        prompt
    }

    /// System prompt for question-paper generation.
    pub fn paper_system_prompt(counts: &QuestionCounts) -> String {
        let mut prompt = String::new();
        prompt.push_str("You are an AI that only responds with valid JSON. ");
        prompt.push_str("Do not include any explanations or natural language text. ");
        prompt.push_str("Just return a JSON object with the format:\n");
        prompt.push_str(
            "{ \"class\": \"8\", \"subject\": [\"Mathematics\"], \"questions\": [ { \"question\": ..., \"options\": [...], \"correct_answer\": ... } ] }\n",
        );
        prompt.push_str(&format!(
            "Generate exactly {} MCQs based on the prerequisite context provided below.",
            counts.total
        ));
        prompt
    }

    /// Build the question-paper prompt from a flattened prerequisite outline.
    pub fn paper_prompt(
        class_label: &str,
        subjects: &[String],
        prerequisite_outline: &str,
        counts: &QuestionCounts,
    ) -> String {
        pretty(&json!({
            "task": "Generate multiple-choice questions",
            "class": class_label,
            "subjects": subjects,
            "prerequisites": prerequisite_outline,
            "min_questions": counts.min_per_chapter,
            "max_questions": counts.max_per_chapter,
            "total_questions": counts.total,
        }))
    }

    /// Estimate token count for a prompt (rough approximation).
    ///
    /// Uses 4 characters per token as a rough estimate.
    pub fn estimate_tokens(prompt: &str) -> usize {
        prompt.len() / 4
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
