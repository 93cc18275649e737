//! System-prompt assembly.
//!
//! A prompt is layered: a base block with the document and a progress
//! snapshot, an optional block of exam reference material, an optional exam
//! preparation block, and finally the instructions for the active mode.
//! Assembly is a pure function of its inputs.

use std::fmt::Write;

use crate::model::{ExamConfig, Mode, ProgressState, ReferenceMaterial};

/// Characters of each reference material included in the prompt.
pub const REFERENCE_PREVIEW_CHARS: usize = 3000;

/// Request text used to open a quiz.
pub const FIRST_QUESTION_REQUEST: &str = "Generate a quiz question based on the textbook content.";

/// Request text used to move on to another question.
pub const NEXT_QUESTION_REQUEST: &str =
    "Generate a new quiz question. Make it different from previous questions.";

/// Inputs to a single prompt build.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub mode: Mode,
    pub document_text: &'a str,
    pub progress: &'a ProgressState,
    pub exam_config: Option<&'a ExamConfig>,
    pub references: &'a [ReferenceMaterial],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the system instruction for one request.
    #[must_use]
    pub fn build(&self, ctx: &PromptContext<'_>) -> String {
        let mut out = String::with_capacity(ctx.document_text.len() + 2048);
        write_base(&mut out, ctx.document_text, ctx.progress);
        if !ctx.references.is_empty() {
            write_references(&mut out, ctx.references);
        }
        if let Some(config) = ctx.exam_config {
            write_exam_config(&mut out, config);
        }
        match ctx.mode {
            Mode::Review => write_review(&mut out),
            Mode::Quiz => write_quiz(&mut out, ctx.progress, ctx.exam_config),
            Mode::Learn | Mode::Dashboard => write_learn(&mut out),
        }
        out
    }
}

/// Request text asking the model to grade a student's answer.
///
/// The requested structure leads with an explicit correctness line so the
/// reply can be checked with [`crate::model::is_marked_correct`].
#[must_use]
pub fn evaluation_request(question: &str, answer: &str) -> String {
    format!(
        "Question: {question}\n\n\
         Student's Answer: {answer}\n\n\
         Please evaluate this answer and provide:\n\
         1. Is it correct? Start with exactly \"Correct: Yes\", \"Correct: No\" or \"Correct: Partial\"\n\
         2. Detailed feedback\n\
         3. Page references from the textbook\n\
         4. The correct answer if they got it wrong"
    )
}

fn join_or(items: impl IntoIterator<Item = impl AsRef<str>>, fallback: &str) -> String {
    let joined = items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        fallback.to_string()
    } else {
        joined
    }
}

fn write_numbered(out: &mut String, items: &[String], indent: &str) {
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{indent}{}. {item}", i + 1);
    }
}

fn write_base(out: &mut String, document_text: &str, progress: &ProgressState) {
    let _ = write!(
        out,
        "You are an expert tutor helping a student learn from their textbook.\n\n\
         STUDY MATERIAL (Main Content):\n\
         {document_text}\n\n\
         STUDENT PROGRESS:\n\
         - Topics studied: {}\n\
         - Questions answered: {}\n\
         - Accuracy: {}%\n\
         - Weak areas: {}\n",
        join_or(progress.topics_studied(), "None yet"),
        progress.questions_answered(),
        progress.accuracy_percent(),
        join_or(progress.weak_areas(), "None identified"),
    );
}

fn write_references(out: &mut String, references: &[ReferenceMaterial]) {
    let _ = write!(
        out,
        "\n\nEXAM MATERIALS (Reference for Question Format & Style):\n\
         You have access to {} exam material(s) to understand the question format, \
         difficulty, and style expected.\n\n",
        references.len()
    );

    for (i, reference) in references.iter().enumerate() {
        let pages = reference
            .page_count
            .map_or_else(|| "N/A".to_string(), |count| count.to_string());
        let _ = writeln!(out, "{}. \"{}\"", i + 1, reference.title);
        let _ = writeln!(out, "   Pages: {pages}");
        let _ = writeln!(
            out,
            "   Content Preview (first {REFERENCE_PREVIEW_CHARS} chars):"
        );
        if reference.text.is_empty() {
            let _ = writeln!(out, "   No content available");
        } else {
            let (preview, truncated) = reference.preview(REFERENCE_PREVIEW_CHARS);
            let _ = writeln!(out, "   {preview}");
            if truncated {
                let _ = writeln!(out, "   ...[content truncated]");
            }
        }
        out.push('\n');
    }

    out.push_str(
        "IMPORTANT INSTRUCTIONS FOR USING EXAM MATERIALS:\n\
         - Use these exam materials to understand the EXPECTED QUESTION FORMAT\n\
         - Match the difficulty level shown in these exam materials\n\
         - Pay attention to how questions are phrased and structured\n\
         - Notice which topics are emphasized in the exam materials\n\
         - Align your quiz questions with the style and format of these exams\n\
         - Reference specific question patterns you see in the exam materials\n",
    );
}

fn write_exam_config(out: &mut String, config: &ExamConfig) {
    let _ = write!(
        out,
        "\n\nEXAM PREPARATION CONTEXT:\n\n\
         Exam Type: {}\n\
         Difficulty Level: {}\n",
        config.exam_type(),
        config.difficulty_level()
    );

    if !config.learning_objectives().is_empty() {
        out.push_str("\nLearning Objectives (What the student MUST know):\n");
        write_numbered(out, config.learning_objectives(), "");
    }

    if !config.common_pitfalls().is_empty() {
        out.push_str("\nCommon Pitfalls to Avoid:\n");
        write_numbered(out, config.common_pitfalls(), "");
    }

    if let Some(minutes) = config.time_constraints() {
        let _ = write!(
            out,
            "\nTime Constraint: {minutes} minutes\n\
             (Consider pacing in your explanations and practice questions)\n"
        );
    }

    if !config.special_instructions().is_empty() {
        let _ = write!(
            out,
            "\nSpecial Instructions:\n{}\n",
            config.special_instructions()
        );
    }

    let _ = write!(
        out,
        "\nIMPORTANT: All your teaching should be aligned with these exam requirements. \
         Focus on the learning objectives, warn about common pitfalls, and prepare the \
         student specifically for this {} exam.\n",
        config.exam_type()
    );
}

fn write_learn(out: &mut String) {
    out.push_str(
        "\nMODE: LEARN - Guided Learning\n\
         Your role: Patient, expert tutor teaching from the textbook\n\n\
         Instructions:\n\
         - Break down concepts step-by-step\n\
         - Use analogies and real-world examples\n\
         - Always cite specific page numbers from the textbook\n\
         - Adjust complexity based on student's progress\n\
         - Encourage deeper exploration with follow-up questions\n\
         - When student asks \"Tell me more\", provide detailed explanations\n\
         - Focus on understanding over memorization\n",
    );
}

fn write_review(out: &mut String) {
    out.push_str(
        "\nMODE: REVIEW - Q&A and Material Lookup\n\
         Your role: Knowledgeable study partner\n\n\
         Instructions:\n\
         - Answer questions using ONLY the textbook content\n\
         - Always cite page/section references\n\
         - Provide relevant excerpts from the text\n\
         - Suggest related topics they might want to review\n\
         - Keep tone conversational and supportive\n\
         - If the answer isn't in the textbook, say so clearly\n",
    );
}

fn write_quiz(out: &mut String, progress: &ProgressState, config: Option<&ExamConfig>) {
    let difficulty = config.map_or("appropriate", |c| c.difficulty_level().as_str());
    let objectives = config.map_or(&[][..], ExamConfig::learning_objectives);

    let _ = write!(
        out,
        "\nMODE: QUIZ - Adaptive Testing\n\
         Your role: Adaptive test administrator\n\n\
         Instructions:\n\
         - Ask exactly one question at a time and evaluate one answer at a time\n\
         - Generate questions at {difficulty} difficulty level\n"
    );

    match config {
        Some(config) => {
            let _ = writeln!(out, "- Match the {} exam format", config.exam_type());
        }
        None => out.push_str(
            "- Question type distribution: 70% open-ended, 20% fill-in-blank, 10% application\n",
        ),
    }

    out.push_str("- Provide detailed feedback with textbook references\n");

    let focus_fallback = if objectives.is_empty() {
        "all topics"
    } else {
        "learning objectives"
    };
    let _ = writeln!(
        out,
        "- Focus on weak areas first: {}",
        join_or(progress.weak_areas(), focus_fallback)
    );

    if !objectives.is_empty() {
        out.push_str("- Then prioritize these learning objectives:\n");
        write_numbered(out, objectives, "  ");
    }

    out.push_str(
        "- When evaluating an answer, begin with \"Correct: Yes\", \"Correct: No\" or \"Correct: Partial\"\n\
         - After each answer, explain WHY it's correct/incorrect\n\
         - Include page numbers for all explanations\n\
         - Adjust difficulty based on performance\n",
    );

    if config.is_some_and(|c| !c.common_pitfalls().is_empty()) {
        out.push_str("- Test understanding of common pitfalls\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DifficultyLevel, ExamConfigDraft, ExamType, ProgressAction};

    fn build(
        mode: Mode,
        progress: &ProgressState,
        config: Option<&ExamConfig>,
        references: &[ReferenceMaterial],
    ) -> String {
        PromptAssembler::new().build(&PromptContext {
            mode,
            document_text: "Chapter 1: Cells are the unit of life.",
            progress,
            exam_config: config,
            references,
        })
    }

    fn exam_config() -> ExamConfig {
        ExamConfigDraft {
            exam_type: ExamType::Essay,
            difficulty_level: DifficultyLevel::Advanced,
            learning_objectives: vec!["Explain osmosis".into(), "Describe mitosis".into()],
            common_pitfalls: vec!["Confusing diffusion with osmosis".into()],
            time_constraints: Some(45),
            special_instructions: "Use British spelling".into(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn base_block_embeds_document_and_progress() {
        let progress = ProgressState::new()
            .apply(&ProgressAction::question_answered(true, "cells"))
            .apply(&ProgressAction::question_answered(false, "osmosis"))
            .apply(&ProgressAction::topic_studied("cells"));
        let prompt = build(Mode::Learn, &progress, None, &[]);

        assert!(prompt.contains("Chapter 1: Cells are the unit of life."));
        assert!(prompt.contains("- Topics studied: cells"));
        assert!(prompt.contains("- Questions answered: 2"));
        assert!(prompt.contains("- Accuracy: 50%"));
        assert!(prompt.contains("- Weak areas: osmosis"));
        assert!(prompt.contains("MODE: LEARN"));
        assert!(!prompt.contains("EXAM MATERIALS"));
        assert!(!prompt.contains("EXAM PREPARATION CONTEXT"));
    }

    #[test]
    fn empty_progress_uses_placeholders() {
        let prompt = build(Mode::Review, &ProgressState::new(), None, &[]);
        assert!(prompt.contains("- Topics studied: None yet"));
        assert!(prompt.contains("- Accuracy: 0%"));
        assert!(prompt.contains("- Weak areas: None identified"));
        assert!(prompt.contains("MODE: REVIEW"));
        assert!(prompt.contains("If the answer isn't in the textbook, say so clearly"));
    }

    #[test]
    fn references_are_previewed_and_marked_when_truncated() {
        let long = ReferenceMaterial {
            title: "2023 Paper".into(),
            page_count: Some(12),
            text: format!("{}TAIL", "q".repeat(REFERENCE_PREVIEW_CHARS)),
        };
        let short = ReferenceMaterial {
            title: "Mock Paper".into(),
            page_count: None,
            text: "Q1. Define osmosis.".into(),
        };
        let prompt = build(Mode::Quiz, &ProgressState::new(), None, &[long, short]);

        assert!(prompt.contains("You have access to 2 exam material(s)"));
        assert!(prompt.contains("1. \"2023 Paper\""));
        assert!(prompt.contains("   Pages: 12"));
        assert!(prompt.contains("2. \"Mock Paper\""));
        assert!(prompt.contains("   Pages: N/A"));
        assert!(!prompt.contains("TAIL"));
        assert_eq!(prompt.matches("...[content truncated]").count(), 1);
        assert!(prompt.contains("Match the difficulty level shown in these exam materials"));
    }

    #[test]
    fn exam_config_block_lists_everything() {
        let config = exam_config();
        let prompt = build(Mode::Learn, &ProgressState::new(), Some(&config), &[]);

        assert!(prompt.contains("Exam Type: essay"));
        assert!(prompt.contains("Difficulty Level: advanced"));
        assert!(prompt.contains("1. Explain osmosis\n2. Describe mitosis"));
        assert!(prompt.contains("1. Confusing diffusion with osmosis"));
        assert!(prompt.contains("Time Constraint: 45 minutes"));
        assert!(prompt.contains("Special Instructions:\nUse British spelling"));
        assert!(prompt.contains("prepare the student specifically for this essay exam"));
    }

    #[test]
    fn quiz_without_config_uses_default_mix() {
        let prompt = build(Mode::Quiz, &ProgressState::new(), None, &[]);
        assert!(prompt.contains("at appropriate difficulty level"));
        assert!(prompt.contains("70% open-ended, 20% fill-in-blank, 10% application"));
        assert!(prompt.contains("- Focus on weak areas first: all topics"));
        assert!(!prompt.contains("common pitfalls"));
    }

    #[test]
    fn quiz_with_config_follows_exam_and_objectives() {
        let config = exam_config();
        let progress =
            ProgressState::new().apply(&ProgressAction::question_answered(false, "osmosis"));
        let prompt = build(Mode::Quiz, &progress, Some(&config), &[]);

        assert!(prompt.contains("at advanced difficulty level"));
        assert!(prompt.contains("- Match the essay exam format"));
        assert!(!prompt.contains("70% open-ended"));
        assert!(prompt.contains("- Focus on weak areas first: osmosis"));
        assert!(prompt.contains("- Then prioritize these learning objectives:\n  1. Explain osmosis"));
        assert!(prompt.contains("- Test understanding of common pitfalls"));
        assert!(prompt.contains("Correct: Yes"));
    }

    #[test]
    fn dashboard_falls_back_to_learn_instructions() {
        let prompt = build(Mode::Dashboard, &ProgressState::new(), None, &[]);
        assert!(prompt.contains("MODE: LEARN"));
    }

    #[test]
    fn build_is_pure() {
        let progress = ProgressState::new();
        assert_eq!(
            build(Mode::Quiz, &progress, None, &[]),
            build(Mode::Quiz, &progress, None, &[])
        );
    }

    #[test]
    fn evaluation_request_embeds_question_and_answer() {
        let text = evaluation_request("What is osmosis?", "Water moving across a membrane");
        assert!(text.starts_with("Question: What is osmosis?"));
        assert!(text.contains("Student's Answer: Water moving across a membrane"));
        assert!(text.contains("Correct: Yes"));
    }
}
