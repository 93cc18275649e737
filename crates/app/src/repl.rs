//! Line commands and transcript rendering for the terminal front end.

use std::fmt::Write;

use services::{DisplayTurn, Rejection, TurnOutcome};
use tutor_core::DashboardSummary;
use tutor_core::model::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Switch(Mode),
    Topic(String),
    Question,
    Answer(String),
    Reset,
    Help,
    Quit,
    Say(String),
    Unknown(String),
}

/// Parse one input line; blank lines yield `None`.
#[must_use]
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));

    let command = match name.to_ascii_lowercase().as_str() {
        "learn" => Command::Switch(Mode::Learn),
        "review" => Command::Switch(Mode::Review),
        "quiz" => Command::Switch(Mode::Quiz),
        "dashboard" => Command::Switch(Mode::Dashboard),
        "topic" if !arg.is_empty() => Command::Topic(arg.to_string()),
        "question" => Command::Question,
        "answer" if !arg.is_empty() => Command::Answer(arg.to_string()),
        "reset" => Command::Reset,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

pub const HELP: &str = "\
Commands:
  /learn /review /quiz /dashboard   switch mode
  /topic <name>                     mark a topic as studied
  /question                         ask for a quiz question
  /answer <text>                    answer the current question
  /reset                            start the session over
  /quit                             save and exit
Any other line is sent to the tutor.";

#[must_use]
pub fn render_outcome(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Completed(reply) => {
            let mut out = String::new();
            if let Some(is_correct) = reply.is_correct {
                let verdict = if is_correct { "correct" } else { "not correct" };
                let _ = writeln!(out, "[graded: {verdict}]");
            }
            out.push_str(&render_turn(&DisplayTurn::assistant(
                reply.message.clone(),
                reply.is_mock,
            )));
            out
        }
        TurnOutcome::Failed { code, message } => format!("error ({code}): {message}"),
        TurnOutcome::Rejected(Rejection::EmptyInput) => "nothing to send".to_string(),
        TurnOutcome::Rejected(Rejection::Busy) => "still waiting for the last reply".to_string(),
        TurnOutcome::Rejected(Rejection::NoQuestion) => {
            "no open question; use /question first".to_string()
        }
        TurnOutcome::Discarded => "reply dropped: the session changed".to_string(),
    }
}

#[must_use]
pub fn render_turn(turn: &DisplayTurn) -> String {
    match turn {
        DisplayTurn::User { content } => format!("you> {content}"),
        DisplayTurn::Assistant { content, is_mock } => {
            let tag = if *is_mock { "tutor (mock)" } else { "tutor" };
            format!("{tag}> {content}")
        }
        DisplayTurn::Error { code, message } => format!("error ({code}): {message}"),
    }
}

#[must_use]
pub fn render_dashboard(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Grade: {} ({}%)",
        summary.grade.label(),
        summary.accuracy_percent()
    );
    let _ = writeln!(
        out,
        "Questions: {} answered, {} correct",
        summary.questions_answered, summary.correct_answers
    );
    let _ = writeln!(out, "Study time: {}", summary.session_duration);
    let _ = writeln!(out, "Topics: {}", join_or_none(&summary.topics_studied));
    let _ = writeln!(out, "Weak areas: {}", join_or_none(&summary.weak_areas));
    for (topic, level) in &summary.concept_mastery {
        let _ = writeln!(out, "  {topic}: {level}");
    }
    out
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::{ErrorCode, TurnReply};
    use tutor_core::model::{ProgressAction, ProgressState};
    use tutor_core::time::fixed_now;

    #[test]
    fn parses_commands_and_plain_lines() {
        assert_eq!(parse("   "), None);
        assert_eq!(parse("/quiz"), Some(Command::Switch(Mode::Quiz)));
        assert_eq!(parse("/Dashboard"), Some(Command::Switch(Mode::Dashboard)));
        assert_eq!(
            parse("/topic  cell biology "),
            Some(Command::Topic("cell biology".into()))
        );
        assert_eq!(
            parse("/answer water moves"),
            Some(Command::Answer("water moves".into()))
        );
        assert_eq!(parse("/answer"), Some(Command::Unknown("/answer".into())));
        assert_eq!(parse("/exit"), Some(Command::Quit));
        assert_eq!(
            parse("what is osmosis?"),
            Some(Command::Say("what is osmosis?".into()))
        );
    }

    #[test]
    fn renders_outcomes() {
        let graded = TurnOutcome::Completed(TurnReply {
            message: "Correct: Yes".into(),
            is_mock: true,
            usage: None,
            is_correct: Some(true),
        });
        assert_eq!(
            render_outcome(&graded),
            "[graded: correct]\ntutor (mock)> Correct: Yes"
        );

        let failed = TurnOutcome::Failed {
            code: ErrorCode::Overloaded,
            message: "busy".into(),
        };
        assert_eq!(render_outcome(&failed), "error (OVERLOADED): busy");
    }

    #[test]
    fn renders_dashboard() {
        let progress = ProgressState::new()
            .apply(&ProgressAction::topic_studied("cells"))
            .apply(&ProgressAction::question_answered(true, "cells"));
        let summary = DashboardSummary::from_progress(&progress, fixed_now(), fixed_now());

        let text = render_dashboard(&summary);
        assert!(text.starts_with("Grade: Pass with Distinction (100%)"));
        assert!(text.contains("Topics: cells"));
        assert!(text.contains("Weak areas: none"));
        assert!(text.contains("  cells: 1"));
    }
}
