//! Answer validation and reaction text.

use super::script::{AnswerKind, Question};

/// Fixed reply appended after the final answer is recorded.
pub const CLOSING_MESSAGE: &str =
    "Thanks! I've recorded your profile. Sit tight, the workshop is about to begin! 🚀";

/// Why an answer was not accepted. The session is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Closed question answered without any allowed option.
    OutOfVocabulary,
    /// Fewer than two words where elaboration is expected.
    TooShort,
}

impl Rejection {
    /// Re-prompt shown to the attendee.
    pub fn message(self) -> &'static str {
        match self {
            Self::OutOfVocabulary => {
                "Please answer with Low, Medium, or High so I can tailor the content."
            }
            Self::TooShort => {
                "Could you elaborate a bit more on that? I want to make sure I understand."
            }
        }
    }
}

/// Keyword-triggered reaction prefixed to the next prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Finance,
    Healthcare,
    PythonConfidence,
}

impl Reaction {
    pub fn text(self) -> &'static str {
        match self {
            Self::Finance => "Finance is a great domain for AI agents! 📈 ",
            Self::Healthcare => "Healthcare AI is very impactful! 🏥 ",
            Self::PythonConfidence => "Awesome, you'll breeze through the code! 🐍 ",
        }
    }
}

/// Check `answer` against the rules of `question`.
///
/// The vocabulary check runs before the length check.
pub fn validate(question: Question, answer: &str) -> Result<(), Rejection> {
    match question.answer_kind() {
        AnswerKind::Closed { options } => {
            let lowered = answer.to_lowercase();
            if !options.iter().any(|opt| lowered.contains(opt)) {
                return Err(Rejection::OutOfVocabulary);
            }
        }
        AnswerKind::Open { needs_elaboration } => {
            if needs_elaboration && answer.split_whitespace().count() < 2 {
                return Err(Rejection::TooShort);
            }
        }
    }
    Ok(())
}

/// First matching reaction for `answer`, in priority order.
///
/// Only the current answer is inspected, never earlier ones.
pub fn reaction_for(answer: &str) -> Option<Reaction> {
    let lowered = answer.to_lowercase();
    if lowered.contains("finance") {
        Some(Reaction::Finance)
    } else if lowered.contains("healthcare") {
        Some(Reaction::Healthcare)
    } else if lowered.contains("python") && lowered.contains("high") {
        Some(Reaction::PythonConfidence)
    } else {
        None
    }
}
