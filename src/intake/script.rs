//! The fixed question script walked once per attendee.

use serde::{Deserialize, Serialize};

/// Options accepted by the programming-confidence question.
pub const CONFIDENCE_LEVELS: &[&str] = &["low", "medium", "high"];

/// Number of questions in the script.
pub const QUESTION_COUNT: usize = 6;

/// Questions in the order they are asked and persisted.
pub const QUESTIONS: [Question; QUESTION_COUNT] = [
    Question::Expectation,
    Question::Domain,
    Question::ProjectIdea,
    Question::ProgrammingConfidence,
    Question::AiExperience,
    Question::LearningStyle,
];

/// Column names of the answer fields, index-aligned with [`QUESTIONS`].
pub const ANSWER_COLUMNS: [&str; QUESTION_COUNT] = [
    "Expectation",
    "Domain",
    "Project_Idea",
    "Programming_Confidence",
    "AI_Experience",
    "Learning_Style",
];

/// One prompt of the intake script.
///
/// Progresses linearly: Expectation → Domain → ProjectIdea →
/// ProgrammingConfidence → AiExperience → LearningStyle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    Expectation,
    Domain,
    ProjectIdea,
    ProgrammingConfidence,
    AiExperience,
    LearningStyle,
}

/// How an answer to a question is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Free text. `needs_elaboration` rejects single-word answers.
    Open { needs_elaboration: bool },
    /// Must mention one of the listed options (case-insensitive substring).
    Closed { options: &'static [&'static str] },
}

impl Question {
    /// The question asked at `step`, or `None` once the script is exhausted.
    pub fn at(step: usize) -> Option<Question> {
        QUESTIONS.get(step).copied()
    }

    /// 0-based position in the script.
    pub fn index(self) -> usize {
        match self {
            Self::Expectation => 0,
            Self::Domain => 1,
            Self::ProjectIdea => 2,
            Self::ProgrammingConfidence => 3,
            Self::AiExperience => 4,
            Self::LearningStyle => 5,
        }
    }

    pub fn next(self) -> Option<Question> {
        Question::at(self.index() + 1)
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Self::Expectation => "What’s your expectation for today?",
            Self::Domain => "What’s your background domain? (e.g., Finance, Healthcare, Tech)",
            Self::ProjectIdea => "What kind of AI agent do you want to build?",
            Self::ProgrammingConfidence => {
                "How comfortable are you with programming / Python? (Low/Medium/High)"
            }
            Self::AiExperience => "What’s your experience in AI? (Beginner/Intermediate/Advanced)",
            Self::LearningStyle => "Do you prefer hands-on or conceptual explanations?",
        }
    }

    /// Column the answer is persisted under.
    pub fn column(self) -> &'static str {
        ANSWER_COLUMNS[self.index()]
    }

    pub fn answer_kind(self) -> AnswerKind {
        match self {
            Self::ProgrammingConfidence => AnswerKind::Closed {
                options: CONFIDENCE_LEVELS,
            },
            // Short labels like "Finance" or "Beginner" are complete answers here.
            Self::Domain | Self::AiExperience => AnswerKind::Open {
                needs_elaboration: false,
            },
            Self::Expectation | Self::ProjectIdea | Self::LearningStyle => AnswerKind::Open {
                needs_elaboration: true,
            },
        }
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Expectation => "expectation",
            Self::Domain => "domain",
            Self::ProjectIdea => "project_idea",
            Self::ProgrammingConfidence => "programming_confidence",
            Self::AiExperience => "ai_experience",
            Self::LearningStyle => "learning_style",
        };
        write!(f, "{s}")
    }
}
