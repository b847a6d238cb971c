//! Intake system: the scripted warm-up conversation.
//!
//! Each attendee walks a fixed six-question script exactly once. Answers are
//! validated per question, may trigger a short reaction, and are written to
//! the response store as one row when the last question is answered.

pub mod flow;
pub mod model;
pub mod routes;
pub mod script;
pub mod session;
pub mod validator;

pub use flow::{IntakeFlow, IntakeReply, IntakeRequest, ReplyOutcome};
pub use model::Identity;
pub use routes::{IntakeRouteState, intake_routes};
pub use script::{QUESTION_COUNT, QUESTIONS, Question};
pub use session::{InMemorySessionStore, Session, SessionStore};
pub use validator::{CLOSING_MESSAGE, Reaction, Rejection};
