//! IntakeFlow: drives one attendee through the question script and
//! persists the answers on completion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Identity;
use super::script::Question;
use super::session::SessionStore;
use super::validator::{CLOSING_MESSAGE, Rejection, reaction_for, validate};
use crate::error::PersistenceError;
use crate::store::{ResponseRecord, ResponseStore};

/// An inbound intake message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum IntakeRequest {
    /// Explicit start signal from the client; greets the attendee.
    StartSession,
    /// An answer to the outstanding question.
    Answer(String),
}

/// What a call to [`IntakeFlow::respond`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A new session was created; the reply is the first question.
    Started,
    /// Start signal for a session already in progress; the current question is repeated.
    Reprompted { step: usize },
    /// The answer failed validation; nothing changed.
    Rejected(Rejection),
    /// The answer was accepted and the next question asked.
    Advanced { step: usize },
    /// The final answer was accepted and the record persisted.
    Completed { record_id: Uuid },
    /// The stored session had already answered everything; it was dropped
    /// and the closing message repeated.
    AlreadyComplete,
}

/// Reply text plus the outcome behind it.
#[derive(Debug, Clone)]
pub struct IntakeReply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl IntakeReply {
    fn new(text: impl Into<String>, outcome: ReplyOutcome) -> Self {
        Self {
            text: text.into(),
            outcome,
        }
    }
}

/// Coordinates the intake conversation: session lookup, validation,
/// reactions, and persistence.
pub struct IntakeFlow {
    sessions: Arc<dyn SessionStore>,
    responses: Arc<dyn ResponseStore>,
}

impl IntakeFlow {
    pub fn new(sessions: Arc<dyn SessionStore>, responses: Arc<dyn ResponseStore>) -> Self {
        Self {
            sessions,
            responses,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn responses(&self) -> &Arc<dyn ResponseStore> {
        &self.responses
    }

    /// Handle one message from `user_id`.
    ///
    /// 1. Look up or create the session. First contact always gets the first
    ///    question, whatever the message was.
    /// 2. Validate the answer against the outstanding question.
    /// 3. Accept it and compute the reaction.
    /// 4. Ask the next question, or persist and close the session.
    ///
    /// Only a persistence failure is an error. In that case the final answer
    /// is not accepted and the session stays at the last question.
    pub async fn respond(
        &self,
        user_id: &str,
        request: IntakeRequest,
        identity: Option<Identity>,
    ) -> Result<IntakeReply, PersistenceError> {
        let (mut session, created) = self.sessions.get_or_create(user_id, identity).await;

        let Some(question) = session.current_question() else {
            // A stored session is removed as soon as it completes, so this
            // only happens with a store that was populated externally.
            tracing::warn!(user_id, "Dropping already-complete intake session");
            self.sessions.remove(user_id).await;
            return Ok(IntakeReply::new(CLOSING_MESSAGE, ReplyOutcome::AlreadyComplete));
        };

        if created {
            tracing::info!(user_id, "Intake session started");
            return Ok(IntakeReply::new(
                greeting(&request, session.identity(), question),
                ReplyOutcome::Started,
            ));
        }

        let answer = match request {
            IntakeRequest::StartSession => {
                return Ok(IntakeReply::new(
                    greeting(&request, session.identity(), question),
                    ReplyOutcome::Reprompted {
                        step: session.step(),
                    },
                ));
            }
            IntakeRequest::Answer(text) => text,
        };

        if let Err(rejection) = validate(question, &answer) {
            tracing::debug!(user_id, %question, ?rejection, "Intake answer rejected");
            return Ok(IntakeReply::new(
                rejection.message(),
                ReplyOutcome::Rejected(rejection),
            ));
        }

        let reaction = reaction_for(&answer).map(|r| r.text()).unwrap_or("");

        match question.next() {
            Some(next) => {
                let step = session.accept(answer);
                self.sessions.save(user_id, session).await;
                tracing::debug!(user_id, step, "Intake answer accepted");
                Ok(IntakeReply::new(
                    format!("{reaction}{}", next.prompt()),
                    ReplyOutcome::Advanced { step },
                ))
            }
            None => {
                let mut answers = session.responses().to_vec();
                answers.push(answer);
                let record = ResponseRecord::new(answers, session.identity().cloned());

                if let Err(e) = self.responses.append(&record).await {
                    tracing::error!(user_id, error = %e, "Failed to persist intake response");
                    return Err(e);
                }

                self.sessions.remove(user_id).await;
                tracing::info!(user_id, record_id = %record.id, "Intake session completed");
                Ok(IntakeReply::new(
                    format!("{reaction}{CLOSING_MESSAGE}"),
                    ReplyOutcome::Completed {
                        record_id: record.id,
                    },
                ))
            }
        }
    }

    /// Wipe every in-flight session and the durable store.
    ///
    /// Sessions are dropped first, so they are gone even when the store
    /// cannot be deleted.
    pub async fn reset(&self) -> Result<(), PersistenceError> {
        self.sessions.clear().await;
        self.responses.reset().await
    }
}

/// First-contact reply: the outstanding question, greeted by name when the
/// client sent the explicit start signal.
fn greeting(request: &IntakeRequest, identity: Option<&Identity>, question: Question) -> String {
    match request {
        IntakeRequest::StartSession => {
            let name = identity.map(Identity::display_name).unwrap_or("there");
            format!("Hi {name}! {}", question.prompt())
        }
        IntakeRequest::Answer(_) => question.prompt().to_string(),
    }
}
