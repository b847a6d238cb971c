//! Per-attendee intake sessions and the store that holds them.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use super::model::Identity;
use super::script::{QUESTION_COUNT, Question};

/// Progress of one attendee through the question script.
///
/// `responses.len() == step` holds at all times; the only mutator is
/// [`Session::accept`].
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    step: usize,
    responses: Vec<String>,
    identity: Option<Identity>,
}

impl Session {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            step: 0,
            responses: Vec::with_capacity(QUESTION_COUNT),
            identity,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The outstanding question, or `None` once all answers are in.
    pub fn current_question(&self) -> Option<Question> {
        Question::at(self.step)
    }

    pub fn is_complete(&self) -> bool {
        self.step >= QUESTION_COUNT
    }

    /// Record an accepted answer and advance one step.
    ///
    /// Returns the new step. A completed session ignores further answers.
    pub fn accept(&mut self, answer: impl Into<String>) -> usize {
        if !self.is_complete() {
            self.responses.push(answer.into());
            self.step += 1;
        }
        self.step
    }
}

/// Storage for in-flight sessions, keyed by an opaque user id.
///
/// Reads and writes are individually atomic, but nothing serialises a
/// get → modify → save cycle for one user. Two concurrent requests for the
/// same id can overwrite each other's progress.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Return the session for `user_id`, creating it at step 0 with
    /// `identity` when unseen. The flag is `true` when it was just created.
    async fn get_or_create(&self, user_id: &str, identity: Option<Identity>) -> (Session, bool);

    /// Overwrite the stored session for `user_id`.
    async fn save(&self, user_id: &str, session: Session);

    /// Drop the session for `user_id`, returning it if present.
    async fn remove(&self, user_id: &str) -> Option<Session>;

    /// Drop every session.
    async fn clear(&self);

    /// Number of in-flight sessions.
    async fn len(&self) -> usize;
}

/// Process-local session store. No eviction or TTL.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session, for inspection.
    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, user_id: &str, identity: Option<Identity>) -> (Session, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(user_id) {
            return (existing.clone(), false);
        }
        let session = Session::new(identity);
        sessions.insert(user_id.to_string(), session.clone());
        tracing::debug!(user_id, "Created intake session");
        (session, true)
    }

    async fn save(&self, user_id: &str, session: Session) {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), session);
    }

    async fn remove(&self, user_id: &str) -> Option<Session> {
        self.sessions.write().await.remove(user_id)
    }

    async fn clear(&self) {
        let mut sessions = self.sessions.write().await;
        let dropped = sessions.len();
        sessions.clear();
        tracing::info!(dropped, "Cleared all intake sessions");
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
