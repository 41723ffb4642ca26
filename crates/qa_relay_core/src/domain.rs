//! crates/qa_relay_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

// Represents a registered user - safe to hand out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A verified caller, produced from a session token by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// A submitted question. `answer` stays `None` until it is answered exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub content: String,
    pub ip: Option<String>,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// The fields a caller supplies when submitting a question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub user_id: Uuid,
    pub email: String,
    pub content: String,
    pub ip: Option<String>,
}

//=========================================================================================
// Realtime Notification Types
//=========================================================================================

/// A pub/sub channel, addressed by naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// `private-{user_id}`: delivery to a single asking user.
    User(Uuid),
    /// `private-admin`: the shared channel all admins observe.
    Admin,
}

impl Channel {
    pub const ADMIN_NAME: &'static str = "private-admin";
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::User(user_id) => write!(f, "private-{}", user_id),
            Channel::Admin => f.write_str(Self::ADMIN_NAME),
        }
    }
}

/// The content of a notification. The relay adapter decides the wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// Partial text of an answer still being written.
    Typing { text: String },
    /// The complete answer.
    Final { answer: String },
    /// Admin mirror of a delivered answer.
    AnswerSent { user_id: Uuid, answer: String },
}

/// An ephemeral, non-persisted message for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub channel: Channel,
    pub payload: EventPayload,
}

impl NotificationEvent {
    pub fn typing(user_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            channel: Channel::User(user_id),
            payload: EventPayload::Typing { text: text.into() },
        }
    }

    pub fn final_answer(user_id: Uuid, answer: impl Into<String>) -> Self {
        Self {
            channel: Channel::User(user_id),
            payload: EventPayload::Final {
                answer: answer.into(),
            },
        }
    }

    pub fn answer_sent(user_id: Uuid, answer: impl Into<String>) -> Self {
        Self {
            channel: Channel::Admin,
            payload: EventPayload::AnswerSent {
                user_id,
                answer: answer.into(),
            },
        }
    }

    /// The event name subscribers bind to.
    pub fn name(&self) -> &'static str {
        match self.payload {
            EventPayload::Typing { .. } | EventPayload::Final { .. } => "ai-answer",
            EventPayload::AnswerSent { .. } => "answer-sent",
        }
    }
}
