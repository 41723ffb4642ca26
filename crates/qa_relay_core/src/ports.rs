//! crates/qa_relay_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the relational store, the token scheme and the pub/sub relay.

use crate::domain::{Identity, NewQuestion, NotificationEvent, Question, User, UserCredentials};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Exact, case-sensitive email lookup.
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    /// Fails with `PortError::Conflict` when the email is already taken.
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    // --- Questions ---
    /// All questions with no answer yet, newest first.
    async fn list_unanswered_questions(&self) -> PortResult<Vec<Question>>;

    async fn create_question(&self, question: NewQuestion) -> PortResult<Question>;

    /// Sets the answer only if the question has none yet.
    ///
    /// Unknown ids yield `NotFound`; an already answered question yields `Conflict`.
    async fn answer_question(&self, question_id: Uuid, answer: &str) -> PortResult<Question>;
}

#[async_trait]
pub trait SessionTokenService: Send + Sync {
    /// Issues a signed, self-contained token for the given user.
    async fn issue(&self, user_id: Uuid, email: &str) -> PortResult<String>;

    /// Checks signature and expiry. Any failure is `PortError::Unauthorized`.
    async fn verify(&self, token: &str) -> PortResult<Identity>;
}

#[async_trait]
pub trait RealtimeRelay: Send + Sync {
    /// Publishes one event to one channel. Delivery is best effort.
    async fn publish(&self, event: &NotificationEvent) -> PortResult<()>;

    /// Signs a subscription to a private channel for the given socket.
    fn authorize_subscription(&self, socket_id: &str, channel_name: &str) -> PortResult<String>;
}
