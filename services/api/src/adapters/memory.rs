//! services/api/src/adapters/memory.rs
//!
//! In-process implementations of the store and relay ports for the integration
//! tests. Only compiled under `cfg(test)` or the `test-support` feature.

use async_trait::async_trait;
use chrono::Utc;
use qa_relay_core::domain::{Channel, NewQuestion, NotificationEvent, Question, User, UserCredentials};
use qa_relay_core::ports::{DatabaseService, PortError, PortResult, RealtimeRelay};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// InMemoryDatabase
//=========================================================================================

#[derive(Default)]
struct Tables {
    users: Vec<(User, String)>,
    // Insertion sequence breaks ties between equal timestamps.
    questions: Vec<(u64, Question)>,
    next_seq: u64,
}

/// A `DatabaseService` kept in memory. `set_unavailable(true)` makes every call fail.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    pub async fn question(&self, id: Uuid) -> Option<Question> {
        self.tables
            .lock()
            .await
            .questions
            .iter()
            .find(|(_, q)| q.id == id)
            .map(|(_, q)| q.clone())
    }

    fn check_available(&self) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|(user, _)| user.email == email)
            .map(|(user, hash)| UserCredentials {
                id: user.id,
                email: user.email.clone(),
                hashed_password: hash.clone(),
            }))
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|(user, _)| user.email == email) {
            return Err(PortError::Conflict("Email already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push((user.clone(), hashed_password.to_string()));
        Ok(user)
    }

    async fn list_unanswered_questions(&self) -> PortResult<Vec<Question>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        let mut open: Vec<_> = tables
            .questions
            .iter()
            .filter(|(_, q)| !q.is_answered())
            .collect();
        open.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(open.into_iter().map(|(_, q)| q.clone()).collect())
    }

    async fn create_question(&self, question: NewQuestion) -> PortResult<Question> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let stored = Question {
            id: Uuid::new_v4(),
            user_id: question.user_id,
            email: question.email,
            content: question.content,
            ip: question.ip,
            answer: None,
            created_at: Utc::now(),
        };
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.questions.push((seq, stored.clone()));
        Ok(stored)
    }

    async fn answer_question(&self, question_id: Uuid, answer: &str) -> PortResult<Question> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let (_, question) = tables
            .questions
            .iter_mut()
            .find(|(_, q)| q.id == question_id)
            .ok_or_else(|| PortError::NotFound(format!("Question {} not found", question_id)))?;

        if question.is_answered() {
            return Err(PortError::Conflict(format!(
                "Question {} has already been answered",
                question_id
            )));
        }
        question.answer = Some(answer.to_string());
        Ok(question.clone())
    }
}

//=========================================================================================
// RecordingRelay
//=========================================================================================

/// A `RealtimeRelay` that records every publish instead of sending it.
#[derive(Default)]
pub struct RecordingRelay {
    events: Mutex<Vec<NotificationEvent>>,
    failing: std::sync::RwLock<Vec<Channel>>,
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later publish to `channel` fail. Failed publishes are not recorded.
    pub fn fail_channel(&self, channel: Channel) {
        if let Ok(mut failing) = self.failing.write() {
            failing.push(channel);
        }
    }

    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().await.clone()
    }

    pub async fn events_on(&self, channel: Channel) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.channel == channel)
            .cloned()
            .collect()
    }

    fn is_failing(&self, channel: Channel) -> bool {
        self.failing
            .read()
            .map(|failing| failing.contains(&channel))
            .unwrap_or(false)
    }
}

#[async_trait]
impl RealtimeRelay for RecordingRelay {
    async fn publish(&self, event: &NotificationEvent) -> PortResult<()> {
        if self.is_failing(event.channel) {
            return Err(PortError::Unexpected(format!(
                "relay rejected publish on {}",
                event.channel
            )));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }

    fn authorize_subscription(&self, socket_id: &str, channel_name: &str) -> PortResult<String> {
        Ok(format!("recording:{}:{}", socket_id, channel_name))
    }
}
