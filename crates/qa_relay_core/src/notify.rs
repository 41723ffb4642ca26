//! crates/qa_relay_core/src/notify.rs
//!
//! The notification fan-out service. It turns "the user is being typed at" and
//! "this answer is final" into publishes on the relay, and reports which of
//! those publishes did not go through.

use crate::domain::{Channel, NotificationEvent};
use crate::ports::{PortError, RealtimeRelay};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A request to push updates for one user. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct NotifyCommand {
    pub user_id: Uuid,
    pub text: Option<String>,
    pub answer: Option<String>,
}

/// A publish that the relay rejected or never acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPublish {
    pub channel: Channel,
    pub event: &'static str,
    pub error: PortError,
}

/// The outcome of one or more publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub published: usize,
    pub failures: Vec<FailedPublish>,
}

impl DeliveryReport {
    /// True when every attempted publish succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{} on {}: {}", f.event, f.channel, f.error))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn merge(&mut self, other: DeliveryReport) {
        self.published += other.published;
        self.failures.extend(other.failures);
    }
}

/// Fans answers out to the asking user and mirrors them to the admin channel.
#[derive(Clone)]
pub struct AnswerNotifier {
    relay: Arc<dyn RealtimeRelay>,
}

impl AnswerNotifier {
    pub fn new(relay: Arc<dyn RealtimeRelay>) -> Self {
        Self { relay }
    }

    /// Publishes a progressive `typing` update to the user's private channel.
    pub async fn publish_typing(&self, user_id: Uuid, text: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        self.attempt(&mut report, NotificationEvent::typing(user_id, text))
            .await;
        report
    }

    /// Delivers a final answer: `final` to the user, then `answer-sent` to admins.
    ///
    /// The admin mirror is attempted even when the user publish fails.
    pub async fn deliver_answer(&self, user_id: Uuid, answer: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        self.attempt(&mut report, NotificationEvent::final_answer(user_id, answer))
            .await;
        self.attempt(&mut report, NotificationEvent::answer_sent(user_id, answer))
            .await;

        if report.is_complete() {
            info!("Answer delivered to user {}", user_id);
        }
        report
    }

    /// Evaluates `text` and `answer` independently; typing always goes first.
    pub async fn notify(&self, command: NotifyCommand) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if let Some(text) = command.text.as_deref().filter(|t| !t.is_empty()) {
            report.merge(self.publish_typing(command.user_id, text).await);
        }
        if let Some(answer) = command.answer.as_deref().filter(|a| !a.is_empty()) {
            report.merge(self.deliver_answer(command.user_id, answer).await);
        }

        report
    }

    async fn attempt(&self, report: &mut DeliveryReport, event: NotificationEvent) {
        match self.relay.publish(&event).await {
            Ok(()) => report.published += 1,
            Err(error) => {
                warn!(
                    "Failed to publish '{}' on {}: {}",
                    event.name(),
                    event.channel,
                    error
                );
                report.failures.push(FailedPublish {
                    channel: event.channel,
                    event: event.name(),
                    error,
                });
            }
        }
    }
}
