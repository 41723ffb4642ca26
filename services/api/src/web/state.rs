//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::error::ApiError;
use qa_relay_core::domain::Identity;
use qa_relay_core::notify::AnswerNotifier;
use qa_relay_core::ports::{DatabaseService, RealtimeRelay, SessionTokenService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tokens: Arc<dyn SessionTokenService>,
    pub relay: Arc<dyn RealtimeRelay>,
    pub notifier: AnswerNotifier,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        tokens: Arc<dyn SessionTokenService>,
        relay: Arc<dyn RealtimeRelay>,
    ) -> Self {
        Self {
            notifier: AnswerNotifier::new(relay.clone()),
            db,
            config,
            tokens,
            relay,
        }
    }

    /// With no admins configured, every authenticated identity is an admin.
    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.config.admin_emails.is_empty()
            || self.config.admin_emails.iter().any(|e| e == &identity.email)
    }

    pub fn require_admin(&self, identity: &Identity) -> Result<(), ApiError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }
}
