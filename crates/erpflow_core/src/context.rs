//! Execution context passed through a transition to its validator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-request context for a transition attempt.
///
/// The engine never inspects it; validators use it to honour cancellation
/// and to see who is asking.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    /// Identifier for correlating log lines of one request
    pub request_id: Uuid,
    /// User or service requesting the transition
    pub actor: Option<String>,
    /// When the context was created
    pub created_at: DateTime<Utc>,
    /// Free-form values for validators (tenant, locale, ...)
    pub metadata: HashMap<String, serde_json::Value>,
    cancellation: CancellationToken,
}

impl Default for TransitionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: None,
            created_at: Utc::now(),
            metadata: HashMap::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context that is cancelled together with `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            ..Self::new()
        }
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}
