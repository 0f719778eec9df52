//! Best-effort conversation logging
//!
//! Each answered request appends one [`Interaction`]. Failures and slow
//! writes are logged and dropped; the caller only ever sees a [`LogOutcome`].

use crate::db::{Database, DbError, Interaction};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Storage for logged interactions
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Persist one interaction
    async fn put_interaction(&self, interaction: &Interaction) -> Result<(), String>;
}

#[async_trait]
impl<T: InteractionStore + ?Sized> InteractionStore for Arc<T> {
    async fn put_interaction(&self, interaction: &Interaction) -> Result<(), String> {
        (**self).put_interaction(interaction).await
    }
}

#[async_trait]
impl InteractionStore for Database {
    async fn put_interaction(&self, interaction: &Interaction) -> Result<(), String> {
        let db = self.clone();
        let interaction = interaction.clone();
        tokio::task::spawn_blocking(move || db.record_interaction(&interaction))
            .await
            .map_err(|e| DbError::Join(e.to_string()))
            .and_then(|result| result)
            .map_err(|e| e.to_string())
    }
}

/// Result of a logging attempt. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    Recorded,
    Dropped(String),
}

/// Appends interactions to a store with a bounded wait
pub struct ConversationLogger {
    store: Arc<dyn InteractionStore>,
    write_timeout: Duration,
}

impl ConversationLogger {
    pub fn new(store: Arc<dyn InteractionStore>, write_timeout: Duration) -> Self {
        Self {
            store,
            write_timeout,
        }
    }

    /// Log one exchange stamped with the current time.
    pub async fn log(&self, session_id: &str, question: &str, answer: &str) -> LogOutcome {
        let interaction = Interaction::new(
            session_id,
            question,
            answer,
            chrono::Utc::now().timestamp(),
        );
        self.log_interaction(&interaction).await
    }

    pub async fn log_interaction(&self, interaction: &Interaction) -> LogOutcome {
        // A timed-out write keeps running on the blocking pool and may still land
        match timeout(self.write_timeout, self.store.put_interaction(interaction)).await {
            Ok(Ok(())) => {
                tracing::debug!(
                    session_id = %interaction.session_id,
                    conversation_id = %interaction.conversation_id(),
                    "Interaction recorded"
                );
                LogOutcome::Recorded
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    session_id = %interaction.session_id,
                    error = %e,
                    "Failed to record interaction"
                );
                LogOutcome::Dropped(e)
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %interaction.session_id,
                    timeout_ms = %self.write_timeout.as_millis(),
                    "Interaction write timed out"
                );
                LogOutcome::Dropped(format!(
                    "write timed out after {}ms",
                    self.write_timeout.as_millis()
                ))
            }
        }
    }
}
