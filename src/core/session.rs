//! Per-session turn orchestration.
//!
//! A turn moves RECEIVED → RESPONDING → (SENDING) → DONE. The reply and the
//! optional email run independently; both outcomes end up in the single
//! assistant turn recorded at DONE.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::conversation::{ConversationStore, RoleCounts, DEFAULT_CONTEXT_TURNS};
use crate::core::intent::{Intent, IntentParser};
use crate::core::message::{Role, Turn};
use crate::core::notify::{EmailResult, Mailer};
use crate::core::responder::Responder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Received,
    Responding,
    Sending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub email: Option<EmailResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    EmptyInput,
    NotConfigured,
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::EmptyInput => write!(f, "Message is empty"),
            TurnError::NotConfigured => write!(
                f,
                "OPENAI_API_KEY not found in the secrets file, keyring, environment, or config defaults"
            ),
        }
    }
}

impl std::error::Error for TurnError {}

/// Line appended to the reply describing what happened to the email.
pub fn email_status_line(result: &EmailResult) -> String {
    if result.ok {
        format!("📧 {}", result.message)
    } else {
        format!("📧 Email failed: {}", result.message)
    }
}

pub struct ChatSession {
    store: ConversationStore,
    responder: Arc<dyn Responder>,
    mailer: Arc<dyn Mailer>,
    parser: IntentParser,
    context_turns: usize,
    in_flight: Mutex<()>,
}

impl ChatSession {
    pub fn new(
        responder: Arc<dyn Responder>,
        mailer: Arc<dyn Mailer>,
        parser: IntentParser,
    ) -> Self {
        Self {
            store: ConversationStore::new(),
            responder,
            mailer,
            parser,
            context_turns: DEFAULT_CONTEXT_TURNS,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_context_turns(mut self, context_turns: usize) -> Self {
        self.context_turns = context_turns;
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.store.turns()
    }

    pub fn counts(&self) -> RoleCounts {
        self.store.counts()
    }

    /// Clear the log once any in-flight turn has finished, so a purge never
    /// splits a user turn from its reply.
    pub async fn purge(&self) {
        let _guard = self.in_flight.lock().await;
        self.store.purge();
    }

    pub fn is_configured(&self) -> bool {
        self.responder.is_configured()
    }

    /// Run one user turn to completion.
    ///
    /// Rejected turns leave the log untouched. Accepted turns always add one
    /// user turn and one assistant turn, even when the model call or the
    /// email fails.
    pub async fn handle_turn(&self, text: &str) -> Result<TurnOutcome, TurnError> {
        let _guard = self.in_flight.lock().await;
        debug!(phase = ?TurnPhase::Received, "turn received");

        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::EmptyInput);
        }
        if !self.responder.is_configured() {
            return Err(TurnError::NotConfigured);
        }

        let intent = self.parser.classify(text);
        let window = self.store.window(self.context_turns);
        self.store.append(Role::User, text);

        debug!(phase = ?TurnPhase::Responding, context = window.len(), "requesting reply");
        let mut reply = self.responder.respond(&window, text).await;

        let email = match intent {
            Intent::SendEmail(email) => {
                debug!(phase = ?TurnPhase::Sending, to = %email.recipient, "dispatching email");
                let result = self
                    .mailer
                    .send(&email.recipient, &email.subject, &email.body)
                    .await;
                reply.push_str("\n\n");
                reply.push_str(&email_status_line(&result));
                Some(result)
            }
            Intent::Chat => None,
        };

        self.store.append(Role::Assistant, reply.clone());
        debug!(phase = ?TurnPhase::Done, "turn complete");
        Ok(TurnOutcome { reply, email })
    }
}
