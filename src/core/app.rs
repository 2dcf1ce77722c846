//! Startup wiring shared by every surface.
//!
//! Secrets are resolved once here; the responder, mailer, and parser built
//! from them are shared read-only by all sessions, while each session gets
//! its own conversation store.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::intent::IntentParser;
use crate::core::notify::{Mailer, NotificationSender};
use crate::core::responder::{ChatResponder, Responder};
use crate::core::secrets::{CredentialResolver, ResolvedSecrets};
use crate::core::session::ChatSession;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub secrets: Arc<ResolvedSecrets>,
    responder: Arc<dyn Responder>,
    mailer: Arc<dyn Mailer>,
    parser: IntentParser,
}

impl AppContext {
    pub fn new(
        config: Config,
        secrets: ResolvedSecrets,
        responder: Arc<dyn Responder>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let fallback = config
            .mail
            .fallback_recipient
            .clone()
            .unwrap_or_else(|| secrets.mail_user().to_string());
        Self {
            config: Arc::new(config),
            secrets: Arc::new(secrets),
            responder,
            mailer,
            parser: IntentParser::new(fallback),
        }
    }

    /// Resolve secrets and build the production responder and mailer.
    pub async fn bootstrap(config: Config, model_override: Option<String>) -> Self {
        let client = reqwest::Client::new();
        let resolver = CredentialResolver::from_config(&config, client.clone());
        let secrets = resolver.resolve_all().await;

        let mut responder = ChatResponder::from_config(&config, client, secrets.api_key());
        if let Some(model) = model_override.filter(|m| !m.trim().is_empty()) {
            responder = responder.with_model(model);
        }
        let mailer =
            NotificationSender::from_config(&config, secrets.mail_user(), secrets.mail_password());

        if !responder.is_configured() {
            warn!("OPENAI_API_KEY is not configured; chat is disabled");
        }
        if !mailer.is_configured() {
            warn!("mail credentials are not configured; email requests will report failure");
        }
        info!(model = %responder.model(), endpoint = %responder.base_url(), "chat backend ready");

        Self::new(config, secrets, Arc::new(responder), Arc::new(mailer))
    }

    pub fn chat_enabled(&self) -> bool {
        self.responder.is_configured()
    }

    pub fn new_session(&self) -> ChatSession {
        ChatSession::new(
            self.responder.clone(),
            self.mailer.clone(),
            self.parser.clone(),
        )
        .with_context_turns(self.config.context_turns())
    }
}
