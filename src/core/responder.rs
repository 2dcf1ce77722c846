use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::core::config::Config;
use crate::core::message::{Role, Turn};
use crate::utils::url::construct_api_url;

/// Leading text of every reply produced from a failed completion call.
pub const ERROR_REPLY_PREFIX: &str = "An error occurred";

/// Produces the assistant reply for one user turn.
///
/// Implementations never fail: errors come back as reply text.
#[async_trait]
pub trait Responder: Send + Sync {
    /// False when a required credential is missing and no call can succeed.
    fn is_configured(&self) -> bool;

    async fn respond(&self, window: &[Turn], user_text: &str) -> String;
}

#[derive(Debug)]
pub enum ResponderError {
    MissingApiKey,
    Transport(reqwest::Error),
    Api { status: u16, body: String },
    Decode(reqwest::Error),
    NoChoices,
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderError::MissingApiKey => write!(f, "OPENAI_API_KEY is not configured"),
            ResponderError::Transport(err) => write!(f, "request failed: {err}"),
            ResponderError::Api { status, body } => {
                write!(f, "API returned {status}: {}", summarize_api_error(body))
            }
            ResponderError::Decode(err) => write!(f, "unreadable API response: {err}"),
            ResponderError::NoChoices => write!(f, "API response contained no choices"),
        }
    }
}

impl std::error::Error for ResponderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResponderError::Transport(err) | ResponderError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// One-line description of an error body, preferring the JSON `error.message`.
fn summarize_api_error(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Ordered request messages: persona, context window, then the new user text.
pub fn build_messages(persona: &str, window: &[Turn], user_text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(window.len() + 2);
    messages.push(ChatMessage::new(Role::System, persona));
    messages.extend(window.iter().map(ChatMessage::from));
    messages.push(ChatMessage::new(Role::User, user_text));
    messages
}

pub fn error_reply(err: &ResponderError) -> String {
    format!("{ERROR_REPLY_PREFIX}: {err}")
}

/// OpenAI-compatible chat-completion client.
#[derive(Clone)]
pub struct ChatResponder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    persona: String,
}

impl ChatResponder {
    pub fn from_config(config: &Config, client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: config.base_url(),
            api_key: api_key.into(),
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            persona: config.persona().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn try_respond(
        &self,
        window: &[Turn],
        user_text: &str,
    ) -> Result<String, ResponderError> {
        if self.api_key.trim().is_empty() {
            return Err(ResponderError::MissingApiKey);
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(&self.persona, window, user_text),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(construct_api_url(&self.base_url, "chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ResponderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ResponderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(ResponderError::Decode)?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(ResponderError::NoChoices)
    }
}

#[async_trait]
impl Responder for ChatResponder {
    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn respond(&self, window: &[Turn], user_text: &str) -> String {
        match self.try_respond(window, user_text).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "completion request failed");
                error_reply(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::data::ChatSection;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn responder_for(server: &MockServer, api_key: &str) -> ChatResponder {
        let config = Config {
            chat: ChatSection {
                base_url: Some(server.uri()),
                persona: Some("persona".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        ChatResponder::from_config(&config, reqwest::Client::new(), api_key)
    }

    fn window() -> Vec<Turn> {
        vec![
            Turn::with_timestamp(Role::User, "earlier question", "10:00:00"),
            Turn::with_timestamp(Role::Assistant, "earlier answer", "10:00:01"),
        ]
    }

    #[test]
    fn messages_are_persona_then_window_then_user() {
        let messages = build_messages("persona", &window(), "now");
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(messages[0].content, "persona");
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[3].content, "now");
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.7,
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "earlier question"},
                    {"role": "assistant", "content": "earlier answer"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "first"}},
                    {"message": {"role": "assistant", "content": "second"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = responder_for(&server, "sk-test")
            .respond(&window(), "hello")
            .await;
        assert_eq!(reply, "first");
    }

    #[tokio::test]
    async fn api_failure_becomes_error_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached", "type": "rate_limit"}
            })))
            // One request from try_respond, one from respond.
            .expect(2)
            .mount(&server)
            .await;

        let responder = responder_for(&server, "sk-test");
        let err = responder.try_respond(&[], "hi").await.unwrap_err();
        assert!(matches!(err, ResponderError::Api { status: 429, .. }));

        let reply = responder.respond(&[], "hi").await;
        assert!(reply.starts_with(ERROR_REPLY_PREFIX));
        assert!(reply.contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn malformed_body_and_empty_choices_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let responder = responder_for(&server, "sk-test");
        assert!(matches!(
            responder.try_respond(&[], "hi").await,
            Err(ResponderError::NoChoices)
        ));
        assert!(matches!(
            responder.try_respond(&[], "hi").await,
            Err(ResponderError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_does_not_panic() {
        let config = Config {
            chat: ChatSection {
                base_url: Some("http://127.0.0.1:9/v1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let responder = ChatResponder::from_config(&config, reqwest::Client::new(), "sk-test");
        let reply = responder.respond(&[], "hi").await;
        assert!(reply.starts_with(ERROR_REPLY_PREFIX));
    }

    #[tokio::test]
    async fn missing_key_is_reported_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let responder = responder_for(&server, "  ");
        assert!(!responder.is_configured());
        let reply = responder.respond(&[], "hi").await;
        assert!(reply.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn summaries_prefer_json_error_message() {
        assert_eq!(
            summarize_api_error(r#"{"error":{"message":"model   overloaded"}}"#),
            "model overloaded"
        );
        assert_eq!(summarize_api_error(r#"{"error":"bad key"}"#), "bad key");
        assert_eq!(summarize_api_error("<html>\n oops</html>"), "<html> oops</html>");
        assert_eq!(summarize_api_error("   "), "<empty>");
    }
}
