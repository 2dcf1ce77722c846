use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::serve_on;
use crate::core::app::AppContext;
use crate::core::config::Config;
use crate::core::secrets::ResolvedSecrets;
use crate::core::session::test_support::{RecordingMailer, ScriptedResponder};

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(responder: ScriptedResponder, mailer: Arc<RecordingMailer>) -> Self {
        let config = Config {
            mail: crate::core::config::data::MailSection {
                fallback_recipient: Some("owner@example.org".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let app = AppContext::new(
            config,
            ResolvedSecrets::default(),
            Arc::new(responder),
            mailer,
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        tokio::spawn(serve_on(listener, app, shutdown.clone()));
        Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn create_session(&self) -> String {
        let body: Value = self
            .client
            .post(self.url("/api/sessions"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn post(&self, id: &str, content: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/sessions/{id}/messages")))
            .json(&json!({ "content": content }))
            .send()
            .await
            .unwrap()
    }

    async fn view(&self, id: &str) -> Value {
        self.client
            .get(self.url(&format!("/api/sessions/{id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[tokio::test]
async fn health_reports_chat_state() {
    let server = TestServer::start(
        ScriptedResponder::replying("hi"),
        Arc::new(RecordingMailer::new(true)),
    )
    .await;
    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["chat_enabled"], true);
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn message_round_trip_updates_counts() {
    let server = TestServer::start(
        ScriptedResponder::replying("Systems nominal."),
        Arc::new(RecordingMailer::new(true)),
    )
    .await;
    let id = server.create_session().await;
    assert_eq!(id.len(), 32);

    let response = server.post(&id, "  status report  ").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "Systems nominal.");
    assert!(body["email"].is_null());
    assert_eq!(body["counts"], json!({ "user": 1, "assistant": 1 }));

    let view = server.view(&id).await;
    let turns = view["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "status report");
    assert_eq!(turns[1]["role"], "assistant");
}

#[tokio::test]
async fn email_intent_reports_delivery_in_reply() {
    let mailer = Arc::new(RecordingMailer::new(true));
    let server = TestServer::start(ScriptedResponder::replying("Done."), mailer.clone()).await;
    let id = server.create_session().await;

    let body: Value = server
        .post(&id, "send email to alice@example.com saying hi")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["email"]["ok"], true);
    assert_eq!(
        body["reply"],
        "Done.\n\n📧 Email sent to alice@example.com"
    );
    assert_eq!(mailer.sent.lock().unwrap()[0].0, "alice@example.com");
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let server = TestServer::start(
        ScriptedResponder::replying("unused"),
        Arc::new(RecordingMailer::new(true)),
    )
    .await;
    let id = server.create_session().await;
    let response = server.post(&id, "   ").await;
    assert_eq!(response.status(), 400);
    assert_eq!(server.view(&id).await["turns"], json!([]));
}

#[tokio::test]
async fn missing_api_key_is_service_unavailable() {
    let responder = ScriptedResponder {
        configured: false,
        ..ScriptedResponder::replying("unused")
    };
    let server = TestServer::start(responder, Arc::new(RecordingMailer::new(true))).await;
    let id = server.create_session().await;
    let response = server.post(&id, "hello").await;
    assert_eq!(response.status(), 503);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn sessions_are_isolated_and_purged_independently() {
    let server = TestServer::start(
        ScriptedResponder::replying("ack"),
        Arc::new(RecordingMailer::new(true)),
    )
    .await;
    let first = server.create_session().await;
    let second = server.create_session().await;
    assert_ne!(first, second);

    server.post(&first, "one").await;
    server.post(&first, "two").await;
    server.post(&second, "three").await;
    assert_eq!(server.view(&first).await["counts"]["user"], 2);
    assert_eq!(server.view(&second).await["counts"]["user"], 1);

    let purged: Value = server
        .client
        .delete(server.url(&format!("/api/sessions/{first}/turns")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(purged["turns"], json!([]));
    assert_eq!(server.view(&first).await["counts"], json!({ "user": 0, "assistant": 0 }));
    assert_eq!(server.view(&second).await["turns"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_session_reads_as_empty() {
    let server = TestServer::start(
        ScriptedResponder::replying("ack"),
        Arc::new(RecordingMailer::new(true)),
    )
    .await;
    let view = server.view("does-not-exist").await;
    assert_eq!(view["id"], "does-not-exist");
    assert_eq!(view["turns"], json!([]));
}

#[tokio::test]
async fn posts_to_unknown_ids_are_rejected_without_registering() {
    let server = TestServer::start(
        ScriptedResponder::replying("ack"),
        Arc::new(RecordingMailer::new(true)),
    )
    .await;

    for i in 0..20 {
        let content = if i % 2 == 0 { "   " } else { "hello" };
        let response = server.post(&format!("made-up-{i}"), content).await;
        assert_eq!(response.status(), 404);
    }

    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["sessions"], 0);
}

#[tokio::test]
async fn deleted_sessions_are_forgotten() {
    let server = TestServer::start(
        ScriptedResponder::replying("ack"),
        Arc::new(RecordingMailer::new(true)),
    )
    .await;
    let id = server.create_session().await;
    server.post(&id, "hello").await;

    let url = server.url(&format!("/api/sessions/{id}"));
    let response = server.client.delete(&url).send().await.unwrap();
    assert_eq!(response.status(), 204);
    assert_eq!(server.client.delete(&url).send().await.unwrap().status(), 404);

    assert_eq!(server.post(&id, "hello again").await.status(), 404);
    assert_eq!(server.view(&id).await["turns"], json!([]));
}
