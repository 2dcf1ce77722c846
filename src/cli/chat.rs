//! Line-oriented interactive chat on stdin/stdout.

use std::error::Error;
use std::path::PathBuf;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::core::app::AppContext;
use crate::core::conversation::RoleCounts;
use crate::core::message::TIMESTAMP_FORMAT;
use crate::core::session::{ChatSession, TurnError};
use crate::utils::logging::TranscriptLog;

#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Blank,
    Purge,
    Stats,
    Quit,
    Unknown(&'a str),
    Message(&'a str),
}

impl<'a> ChatInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ChatInput::Blank;
        }
        match trimmed.strip_prefix('/') {
            Some("purge" | "clear") => ChatInput::Purge,
            Some("stats") => ChatInput::Stats,
            Some("quit" | "exit") => ChatInput::Quit,
            Some(command) if !command.contains(char::is_whitespace) => ChatInput::Unknown(command),
            _ => ChatInput::Message(trimmed),
        }
    }
}

pub fn format_stats(counts: RoleCounts) -> String {
    format!(
        "📊 You: {} messages | AI: {} messages",
        counts.user, counts.assistant
    )
}

pub fn format_reply(reply: &str) -> String {
    format!("[{}] AI: {}", Local::now().format(TIMESTAMP_FORMAT), reply)
}

fn log_recent(transcript: &TranscriptLog, session: &ChatSession) {
    if !transcript.is_active() {
        return;
    }
    for turn in session.store().window(2) {
        if let Err(err) = transcript.log_turn(&turn) {
            warn!(error = %err, "failed to write transcript");
        }
    }
}

pub async fn run_chat(app: AppContext, log: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let transcript = TranscriptLog::new(log)?;
    let session = app.new_session();

    println!("🧠 Neural Interface");
    println!("   model: {}", app.config.model());
    if !app.chat_enabled() {
        eprintln!("❌ Chat is disabled: {}", TurnError::NotConfigured);
    }
    println!("   /purge clears the conversation, /stats shows counts, /quit exits");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ChatInput::parse(&line) {
            ChatInput::Blank => continue,
            ChatInput::Quit => break,
            ChatInput::Stats => println!("{}", format_stats(session.counts())),
            ChatInput::Purge => {
                session.purge().await;
                println!("🗑️  Conversation cleared");
                if let Err(err) = transcript.log_note("conversation purged") {
                    warn!(error = %err, "failed to write transcript");
                }
            }
            ChatInput::Unknown(command) => println!("Unknown command: /{command}"),
            ChatInput::Message(text) => match session.handle_turn(text).await {
                Ok(outcome) => {
                    println!("{}", format_reply(&outcome.reply));
                    println!();
                    log_recent(&transcript, &session);
                }
                Err(err) => eprintln!("❌ {err}"),
            },
        }
    }

    Ok(())
}
