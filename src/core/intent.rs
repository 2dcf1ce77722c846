//! Keyword-based detection of email-dispatch requests.
//!
//! Matching is a plain case-insensitive substring test. The short tokens
//! `"mail"` and `"메일"` match inside longer words ("mailbox", "메일함"), so
//! unrelated messages that mention mail are treated as send requests too.

use std::sync::LazyLock;

use regex::Regex;

/// Phrases that mark a message as an email request.
pub const EMAIL_KEYWORDS: &[&str] = &[
    "send email",
    "send mail",
    "send an email",
    "email",
    "mail",
    "메일 보내줘",
    "메일 보내",
    "이메일",
    "메일",
    "전송",
];

pub const EMAIL_SUBJECT: &str = "Message from the chat interface";

static EMAIL_ADDRESS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").ok()
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailIntent {
    pub matched: bool,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// What the user asked for in a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Chat,
    SendEmail(EmailIntent),
}

impl EmailIntent {
    pub fn into_intent(self) -> Intent {
        if self.matched {
            Intent::SendEmail(self)
        } else {
            Intent::Chat
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntentParser {
    fallback_recipient: String,
}

impl IntentParser {
    /// `fallback_recipient` is used when a matched message carries no address.
    pub fn new(fallback_recipient: impl Into<String>) -> Self {
        Self {
            fallback_recipient: fallback_recipient.into(),
        }
    }

    pub fn parse(&self, text: &str) -> EmailIntent {
        if !contains_email_keyword(text) {
            return EmailIntent::default();
        }

        let recipient = extract_address(text)
            .map(str::to_string)
            .unwrap_or_else(|| self.fallback_recipient.clone());

        EmailIntent {
            matched: true,
            recipient,
            subject: EMAIL_SUBJECT.to_string(),
            body: email_body(text),
        }
    }

    pub fn classify(&self, text: &str) -> Intent {
        self.parse(text).into_intent()
    }
}

pub fn contains_email_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    EMAIL_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// First `local@domain.tld` shaped substring, if any.
pub fn extract_address(text: &str) -> Option<&str> {
    EMAIL_ADDRESS
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str())
}

fn email_body(text: &str) -> String {
    format!(
        "The following request was received through the chat interface:\n\n{text}\n"
    )
}
