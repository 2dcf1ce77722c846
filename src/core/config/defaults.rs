use crate::core::config::data::Config;
use crate::core::conversation::DEFAULT_CONTEXT_TURNS;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_PERSONA: &str = "You are an advanced AI neural interface. Respond in a professional, technical manner with a hint of cyberpunk/hacker aesthetic. Use technical terminology and maintain an authoritative tone. You are a sophisticated AI system with deep knowledge across all domains.";

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SUBJECT_PREFIX: &str = "[Neural Interface]";

pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

impl Config {
    pub fn model(&self) -> &str {
        self.chat.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Configured base URL, then `OPENAI_BASE_URL`, then the public OpenAI endpoint.
    pub fn base_url(&self) -> String {
        self.chat
            .base_url
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn temperature(&self) -> f32 {
        self.chat.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.chat.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn context_turns(&self) -> usize {
        self.chat.context_turns.unwrap_or(DEFAULT_CONTEXT_TURNS)
    }

    pub fn persona(&self) -> &str {
        self.chat.persona.as_deref().unwrap_or(DEFAULT_PERSONA)
    }

    pub fn smtp_host(&self) -> &str {
        self.mail.smtp_host.as_deref().unwrap_or(DEFAULT_SMTP_HOST)
    }

    pub fn smtp_port(&self) -> u16 {
        self.mail.smtp_port.unwrap_or(DEFAULT_SMTP_PORT)
    }

    pub fn subject_prefix(&self) -> &str {
        self.mail
            .subject_prefix
            .as_deref()
            .unwrap_or(DEFAULT_SUBJECT_PREFIX)
    }

    pub fn use_keyring(&self) -> bool {
        self.secrets.use_keyring.unwrap_or(true)
    }

    /// Secrets file location, defaulting to `secrets.toml` beside the config file.
    pub fn secrets_file(&self) -> Option<PathBuf> {
        self.secrets.file.clone().or_else(|| {
            Config::get_config_path().map(|path| path.with_file_name("secrets.toml"))
        })
    }

    pub fn bind(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }
}
