use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ChatSection {
    /// Model identifier sent with every completion request (e.g., "gpt-3.5-turbo")
    pub model: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Number of recent turns included in each request
    pub context_turns: Option<usize>,
    /// System persona prepended to every request
    pub persona: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct MailSection {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub subject_prefix: Option<String>,
    /// Recipient used when an email request names no address.
    /// Falls back to the sender account when unset.
    pub fallback_recipient: Option<String>,
}

/// Location of a delimited export holding one secret in its first cell.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct RemoteSecret {
    /// Full export URL; takes precedence over `sheet_id`
    pub url: Option<String>,
    /// Spreadsheet ID from the sheet's share URL
    pub sheet_id: Option<String>,
    /// Worksheet tab ID
    #[serde(default)]
    pub gid: u32,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct SecretsSection {
    /// TOML secrets file (flat `NAME = "value"` table)
    pub file: Option<PathBuf>,
    /// Consult the system keyring
    pub use_keyring: Option<bool>,
    /// Outer key: secret name (e.g., "OPENAI_API_KEY")
    #[serde(default)]
    pub remote: HashMap<String, RemoteSecret>,
    /// Last-resort values. Nothing is compiled in; this table is the only default.
    #[serde(default)]
    pub defaults: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ServerSection {
    pub bind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub mail: MailSection,
    #[serde(default)]
    pub secrets: SecretsSection,
    #[serde(default)]
    pub server: ServerSection,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl RemoteSecret {
    /// CSV export URL for this secret, if enough is configured to build one.
    pub fn export_url(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(url.trim().to_string());
        }
        self.sheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                format!(
                    "https://docs.google.com/spreadsheets/d/{id}/export?format=csv&gid={}",
                    self.gid
                )
            })
    }
}
