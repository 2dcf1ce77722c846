//! Credential resolution.
//!
//! A secret is looked up by name across an ordered chain of sources; the
//! first source returning a non-blank value wins. Lookup failures are logged
//! and skipped so resolution itself never fails: a secret no source can
//! provide simply resolves to nothing, and the caller decides whether that
//! disables a feature.

mod remote;
mod sources;

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::keyring::KeyringAccessError;

pub use remote::{first_field, RemoteSheetSource};
pub use sources::{DefaultSource, EnvironmentSource, KeyringSource, SecretsFileSource};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GMAIL_USER: &str = "GMAIL_USER";
pub const GMAIL_APP_PASSWORD: &str = "GMAIL_APP_PASSWORD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretSource {
    RemoteSheet,
    HostingSecretStore,
    Environment,
    Default,
}

impl SecretSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SecretSource::RemoteSheet => "remote sheet",
            SecretSource::HostingSecretStore => "hosting secret store",
            SecretSource::Environment => "environment",
            SecretSource::Default => "default",
        }
    }
}

impl fmt::Display for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub value: String,
    pub source: SecretSource,
}

impl Secret {
    /// First four characters followed by an ellipsis, for status output.
    pub fn masked(&self) -> String {
        let prefix: String = self.value.chars().take(4).collect();
        format!("{prefix}…")
    }
}

// Keep secret values out of debug logs.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("value", &self.masked())
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug)]
pub enum SecretLookupError {
    Http(reqwest::Error),
    EmptyExport,
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },
    Keyring(KeyringAccessError),
    Task(tokio::task::JoinError),
}

impl fmt::Display for SecretLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretLookupError::Http(err) => write!(f, "remote fetch failed: {err}"),
            SecretLookupError::EmptyExport => write!(f, "remote export contained no records"),
            SecretLookupError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            SecretLookupError::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
            SecretLookupError::Keyring(err) => write!(f, "keyring unavailable: {err}"),
            SecretLookupError::Task(err) => write!(f, "lookup task failed: {err}"),
        }
    }
}

impl std::error::Error for SecretLookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SecretLookupError::Http(err) => Some(err),
            SecretLookupError::EmptyExport => None,
            SecretLookupError::Read { source, .. } => Some(source),
            SecretLookupError::Parse { source, .. } => Some(source),
            SecretLookupError::Keyring(err) => Some(err),
            SecretLookupError::Task(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for SecretLookupError {
    fn from(err: reqwest::Error) -> Self {
        SecretLookupError::Http(err)
    }
}

impl From<KeyringAccessError> for SecretLookupError {
    fn from(err: KeyringAccessError) -> Self {
        SecretLookupError::Keyring(err)
    }
}

/// One link in the resolution chain.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    fn source(&self) -> SecretSource;

    /// `Ok(None)` when this source simply has no value for `name`.
    async fn lookup(&self, name: &str) -> Result<Option<String>, SecretLookupError>;
}

#[derive(Default)]
pub struct CredentialResolver {
    providers: Vec<Box<dyn SecretProvider>>,
}

impl CredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Standard chain: remote sheet, secrets file, keyring, environment, config defaults.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut resolver = Self::new().with_provider(RemoteSheetSource::from_config(config, client));
        if let Some(path) = config.secrets_file() {
            resolver = resolver.with_provider(SecretsFileSource::new(path));
        }
        if config.use_keyring() {
            resolver = resolver.with_provider(KeyringSource::default());
        }
        resolver
            .with_provider(EnvironmentSource)
            .with_provider(DefaultSource::new(config.secrets.defaults.clone()))
    }

    pub async fn resolve_secret(&self, name: &str) -> Option<Secret> {
        for provider in &self.providers {
            let source = provider.source();
            match provider.lookup(name).await {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    debug!(secret = name, %source, "secret resolved");
                    return Some(Secret {
                        name: name.to_string(),
                        value: value.trim().to_string(),
                        source,
                    });
                }
                Ok(_) => debug!(secret = name, %source, "no value"),
                Err(err) => warn!(secret = name, %source, error = %err, "secret lookup failed; trying next source"),
            }
        }
        debug!(secret = name, "secret not configured");
        None
    }

    /// Resolved value, or an empty string when no source has one.
    pub async fn resolve(&self, name: &str) -> String {
        self.resolve_secret(name)
            .await
            .map(|secret| secret.value)
            .unwrap_or_default()
    }

    pub async fn resolve_all(&self) -> ResolvedSecrets {
        ResolvedSecrets {
            openai_api_key: self.resolve_secret(OPENAI_API_KEY).await,
            gmail_user: self.resolve_secret(GMAIL_USER).await,
            gmail_app_password: self.resolve_secret(GMAIL_APP_PASSWORD).await,
        }
    }
}

/// Secrets resolved once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
    pub gmail_user: Option<Secret>,
    pub gmail_app_password: Option<Secret>,
}

impl ResolvedSecrets {
    fn value(secret: Option<&Secret>) -> &str {
        secret.map(|s| s.value.as_str()).unwrap_or("")
    }

    pub fn api_key(&self) -> &str {
        Self::value(self.openai_api_key.as_ref())
    }

    pub fn mail_user(&self) -> &str {
        Self::value(self.gmail_user.as_ref())
    }

    pub fn mail_password(&self) -> &str {
        Self::value(self.gmail_app_password.as_ref())
    }

    pub fn entries(&self) -> [(&'static str, Option<&Secret>); 3] {
        [
            (OPENAI_API_KEY, self.openai_api_key.as_ref()),
            (GMAIL_USER, self.gmail_user.as_ref()),
            (GMAIL_APP_PASSWORD, self.gmail_app_password.as_ref()),
        ]
    }
}
