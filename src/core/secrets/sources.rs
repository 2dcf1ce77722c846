use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{SecretLookupError, SecretProvider, SecretSource};
use crate::core::keyring::{read_entry, KEYRING_SERVICE};

/// Deployment-provided `secrets.toml` holding a flat table of string values.
pub struct SecretsFileSource {
    path: PathBuf,
}

impl SecretsFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SecretProvider for SecretsFileSource {
    fn source(&self) -> SecretSource {
        SecretSource::HostingSecretStore
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>, SecretLookupError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| SecretLookupError::Read {
            path: self.path.clone(),
            source,
        })?;
        let table: toml::Table =
            toml::from_str(&contents).map_err(|source| SecretLookupError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(table
            .get(name)
            .and_then(|value| value.as_str())
            .map(str::to_string))
    }
}

/// Platform keyring entries stored under a fixed service name.
pub struct KeyringSource {
    service: String,
}

impl Default for KeyringSource {
    fn default() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }
}

#[async_trait]
impl SecretProvider for KeyringSource {
    fn source(&self) -> SecretSource {
        SecretSource::HostingSecretStore
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>, SecretLookupError> {
        // Platform backends (D-Bus secret service, keychain) block.
        let service = self.service.clone();
        let name = name.to_string();
        let value = tokio::task::spawn_blocking(move || read_entry(&service, &name))
            .await
            .map_err(SecretLookupError::Task)??;
        Ok(value)
    }
}

pub struct EnvironmentSource;

#[async_trait]
impl SecretProvider for EnvironmentSource {
    fn source(&self) -> SecretSource {
        SecretSource::Environment
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>, SecretLookupError> {
        Ok(std::env::var(name).ok())
    }
}

/// Values injected through the `[secrets.defaults]` config table.
pub struct DefaultSource {
    values: HashMap<String, String>,
}

impl DefaultSource {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

#[async_trait]
impl SecretProvider for DefaultSource {
    fn source(&self) -> SecretSource {
        SecretSource::Default
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>, SecretLookupError> {
        Ok(self.values.get(name).cloned())
    }
}
