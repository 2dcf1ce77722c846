use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use memchr::memchr;

use super::{SecretLookupError, SecretProvider, SecretSource};
use crate::core::config::Config;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fetches secrets from public CSV exports (e.g., a published spreadsheet).
pub struct RemoteSheetSource {
    client: reqwest::Client,
    urls: HashMap<String, String>,
}

impl RemoteSheetSource {
    pub fn new(client: reqwest::Client, urls: HashMap<String, String>) -> Self {
        Self { client, urls }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let urls = config
            .secrets
            .remote
            .iter()
            .filter_map(|(name, remote)| remote.export_url().map(|url| (name.clone(), url)))
            .collect();
        Self::new(client, urls)
    }
}

#[async_trait]
impl SecretProvider for RemoteSheetSource {
    fn source(&self) -> SecretSource {
        SecretSource::RemoteSheet
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>, SecretLookupError> {
        let Some(url) = self.urls.get(name) else {
            return Ok(None);
        };

        let body = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        first_field(&body)
            .map(Some)
            .ok_or(SecretLookupError::EmptyExport)
    }
}

/// First field of the first record of a delimited export, with surrounding
/// quote characters stripped.
pub fn first_field(body: &str) -> Option<String> {
    let body = body.trim();
    let end = memchr(b'\n', body.as_bytes()).unwrap_or(body.len());
    let record = body[..end].trim();

    let field = match record.strip_prefix('"') {
        Some(rest) => rest.find('"').map(|close| &rest[..close]).unwrap_or(rest),
        None => record.split(',').next().unwrap_or(record),
    };

    let value = field.trim().trim_matches('"').trim_matches('\'').trim();
    (!value.is_empty()).then(|| value.to_string())
}
