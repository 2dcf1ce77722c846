//! Report of where each well-known secret was resolved from.

use crate::core::config::Config;
use crate::core::secrets::{CredentialResolver, ResolvedSecrets};

pub fn report_lines(secrets: &ResolvedSecrets) -> Vec<String> {
    secrets
        .entries()
        .into_iter()
        .map(|(name, secret)| match secret {
            Some(secret) => format!("  {name:<20} {} ({})", secret.masked(), secret.source),
            None => format!("  {name:<20} not configured"),
        })
        .collect()
}

pub async fn print_report(config: &Config) {
    let resolver = CredentialResolver::from_config(config, reqwest::Client::new());
    let secrets = resolver.resolve_all().await;
    println!("Secrets:");
    for line in report_lines(&secrets) {
        println!("{line}");
    }
}
