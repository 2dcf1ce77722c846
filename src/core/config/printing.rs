use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  model: {}", self.model());
        println!("  base-url: {}", self.base_url());
        println!("  temperature: {}", self.temperature());
        println!("  max-tokens: {}", self.max_tokens());
        println!("  context-turns: {}", self.context_turns());
        println!("  smtp: {}:{}", self.smtp_host(), self.smtp_port());
        println!("  subject-prefix: {}", self.subject_prefix());
        match &self.mail.fallback_recipient {
            Some(recipient) => println!("  fallback-recipient: {recipient}"),
            None => println!("  fallback-recipient: (sender account)"),
        }
        match self.secrets_file() {
            Some(path) => println!("  secrets-file: {}", path_display(path)),
            None => println!("  secrets-file: (none)"),
        }
        println!(
            "  keyring: {}",
            if self.use_keyring() { "on" } else { "off" }
        );
        if self.secrets.remote.is_empty() {
            println!("  remote-secrets: (none set)");
        } else {
            println!("  remote-secrets:");
            let mut names: Vec<_> = self.secrets.remote.keys().collect();
            names.sort();
            for name in names {
                println!("    {name}");
            }
        }
    }
}
