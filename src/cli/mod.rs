//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod say;
pub mod secrets;

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::app::AppContext;
use crate::core::config::Config;
use crate::server;
use crate::utils::diagnostics;

#[derive(Parser)]
#[command(name = "neural-interface")]
#[command(about = "A chat assistant that can also send email on request")]
#[command(
    long_about = "Neural Interface is a conversational assistant backed by an OpenAI-compatible \
chat API. Messages that ask for an email (\"send email to bob@example.com ...\") are delivered \
over SMTP in addition to being answered.\n\n\
Secrets (first non-empty source wins):\n\
  1. Remote CSV exports listed under [secrets.remote] in the config\n\
  2. The secrets file (secrets.toml next to the config) and the system keyring\n\
  3. Environment variables\n\
  4. Values under [secrets.defaults] in the config\n\n\
Well-known secrets:\n\
  OPENAI_API_KEY       Required for chat\n\
  GMAIL_USER           Sender account for email\n\
  GMAIL_APP_PASSWORD   SMTP password for the sender account\n\n\
Chat commands:\n\
  /purge            Clear the conversation\n\
  /stats            Show message counts\n\
  /quit             Exit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the config file (defaults to the platform config directory)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the chat model
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append a transcript of the chat to the given file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Say {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Serve the JSON HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Show where each secret was resolved from
    Secrets,
    /// Print the effective configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);

    let default_directive = match command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    diagnostics::init(default_directive);

    let config = Config::load(args.config.as_deref())?;

    match command {
        Commands::Chat => {
            let app = AppContext::bootstrap(config, args.model).await;
            chat::run_chat(app, args.log).await
        }
        Commands::Say { prompt } => {
            let app = AppContext::bootstrap(config, args.model).await;
            say::run_say(app, prompt).await
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind().to_string());
            let addr: SocketAddr = bind
                .parse()
                .map_err(|err| format!("invalid bind address '{bind}': {err}"))?;
            let app = AppContext::bootstrap(config, args.model).await;

            let shutdown = CancellationToken::new();
            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("shutting down");
                        signal_token.cancel();
                    }
                    Err(err) => warn!(error = %err, "cannot listen for ctrl-c"),
                }
            });

            server::serve(app, addr, shutdown).await?;
            Ok(())
        }
        Commands::Secrets => {
            secrets::print_report(&config).await;
            Ok(())
        }
        Commands::Config => {
            config.print_all();
            Ok(())
        }
    }
}
