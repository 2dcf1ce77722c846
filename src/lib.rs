//! Neural Interface is a chat assistant that can also send email when asked.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation log, intent detection, secret
//!   resolution, the chat responder, outbound mail, and per-session turn
//!   orchestration.
//! - [`server`] exposes sessions over a JSON HTTP API.
//! - [`api`] defines the chat-completion payloads sent to the model endpoint.
//! - [`utils`] holds URL helpers, transcript logging, and tracing setup.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration, resolves
//! secrets through [`core::app::AppContext::bootstrap`], and dispatches to
//! the terminal chat, the one-shot `say` command, or the HTTP server.

pub mod api;
pub mod cli;
pub mod core;
pub mod server;
pub mod utils;
