pub mod app;
pub mod config;
pub mod conversation;
pub mod intent;
pub mod keyring;
pub mod message;
pub mod notify;
pub mod responder;
pub mod secrets;
pub mod session;
