//! ibot - Terminal client for a RAG chat service library
//!
//! This library provides the core functionality for the ibot client,
//! including the streaming chat session, knowledge base and document
//! management, and carbon dataset preparation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: Conversation store and the streaming chat client
//! - `api`: REST client for knowledge bases, documents, reports, and imports
//! - `carbon`: Carbon dataset types, generators, and validators
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers the CLI entrypoint dispatches to
//!
//! # Example
//!
//! ```no_run
//! use ibot::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     // Client usage would go here
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod carbon;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use api::ApiClient;
pub use chat::stream::{SessionState, StreamingChatClient};
pub use chat::{ChatMessage, MessageStore};
pub use config::Config;
pub use error::{IbotError, Result};
