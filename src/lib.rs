//! # Convoke
//!
//! Convoke is a lightweight Rust client for assistant-style conversational APIs:
//! it registers an assistant, opens threads, posts user messages, polls run
//! status, and dispatches the service's "tool call" requests to locally
//! registered functions before the run resumes.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Function Calling**: the [`function::AssistantFunction`] trait plus a
//!   [`dispatch::FunctionRegistry`] that validates JSON arguments against
//!   declared [`function::Property`] schemas and always answers every call
//! * **Sessions**: [`AssistantSession`] drives the post → poll → dispatch →
//!   resume loop until the assistant's reply is ready, and owns cleanup of
//!   everything it created remotely
//! * **Transcripts**: [`transcript::TranscriptFormatter`] resolves inline file
//!   citations into positional footnotes and downloads referenced files
//! * **Backends**: the [`backend::AssistantBackend`] trait with a
//!   [`http::HttpBackend`] REST implementation; swap in your own for testing
//! * **Bundled Functions**: a weather stub, SQLite schema/query tools, and a
//!   remote question-answering proxy under [`functions`]
//!
//! ## Core Concepts
//!
//! ### Declaring a Function
//!
//! A function declares its name, description, and ordered parameters; the
//! session converts that into the schema the remote service expects, and the
//! dispatcher validates every incoming call against it:
//!
//! ```rust
//! use async_trait::async_trait;
//! use convoke::function::{AssistantFunction, FunctionError, Property, PropertyType};
//! use serde_json::{Map, Value};
//!
//! struct Weather {
//!     parameters: Vec<Property>,
//! }
//!
//! #[async_trait]
//! impl AssistantFunction for Weather {
//!     fn name(&self) -> &str {
//!         "weather"
//!     }
//!
//!     fn parameters(&self) -> &[Property] {
//!         &self.parameters
//!     }
//!
//!     async fn call(&self, args: &Map<String, Value>) -> Result<String, FunctionError> {
//!         let location = args["location"].as_str().unwrap_or("nowhere");
//!         Ok(format!("The weather in {} is sunny", location))
//!     }
//! }
//! ```
//!
//! ### Running a Session
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use convoke::dispatch::FunctionRegistry;
//! use convoke::functions::WeatherFunction;
//! use convoke::http::HttpBackend;
//! use convoke::{AssistantSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     convoke::init_logger();
//!
//!     let backend = Arc::new(HttpBackend::new(std::env::var("OPENAI_API_KEY")?));
//!     let mut registry = FunctionRegistry::new();
//!     registry.register(Arc::new(WeatherFunction::new()));
//!
//!     let config = SessionConfig::new(
//!         "You are a weather bot. Use the provided functions to answer questions.",
//!         "gpt-3.5-turbo-1106",
//!     );
//!     let mut session = AssistantSession::start(backend, config, registry).await?;
//!
//!     let thread = session.create_thread().await?;
//!     let reply = session
//!         .chat(&thread.id, "What is the weather in San Francisco?", &[], None)
//!         .await?;
//!     println!("{}", reply);
//!
//!     session.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! Tool-local failures (unknown function, missing arguments, executor errors)
//! never abort a run; they travel back to the service as the tool's answer.
//! Only run-protocol failures ([`session::SessionError`]) terminate a chat.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding Convoke can opt in to simple `RUST_LOG` driven
/// diagnostics without having to choose a logging backend upfront.
///
/// ```rust
/// convoke::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `convoke` module.
pub mod convoke;

// Re-exporting key items for easier external access.
pub use crate::convoke::backend;
pub use crate::convoke::backend::{AssistantBackend, Role, RunStatus};
pub use crate::convoke::config;
pub use crate::convoke::config::BackendConfig;
pub use crate::convoke::dispatch;
pub use crate::convoke::dispatch::{FunctionCall, FunctionRegistry, ToolOutput};
pub use crate::convoke::function;
pub use crate::convoke::function::{AssistantFunction, FunctionError, Property, PropertyType};
pub use crate::convoke::functions;
pub use crate::convoke::http;
pub use crate::convoke::repl;
pub use crate::convoke::session;
pub use crate::convoke::session::{AssistantSession, SessionConfig, SessionError};
pub use crate::convoke::transcript;
pub use crate::convoke::transcript::TranscriptFormatter;
