// src/convoke/mod.rs

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod function;
pub mod functions;
pub mod http;
pub mod repl;
pub mod session;
pub mod transcript;

// Export the session directly so callers can reach it as convoke::AssistantSession
// instead of convoke::session::AssistantSession.
pub use session::{AssistantSession, SessionConfig};
