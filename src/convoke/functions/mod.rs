//! Bundled Function Implementations
//!
//! Ready-made [`AssistantFunction`](crate::function::AssistantFunction)
//! variants used by the demo flows and the end-to-end tests:
//!
//! - **WeatherFunction**: canned single-parameter stub, handy for wiring
//!   checks against a live assistant.
//! - **GetDbSchema / RunSqlQuery**: introspect and query a file-backed
//!   SQLite database.
//! - **QuestionAnswerFunction**: proxy natural-language questions to a
//!   remote question-answering HTTP service.

pub mod qa;
pub mod sql;
pub mod weather;

pub use qa::QuestionAnswerFunction;
pub use sql::{GetDbSchema, RunSqlQuery};
pub use weather::WeatherFunction;
