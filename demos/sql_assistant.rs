//! Interactive SQL expert over a local SQLite database.
//!
//! Usage: `OPENAI_API_KEY=... cargo run --example sql_assistant`
//! Expects the Chinook sample database at `assistants_files/Chinook.sqlite`.

use convoke::dispatch::FunctionRegistry;
use convoke::functions::{GetDbSchema, RunSqlQuery};
use convoke::{repl, AssistantSession, BackendConfig, SessionConfig};
use std::sync::Arc;

const DB_PATH: &str = "assistants_files/Chinook.sqlite";

const INSTRUCTIONS: &str = "\
You are a SQL expert. User asks you questions about the Chinook database.
First obtain the schema of the database to check the tables and columns, \
then generate SQL queries to answer the questions.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    convoke::init_logger();

    let backend = Arc::new(BackendConfig::from_env()?.into_backend());
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(GetDbSchema::new(DB_PATH)));
    registry.register(Arc::new(RunSqlQuery::new(DB_PATH)));

    let config = SessionConfig::new(INSTRUCTIONS, "gpt-3.5-turbo-1106").with_code_interpreter();
    let mut session = AssistantSession::start(backend, config, registry).await?;
    let thread = session.create_thread().await?;

    repl::run(&mut session, &thread).await
}
