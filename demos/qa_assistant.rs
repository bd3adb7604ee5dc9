//! Interactive assistant backed by a remote question-answering service.
//!
//! Usage: `OPENAI_API_KEY=... cargo run --example qa_assistant`

use convoke::dispatch::FunctionRegistry;
use convoke::functions::QuestionAnswerFunction;
use convoke::{repl, AssistantSession, BackendConfig, SessionConfig};
use std::sync::Arc;

const QA_ENDPOINT: &str = "http://streamlit_engine.dataherald.ai/api/v1/questions";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    convoke::init_logger();

    let databases = vec![
        (
            "RealEstate".to_string(),
            "6537c3dc4cec532eccb7d6cc".to_string(),
        ),
        (
            "SenateStock".to_string(),
            "65424c694cec532eccb7d766".to_string(),
        ),
    ];

    let backend = Arc::new(BackendConfig::from_env()?.into_backend());
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(QuestionAnswerFunction::new(
        QA_ENDPOINT,
        databases,
        "RealEstate",
    )));

    let config = SessionConfig::new("", "gpt-3.5-turbo-1106");
    let mut session = AssistantSession::start(backend, config, registry).await?;
    let thread = session.create_thread().await?;

    repl::run(&mut session, &thread).await
}
