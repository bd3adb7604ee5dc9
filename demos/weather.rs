//! Minimal wiring check: one weather question answered through the
//! function-calling loop.
//!
//! Usage: `OPENAI_API_KEY=... cargo run --example weather`

use convoke::dispatch::FunctionRegistry;
use convoke::functions::WeatherFunction;
use convoke::{AssistantSession, BackendConfig, SessionConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    convoke::init_logger();

    let backend = Arc::new(BackendConfig::from_env()?.into_backend());
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(WeatherFunction::new()));

    let config = SessionConfig::new(
        "You are a weather bot. Use the provided functions to answer questions.",
        "gpt-3.5-turbo-1106",
    );
    let mut session = AssistantSession::start(backend, config, registry).await?;

    let thread = session.create_thread().await?;
    let message = session
        .chat(&thread.id, "What is the weather in San Francisco?", &[], None)
        .await?;
    println!("{}", message);

    session.shutdown().await;
    Ok(())
}
