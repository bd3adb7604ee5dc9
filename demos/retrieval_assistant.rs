//! Interactive assistant answering questions about an uploaded paper via the
//! remote retrieval capability. Citations come back as positional footnotes.
//!
//! Usage: `OPENAI_API_KEY=... cargo run --example retrieval_assistant`
//! Expects the paper at `assistants_files/llama2_paper.pdf`.

use convoke::backend::AssistantBackend;
use convoke::dispatch::FunctionRegistry;
use convoke::{repl, AssistantSession, BackendConfig, SessionConfig};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    convoke::init_logger();

    let backend = Arc::new(BackendConfig::from_env()?.into_backend());
    let paper = backend
        .upload_file(Path::new("assistants_files/llama2_paper.pdf"))
        .await?;
    log::info!("uploaded paper as {}", paper.id);

    let config = SessionConfig::new(
        "You are a helpful agent that helps user with their question about LLMs.",
        "gpt-4-1106-preview",
    )
    .with_retrieval()
    .with_file_ids(vec![paper.id.clone()]);

    let mut session = AssistantSession::start(backend, config, FunctionRegistry::new()).await?;
    // The paper was uploaded before the session existed; hand it over so
    // shutdown deletes it with everything else.
    session.track_file(paper.id);
    let thread = session.create_thread().await?;
    repl::run(&mut session, &thread).await
}
