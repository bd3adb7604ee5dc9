//! Assistant Session
//!
//! [`AssistantSession`] owns one remote assistant registration (instructions,
//! model, capabilities, functions) and the threads created under it, and
//! drives the post → poll → dispatch → resume loop until a reply is ready.
//!
//! The run itself lives on the remote service; the session polls its status
//! at a fixed interval and reacts:
//!
//! ```text
//! queued / in_progress  → keep polling
//! requires_action       → dispatch the batch of tool calls, submit outputs
//! completed             → extract and format the run's reply
//! failed / cancelled    → fatal, remote error payload attached
//! expired               → fatal, names the functions the run was waiting on
//! ```
//!
//! There is no local timeout; the loop is bounded by the remote service's
//! own run-expiry policy.

use crate::convoke::backend::{
    Assistant, AssistantBackend, AssistantSpec, BackendError, Role, Run, RunStatus, Thread,
};
use crate::convoke::dispatch::{FunctionCall, FunctionRegistry, ToolOutput};
use crate::convoke::transcript::TranscriptFormatter;
use serde_json::json;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Fatal run-protocol failures surfaced to the caller.
///
/// Tool-local failures never show up here; they are folded into tool output
/// text by the dispatcher. These variants mean the run itself is dead.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// The remote service marked the run failed (or cancelled).
    RunFailed(String),
    /// The run expired, typically while waiting on the named functions.
    RunExpired(Vec<String>),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::RunFailed(detail) => {
                write!(f, "Run failed with the following error: {}", detail)
            }
            SessionError::RunExpired(pending) => {
                write!(f, "Run expired when calling {}", pending.join(", "))
            }
        }
    }
}

impl Error for SessionError {}

/// Configuration for one assistant registration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub model: String,
    pub use_retrieval: bool,
    pub use_code_interpreter: bool,
    pub file_ids: Vec<String>,
    /// Fixed delay between run polls. No backoff; the remote protocol only
    /// exposes polling.
    pub poll_interval: Duration,
    /// When false, [`AssistantSession::shutdown`] deletes nothing remotely.
    pub cleanup_on_exit: bool,
    /// Where file-path annotations get saved.
    pub download_dir: PathBuf,
}

impl SessionConfig {
    /// Create a config with the given steering instructions and model.
    pub fn new(instructions: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: "AI Assistant".to_string(),
            description: "An AI Assistant".to_string(),
            instructions: instructions.into(),
            model: model.into(),
            use_retrieval: false,
            use_code_interpreter: false,
            file_ids: Vec::new(),
            poll_interval: Duration::from_millis(500),
            cleanup_on_exit: true,
            download_dir: PathBuf::from("downloads"),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Enable the remote retrieval capability.
    pub fn with_retrieval(mut self) -> Self {
        self.use_retrieval = true;
        self
    }

    /// Enable the remote code-interpreter capability.
    pub fn with_code_interpreter(mut self) -> Self {
        self.use_code_interpreter = true;
        self
    }

    /// Attach already-uploaded files to the assistant.
    pub fn with_file_ids(mut self, file_ids: Vec<String>) -> Self {
        self.file_ids = file_ids;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Leave all remote objects in place on shutdown (explicit opt-out).
    pub fn keep_remote_objects(mut self) -> Self {
        self.cleanup_on_exit = false;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}

/// Local mirror of one thread message.
#[derive(Debug, Clone)]
pub struct Message {
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    pub file_ids: Vec<String>,
}

/// Append-only, chronologically ordered transcript mirror.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Render the transcript as speaker-labelled lines.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A conversational session against one remote assistant.
pub struct AssistantSession {
    backend: Arc<dyn AssistantBackend>,
    config: SessionConfig,
    registry: FunctionRegistry,
    formatter: TranscriptFormatter,
    assistant: Assistant,
    threads: Vec<Thread>,
    uploaded_files: Vec<String>,
    conversation: Conversation,
}

impl AssistantSession {
    /// Register the assistant remotely and return a live session.
    ///
    /// Registered functions are converted into function-tool schemas up
    /// front; retrieval and code-interpreter capabilities are appended when
    /// the config enables them.
    pub async fn start(
        backend: Arc<dyn AssistantBackend>,
        config: SessionConfig,
        registry: FunctionRegistry,
    ) -> Result<Self, BackendError> {
        let mut tools: Vec<serde_json::Value> = registry
            .schemas()
            .into_iter()
            .map(|schema| json!({ "type": "function", "function": schema }))
            .collect();
        if config.use_retrieval {
            tools.push(json!({ "type": "retrieval" }));
        }
        if config.use_code_interpreter {
            tools.push(json!({ "type": "code_interpreter" }));
        }
        let spec = AssistantSpec {
            name: config.name.clone(),
            description: config.description.clone(),
            instructions: config.instructions.clone(),
            model: config.model.clone(),
            tools,
            file_ids: config.file_ids.clone(),
        };
        let assistant = backend.create_assistant(&spec).await?;
        log::info!(
            "registered assistant {} ({}) with {} function(s)",
            assistant.name,
            assistant.id,
            registry.len()
        );
        let formatter = TranscriptFormatter::new(backend.clone(), config.download_dir.clone());
        Ok(Self {
            backend,
            config,
            registry,
            formatter,
            assistant,
            threads: Vec::new(),
            uploaded_files: Vec::new(),
            conversation: Conversation::default(),
        })
    }

    /// The remote assistant handle.
    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Threads created through this session, oldest first.
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    /// The local transcript mirror.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Open a new remote thread and track it for cleanup.
    pub async fn create_thread(&mut self) -> Result<Thread, BackendError> {
        let thread = self.backend.create_thread().await?;
        log::debug!("created thread {}", thread.id);
        self.threads.push(thread.clone());
        Ok(thread)
    }

    /// Upload a local file and track it for cleanup.
    pub async fn upload_file(&mut self, path: &Path) -> Result<String, BackendError> {
        let info = self.backend.upload_file(path).await?;
        log::debug!("uploaded {} as {}", path.display(), info.id);
        self.uploaded_files.push(info.id.clone());
        Ok(info.id)
    }

    /// Adopt a file uploaded outside this session into its cleanup set, so
    /// [`shutdown`](Self::shutdown) deletes it like any session upload.
    ///
    /// Needed when a file must exist before the assistant is registered
    /// (e.g. to attach it at registration time).
    pub fn track_file(&mut self, file_id: impl Into<String>) {
        self.uploaded_files.push(file_id.into());
    }

    /// Post a user message and drive the run to completion, returning the
    /// assistant's formatted, speaker-labelled reply.
    ///
    /// Blocks the caller (cooperatively) for the entire run. Tool-local
    /// failures come back as part of the assistant's reply; run-protocol
    /// failures surface as [`SessionError`].
    pub async fn chat(
        &mut self,
        thread_id: &str,
        content: &str,
        message_files: &[String],
        run_instructions: Option<&str>,
    ) -> Result<String, BackendError> {
        self.backend
            .add_message(thread_id, content, message_files)
            .await?;
        self.conversation.messages.push(Message {
            thread_id: thread_id.to_string(),
            role: Role::User,
            content: content.to_string(),
            file_ids: message_files.to_vec(),
        });

        let mut run = self
            .backend
            .create_run(thread_id, &self.assistant.id, run_instructions)
            .await?;
        loop {
            log::debug!("run {} status: {:?}", run.id, run.status);
            match run.status {
                RunStatus::Completed => break,
                RunStatus::Failed | RunStatus::Cancelled => {
                    let detail = run
                        .last_error
                        .unwrap_or_else(|| "no error payload".to_string());
                    return Err(Box::new(SessionError::RunFailed(detail)));
                }
                RunStatus::Expired => {
                    return Err(Box::new(SessionError::RunExpired(
                        run.pending_function_names(),
                    )));
                }
                RunStatus::RequiresAction => {
                    let outputs = self.resolve_tool_calls(&run).await;
                    run = self
                        .backend
                        .submit_tool_outputs(thread_id, &run.id, &outputs)
                        .await?;
                    continue;
                }
                RunStatus::Queued | RunStatus::InProgress => {}
            }
            tokio::time::sleep(self.config.poll_interval).await;
            run = self.backend.retrieve_run(thread_id, &run.id).await?;
        }

        match self.extract_run_message(&run, thread_id).await? {
            Some((role, formatted)) => {
                self.conversation.messages.push(Message {
                    thread_id: thread_id.to_string(),
                    role,
                    content: formatted.clone(),
                    file_ids: Vec::new(),
                });
                Ok(format!("{}: {}", role.as_str(), formatted))
            }
            None => Ok("assistant: No message found".to_string()),
        }
    }

    /// Produce exactly one output per pending call. A call that cannot even
    /// be parsed still gets an output carrying the failure text; the remote
    /// service requires the response set to be 1:1 with the request set.
    async fn resolve_tool_calls(&self, run: &Run) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(run.tool_calls.len());
        for request in &run.tool_calls {
            match FunctionCall::from_wire(&request.id, &request.name, &request.arguments) {
                Ok(call) => outputs.push(self.registry.dispatch(&call).await),
                Err(e) => {
                    log::warn!("call {} carried bad arguments: {}", request.id, e);
                    outputs.push(ToolOutput {
                        call_id: request.id.clone(),
                        output: e.to_string(),
                    });
                }
            }
        }
        outputs
    }

    /// Find the newest message the given run produced and format it.
    async fn extract_run_message(
        &self,
        run: &Run,
        thread_id: &str,
    ) -> Result<Option<(Role, String)>, BackendError> {
        let messages = self.backend.list_messages(thread_id).await?;
        for message in &messages {
            if message.run_id.as_deref() == Some(run.id.as_str()) {
                let formatted = self.formatter.format(message).await?;
                return Ok(Some((message.role, formatted)));
            }
        }
        Ok(None)
    }

    /// Rebuild the local transcript mirror from the remote thread history,
    /// oldest message first.
    pub async fn replay_conversation(&mut self, thread_id: &str) -> Result<(), BackendError> {
        let messages = self.backend.list_messages(thread_id).await?;
        for message in messages.iter().rev() {
            let content = self.formatter.format(message).await?;
            self.conversation.messages.push(Message {
                thread_id: thread_id.to_string(),
                role: message.role,
                content,
                file_ids: message.file_ids.clone(),
            });
        }
        Ok(())
    }

    /// Delete every remote object this session created: threads, uploaded
    /// files, and the assistant registration itself.
    ///
    /// Honors the config's explicit opt-out; failures are logged and
    /// skipped so one stubborn object does not strand the rest.
    pub async fn shutdown(&mut self) {
        if !self.config.cleanup_on_exit {
            log::info!(
                "cleanup disabled by configuration; leaving assistant {} and {} thread(s) in place",
                self.assistant.id,
                self.threads.len()
            );
            return;
        }
        for thread in self.threads.drain(..) {
            if let Err(e) = self.backend.delete_thread(&thread.id).await {
                log::warn!("failed to delete thread {}: {}", thread.id, e);
            }
        }
        for file_id in self.uploaded_files.drain(..) {
            if let Err(e) = self.backend.delete_file(&file_id).await {
                log::warn!("failed to delete file {}: {}", file_id, e);
            }
        }
        if let Err(e) = self.backend.delete_assistant(&self.assistant.id).await {
            log::warn!("failed to delete assistant {}: {}", self.assistant.id, e);
        }
    }
}
