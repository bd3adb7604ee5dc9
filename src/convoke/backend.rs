//! Remote Service Contract
//!
//! The assistant, thread, run, and message objects all live on the remote
//! service; this module defines the local mirror types plus the
//! [`AssistantBackend`] trait the session drives them through. The session
//! only reads run state and reacts to it; the remote service owns every
//! lifecycle here.

use crate::convoke::dispatch::ToolOutput;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Boxed error alias used across backend implementations.
pub type BackendError = Box<dyn Error + Send + Sync>;

/// Speaker roles carried on thread messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Remote-registered assistant handle.
#[derive(Debug, Clone)]
pub struct Assistant {
    pub id: String,
    pub name: String,
}

/// Remote conversation thread handle.
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: String,
}

/// Lifecycle states of a remote run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Failed,
    Expired,
    Cancelled,
}

/// A tool call as the remote service words it: name plus the raw JSON
/// argument blob, still unparsed.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Snapshot of a remote run, refreshed on every poll.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    /// Remote error payload, populated on failed runs.
    pub last_error: Option<String>,
    /// Pending tool calls, populated while the run requires action.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Run {
    /// Names of the functions the run is currently blocked on.
    pub fn pending_function_names(&self) -> Vec<String> {
        self.tool_calls.iter().map(|c| c.name.clone()).collect()
    }
}

/// What an inline annotation points at.
#[derive(Debug, Clone)]
pub enum AnnotationKind {
    /// A quoted excerpt from an uploaded file.
    FileCitation { quote: String, file_id: String },
    /// A file the assistant produced and expects the caller to download.
    FilePath { file_id: String },
}

/// An inline marker inside a message's text payload.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// The exact substring of the message text this annotation spans.
    pub text: String,
    pub kind: AnnotationKind,
}

/// One message in a remote thread.
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    pub id: String,
    /// The run that produced the message, absent for user messages.
    pub run_id: Option<String>,
    pub role: Role,
    /// Primary text payload, with annotation spans still inline.
    pub text: String,
    /// Annotations in order of appearance.
    pub annotations: Vec<Annotation>,
    pub file_ids: Vec<String>,
}

/// Remote file metadata.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub id: String,
    pub filename: String,
}

/// Everything needed to register an assistant remotely.
#[derive(Debug, Clone)]
pub struct AssistantSpec {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub model: String,
    /// Tool declarations in the remote wire shape, e.g.
    /// `{"type": "function", "function": {...}}` or `{"type": "retrieval"}`.
    pub tools: Vec<serde_json::Value>,
    pub file_ids: Vec<String>,
}

/// The call/return contract the session consumes from the remote
/// conversational service. Implementations own all transport concerns.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant, BackendError>;

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), BackendError>;

    async fn create_thread(&self) -> Result<Thread, BackendError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<(), BackendError>;

    /// Append a user message, optionally referencing uploaded files.
    async fn add_message(
        &self,
        thread_id: &str,
        content: &str,
        file_ids: &[String],
    ) -> Result<(), BackendError>;

    /// Start a run of the assistant against the thread.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<Run, BackendError>;

    /// Fetch the current run snapshot.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError>;

    /// Answer a requires_action run with one output per pending call.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, BackendError>;

    /// List the thread's messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, BackendError>;

    async fn upload_file(&self, path: &std::path::Path) -> Result<FileInfo, BackendError>;

    async fn retrieve_file(&self, file_id: &str) -> Result<FileInfo, BackendError>;

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, BackendError>;

    async fn list_files(&self) -> Result<Vec<FileInfo>, BackendError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), BackendError>;
}
