//! HTTP Backend
//!
//! A thin [`AssistantBackend`] implementation over the remote service's REST
//! surface. The wire protocol belongs to the vendor; this module only maps
//! the handful of endpoints the session consumes into the local mirror types.
//! All transport failures surface as [`HttpBackendError`] with the status and
//! body text attached.

use crate::convoke::backend::{
    Annotation, AnnotationKind, Assistant, AssistantBackend, AssistantSpec, BackendError,
    FileInfo, Role, Run, RunStatus, Thread, ThreadMessage, ToolCallRequest,
};
use crate::convoke::dispatch::ToolOutput;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::fmt;
use std::path::Path;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Error type for HTTP backend operations.
#[derive(Debug, Clone)]
pub struct HttpBackendError {
    message: String,
}

impl HttpBackendError {
    pub fn new(message: impl Into<String>) -> Self {
        HttpBackendError {
            message: message.into(),
        }
    }
}

impl fmt::Display for HttpBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP backend error: {}", self.message)
    }
}

impl Error for HttpBackendError {}

/// REST client for an assistants-style conversational API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpBackend {
    /// Create a backend talking to the default public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a backend pointing at a custom compatible endpoint.
    pub fn new_with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        HttpBackend {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v1")
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Box::new(HttpBackendError::new(format!(
                "{}: {}",
                status, body
            ))));
        }
        serde_json::from_str(&body).map_err(|e| {
            Box::new(HttpBackendError::new(format!(
                "unexpected response shape: {} in {}",
                e, body
            ))) as BackendError
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Self::read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, BackendError> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let response = self.request(reqwest::Method::DELETE, path).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Box::new(HttpBackendError::new(format!(
                "{}: {}",
                status, body
            ))));
        }
        Ok(())
    }
}

// Wire shapes, private to this module.

#[derive(Deserialize)]
struct WireAssistant {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireThread {
    id: String,
}

#[derive(Deserialize)]
struct WireRunError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireSubmitToolOutputs {
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireRequiredAction {
    submit_tool_outputs: WireSubmitToolOutputs,
}

#[derive(Deserialize)]
struct WireRun {
    id: String,
    status: RunStatus,
    #[serde(default)]
    last_error: Option<WireRunError>,
    #[serde(default)]
    required_action: Option<WireRequiredAction>,
}

impl WireRun {
    fn into_run(self) -> Run {
        let tool_calls = self
            .required_action
            .map(|a| {
                a.submit_tool_outputs
                    .tool_calls
                    .into_iter()
                    .map(|c| ToolCallRequest {
                        id: c.id,
                        name: c.function.name,
                        arguments: c.function.arguments,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let last_error = self.last_error.map(|e| match e.code {
            Some(code) => format!("{}: {}", code, e.message),
            None => e.message,
        });
        Run {
            id: self.id,
            status: self.status,
            last_error,
            tool_calls,
        }
    }
}

#[derive(Deserialize)]
struct WireFileCitation {
    file_id: String,
    #[serde(default)]
    quote: String,
}

#[derive(Deserialize)]
struct WireFilePath {
    file_id: String,
}

#[derive(Deserialize)]
struct WireAnnotation {
    text: String,
    #[serde(default)]
    file_citation: Option<WireFileCitation>,
    #[serde(default)]
    file_path: Option<WireFilePath>,
}

#[derive(Deserialize)]
struct WireMessageText {
    value: String,
    #[serde(default)]
    annotations: Vec<WireAnnotation>,
}

#[derive(Deserialize)]
struct WireMessageContent {
    #[serde(default)]
    text: Option<WireMessageText>,
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    #[serde(default)]
    run_id: Option<String>,
    role: String,
    #[serde(default)]
    content: Vec<WireMessageContent>,
    #[serde(default)]
    file_ids: Vec<String>,
}

impl WireMessage {
    fn into_message(self) -> ThreadMessage {
        let role = if self.role == "user" {
            Role::User
        } else {
            Role::Assistant
        };
        let (text, annotations) = self
            .content
            .into_iter()
            .find_map(|c| c.text)
            .map(|t| {
                let annotations = t
                    .annotations
                    .into_iter()
                    .filter_map(|a| {
                        let kind = if let Some(c) = a.file_citation {
                            AnnotationKind::FileCitation {
                                quote: c.quote,
                                file_id: c.file_id,
                            }
                        } else if let Some(p) = a.file_path {
                            AnnotationKind::FilePath { file_id: p.file_id }
                        } else {
                            return None;
                        };
                        Some(Annotation { text: a.text, kind })
                    })
                    .collect();
                (t.value, annotations)
            })
            .unwrap_or_else(|| (String::new(), Vec::new()));
        ThreadMessage {
            id: self.id,
            run_id: self.run_id,
            role,
            text,
            annotations,
            file_ids: self.file_ids,
        }
    }
}

#[derive(Deserialize)]
struct WireList<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct WireFile {
    id: String,
    filename: String,
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant, BackendError> {
        let body = json!({
            "name": spec.name,
            "description": spec.description,
            "instructions": spec.instructions,
            "model": spec.model,
            "tools": spec.tools,
            "file_ids": spec.file_ids,
        });
        let wire: WireAssistant = self.post_json("/assistants", &body).await?;
        Ok(Assistant {
            id: wire.id,
            name: wire.name.unwrap_or_else(|| spec.name.clone()),
        })
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), BackendError> {
        self.delete(&format!("/assistants/{}", assistant_id)).await
    }

    async fn create_thread(&self) -> Result<Thread, BackendError> {
        let wire: WireThread = self.post_json("/threads", &json!({})).await?;
        Ok(Thread { id: wire.id })
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), BackendError> {
        self.delete(&format!("/threads/{}", thread_id)).await
    }

    async fn add_message(
        &self,
        thread_id: &str,
        content: &str,
        file_ids: &[String],
    ) -> Result<(), BackendError> {
        let body = json!({
            "role": "user",
            "content": content,
            "file_ids": file_ids,
        });
        let _: serde_json::Value = self
            .post_json(&format!("/threads/{}/messages", thread_id), &body)
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<Run, BackendError> {
        let mut body = json!({ "assistant_id": assistant_id });
        if let Some(instructions) = instructions {
            body["instructions"] = json!(instructions);
        }
        let wire: WireRun = self
            .post_json(&format!("/threads/{}/runs", thread_id), &body)
            .await?;
        Ok(wire.into_run())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError> {
        let wire: WireRun = self
            .get_json(&format!("/threads/{}/runs/{}", thread_id, run_id))
            .await?;
        Ok(wire.into_run())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, BackendError> {
        let body = json!({
            "tool_outputs": outputs
                .iter()
                .map(|o| json!({ "tool_call_id": o.call_id, "output": o.output }))
                .collect::<Vec<_>>(),
        });
        let wire: WireRun = self
            .post_json(
                &format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
                &body,
            )
            .await?;
        Ok(wire.into_run())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, BackendError> {
        let wire: WireList<WireMessage> = self
            .get_json(&format!("/threads/{}/messages", thread_id))
            .await?;
        Ok(wire.data.into_iter().map(|m| m.into_message()).collect())
    }

    async fn upload_file(&self, path: &Path) -> Result<FileInfo, BackendError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let bytes = tokio::fs::read(path).await?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);
        let response = self
            .request(reqwest::Method::POST, "/files")
            .multipart(form)
            .send()
            .await?;
        let wire: WireFile = Self::read_json(response).await?;
        Ok(FileInfo {
            id: wire.id,
            filename: wire.filename,
        })
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileInfo, BackendError> {
        let wire: WireFile = self.get_json(&format!("/files/{}", file_id)).await?;
        Ok(FileInfo {
            id: wire.id,
            filename: wire.filename,
        })
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/files/{}/content", file_id))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Box::new(HttpBackendError::new(format!(
                "{}: {}",
                status, body
            ))));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn list_files(&self) -> Result<Vec<FileInfo>, BackendError> {
        let wire: WireList<WireFile> = self.get_json("/files").await?;
        Ok(wire
            .data
            .into_iter()
            .map(|f| FileInfo {
                id: f.id,
                filename: f.filename,
            })
            .collect())
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), BackendError> {
        self.delete(&format!("/files/{}", file_id)).await
    }
}
