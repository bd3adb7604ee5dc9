use async_trait::async_trait;
use convoke::backend::{
    Assistant, AssistantBackend, AssistantSpec, BackendError, FileInfo, Role, Run, RunStatus,
    Thread, ThreadMessage, ToolCallRequest,
};
use convoke::dispatch::{FunctionRegistry, ToolOutput};
use convoke::functions::WeatherFunction;
use convoke::{AssistantSession, SessionConfig, SessionError};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend that replays a scripted sequence of run snapshots and records
/// every remote mutation the session performs.
#[derive(Default)]
struct ScriptedBackend {
    state: Mutex<ScriptedState>,
}

#[derive(Default)]
struct ScriptedState {
    /// Snapshots returned by create_run, then each retrieve_run /
    /// submit_tool_outputs in order.
    runs: VecDeque<Run>,
    messages: Vec<ThreadMessage>,
    submitted_batches: Vec<Vec<ToolOutput>>,
    posted_messages: Vec<String>,
    deleted_threads: Vec<String>,
    deleted_assistants: Vec<String>,
    deleted_files: Vec<String>,
}

impl ScriptedBackend {
    fn new(runs: Vec<Run>, messages: Vec<ThreadMessage>) -> Self {
        Self {
            state: Mutex::new(ScriptedState {
                runs: runs.into(),
                messages,
                ..ScriptedState::default()
            }),
        }
    }

    fn next_run(&self) -> Run {
        self.state
            .lock()
            .unwrap()
            .runs
            .pop_front()
            .expect("script exhausted")
    }

    fn submitted_batches(&self) -> Vec<Vec<ToolOutput>> {
        self.state.lock().unwrap().submitted_batches.clone()
    }

    fn deleted(&self) -> (Vec<String>, Vec<String>) {
        let state = self.state.lock().unwrap();
        (
            state.deleted_threads.clone(),
            state.deleted_assistants.clone(),
        )
    }

    fn deleted_files(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_files.clone()
    }
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant, BackendError> {
        Ok(Assistant {
            id: "asst_1".to_string(),
            name: spec.name.clone(),
        })
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), BackendError> {
        self.state
            .lock()
            .unwrap()
            .deleted_assistants
            .push(assistant_id.to_string());
        Ok(())
    }

    async fn create_thread(&self) -> Result<Thread, BackendError> {
        Ok(Thread {
            id: "thread_1".to_string(),
        })
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), BackendError> {
        self.state
            .lock()
            .unwrap()
            .deleted_threads
            .push(thread_id.to_string());
        Ok(())
    }

    async fn add_message(
        &self,
        _thread_id: &str,
        content: &str,
        _file_ids: &[String],
    ) -> Result<(), BackendError> {
        self.state
            .lock()
            .unwrap()
            .posted_messages
            .push(content.to_string());
        Ok(())
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
        _instructions: Option<&str>,
    ) -> Result<Run, BackendError> {
        Ok(self.next_run())
    }

    async fn retrieve_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run, BackendError> {
        Ok(self.next_run())
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, BackendError> {
        self.state
            .lock()
            .unwrap()
            .submitted_batches
            .push(outputs.to_vec());
        Ok(self.next_run())
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, BackendError> {
        Ok(self.state.lock().unwrap().messages.clone())
    }

    async fn upload_file(&self, _path: &Path) -> Result<FileInfo, BackendError> {
        Err("upload not scripted".into())
    }

    async fn retrieve_file(&self, _file_id: &str) -> Result<FileInfo, BackendError> {
        Err("retrieve not scripted".into())
    }

    async fn download_file(&self, _file_id: &str) -> Result<Vec<u8>, BackendError> {
        Err("download not scripted".into())
    }

    async fn list_files(&self) -> Result<Vec<FileInfo>, BackendError> {
        Ok(vec![])
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), BackendError> {
        self.state
            .lock()
            .unwrap()
            .deleted_files
            .push(file_id.to_string());
        Ok(())
    }
}

fn run(id: &str, status: RunStatus) -> Run {
    Run {
        id: id.to_string(),
        status,
        last_error: None,
        tool_calls: Vec::new(),
    }
}

fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn reply_message(run_id: &str, text: &str) -> ThreadMessage {
    ThreadMessage {
        id: "msg_1".to_string(),
        run_id: Some(run_id.to_string()),
        role: Role::Assistant,
        text: text.to_string(),
        annotations: Vec::new(),
        file_ids: Vec::new(),
    }
}

fn fast_config() -> SessionConfig {
    SessionConfig::new("You are a weather bot.", "gpt-3.5-turbo-1106")
        .with_poll_interval(Duration::from_millis(1))
}

fn weather_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(WeatherFunction::new()));
    registry
}

#[tokio::test]
async fn test_chat_drives_requires_action_to_completion() {
    let mut action = run("run_1", RunStatus::RequiresAction);
    action.tool_calls = vec![tool_call(
        "call_1",
        "weather",
        r#"{"location": "Paris"}"#,
    )];
    let backend = Arc::new(ScriptedBackend::new(
        vec![
            run("run_1", RunStatus::Queued),
            run("run_1", RunStatus::InProgress),
            action,
            run("run_1", RunStatus::Completed),
        ],
        vec![reply_message("run_1", "It is sunny in Paris.")],
    ));

    let mut session = AssistantSession::start(backend.clone(), fast_config(), weather_registry())
        .await
        .unwrap();
    let thread = session.create_thread().await.unwrap();
    let reply = session
        .chat(&thread.id, "What is the weather in Paris?", &[], None)
        .await
        .unwrap();

    assert_eq!(reply, "assistant: It is sunny in Paris.");

    let batches = backend.submitted_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].call_id, "call_1");
    assert_eq!(batches[0][0].output, "The weather in Paris is sunny");

    // The local mirror carries both sides of the exchange.
    let transcript = session.conversation().render();
    assert!(transcript.contains("user: What is the weather in Paris?"));
    assert!(transcript.contains("It is sunny in Paris."));
}

#[tokio::test]
async fn test_unknown_function_still_answers_every_call() {
    let mut action = run("run_1", RunStatus::RequiresAction);
    action.tool_calls = vec![
        tool_call("call_1", "ghost", "{}"),
        tool_call("call_2", "weather", r#"{"location": "Lima"}"#),
    ];
    let backend = Arc::new(ScriptedBackend::new(
        vec![action, run("run_1", RunStatus::Completed)],
        vec![reply_message("run_1", "done")],
    ));

    let mut session = AssistantSession::start(backend.clone(), fast_config(), weather_registry())
        .await
        .unwrap();
    let thread = session.create_thread().await.unwrap();
    session.chat(&thread.id, "hi", &[], None).await.unwrap();

    let batches = backend.submitted_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[0][0].output, "Function ghost not found");
    assert_eq!(batches[0][1].output, "The weather in Lima is sunny");
}

#[tokio::test]
async fn test_failed_run_is_fatal_with_error_payload() {
    let mut failed = run("run_1", RunStatus::Failed);
    failed.last_error = Some("rate_limit_exceeded: slow down".to_string());
    let backend = Arc::new(ScriptedBackend::new(vec![failed], vec![]));

    let mut session = AssistantSession::start(backend, fast_config(), weather_registry())
        .await
        .unwrap();
    let thread = session.create_thread().await.unwrap();
    let err = session.chat(&thread.id, "hi", &[], None).await.unwrap_err();

    let session_err = err.downcast_ref::<SessionError>().expect("session error");
    match session_err {
        SessionError::RunFailed(detail) => assert!(detail.contains("rate_limit_exceeded")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_expired_run_names_pending_functions() {
    let mut expired = run("run_1", RunStatus::Expired);
    expired.tool_calls = vec![tool_call("call_1", "weather", "{}")];
    let backend = Arc::new(ScriptedBackend::new(vec![expired], vec![]));

    let mut session = AssistantSession::start(backend, fast_config(), weather_registry())
        .await
        .unwrap();
    let thread = session.create_thread().await.unwrap();
    let err = session.chat(&thread.id, "hi", &[], None).await.unwrap_err();

    match err.downcast_ref::<SessionError>().expect("session error") {
        SessionError::RunExpired(pending) => assert_eq!(pending, &vec!["weather".to_string()]),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("Run expired when calling weather"));
}

#[tokio::test]
async fn test_shutdown_deletes_tracked_remote_objects() {
    let backend = Arc::new(ScriptedBackend::new(vec![], vec![]));
    let mut session = AssistantSession::start(backend.clone(), fast_config(), weather_registry())
        .await
        .unwrap();
    session.create_thread().await.unwrap();
    session.shutdown().await;

    let (threads, assistants) = backend.deleted();
    assert_eq!(threads, vec!["thread_1".to_string()]);
    assert_eq!(assistants, vec!["asst_1".to_string()]);
}

#[tokio::test]
async fn test_shutdown_deletes_adopted_files() {
    let backend = Arc::new(ScriptedBackend::new(vec![], vec![]));
    let mut session = AssistantSession::start(backend.clone(), fast_config(), weather_registry())
        .await
        .unwrap();
    // A file uploaded before the session existed and handed over afterwards
    // is cleaned up like any session upload.
    session.track_file("file_7");
    session.shutdown().await;

    assert_eq!(backend.deleted_files(), vec!["file_7".to_string()]);
}

#[tokio::test]
async fn test_replay_rebuilds_mirror_in_chronological_order() {
    // list_messages returns newest first; the mirror must come out oldest
    // first.
    let newest_first = vec![
        reply_message("run_1", "It is sunny in Lima."),
        ThreadMessage {
            id: "msg_0".to_string(),
            run_id: None,
            role: Role::User,
            text: "What is the weather in Lima?".to_string(),
            annotations: Vec::new(),
            file_ids: Vec::new(),
        },
    ];
    let backend = Arc::new(ScriptedBackend::new(vec![], newest_first));
    let mut session = AssistantSession::start(backend, fast_config(), weather_registry())
        .await
        .unwrap();

    session.replay_conversation("thread_1").await.unwrap();

    assert_eq!(
        session.conversation().render(),
        "user: What is the weather in Lima?\nassistant: It is sunny in Lima."
    );
}

#[tokio::test]
async fn test_shutdown_honors_cleanup_opt_out() {
    let backend = Arc::new(ScriptedBackend::new(vec![], vec![]));
    let config = fast_config().keep_remote_objects();
    let mut session = AssistantSession::start(backend.clone(), config, weather_registry())
        .await
        .unwrap();
    session.create_thread().await.unwrap();
    session.shutdown().await;

    let (threads, assistants) = backend.deleted();
    assert!(threads.is_empty());
    assert!(assistants.is_empty());
}
