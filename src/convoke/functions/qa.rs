//! Question-answering HTTP proxy function.
//!
//! Forwards a natural-language question to a remote question-answering
//! service as `{db_connection_id, question}` and relays the answer. The
//! service replies 201 with a JSON body on success; anything else maps to a
//! fixed "don't know" fallback rather than an error, so an unhealthy service
//! degrades into a polite reply instead of killing the run.

use crate::convoke::function::{AssistantFunction, FunctionError, Property, PropertyType};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Answer returned when the remote service cannot help.
pub const FALLBACK_ANSWER: &str = "Sorry, I don't know the answer to that question.";

/// Map a raw service response to the answer text. Pure; 201 with a
/// `response` field is the only success shape, and a present
/// `sql_query_result` is appended as JSON on its own line.
pub fn render_answer(status: u16, body: &str) -> String {
    if status != 201 {
        return FALLBACK_ANSWER.to_string();
    }
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return FALLBACK_ANSWER.to_string(),
    };
    let response = match parsed.get("response").and_then(|v| v.as_str()) {
        Some(r) => r.to_string(),
        None => return FALLBACK_ANSWER.to_string(),
    };
    match parsed.get("sql_query_result") {
        Some(result) if !result.is_null() => format!("{}\n{}", response, result),
        _ => response,
    }
}

/// Proxies questions about a registered database to the remote service.
pub struct QuestionAnswerFunction {
    client: reqwest::Client,
    endpoint: String,
    /// Database name → remote connection id.
    databases: HashMap<String, String>,
    default_db: String,
    parameters: Vec<Property>,
}

impl QuestionAnswerFunction {
    /// Create a proxy against `endpoint` with the given database table.
    /// `default_db` names the database used when the model omits `db_name`.
    pub fn new(
        endpoint: impl Into<String>,
        databases: Vec<(String, String)>,
        default_db: impl Into<String>,
    ) -> Self {
        let names = databases
            .iter()
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            databases: databases.into_iter().collect(),
            default_db: default_db.into(),
            parameters: vec![
                Property::new("db_name", PropertyType::String).with_description(format!(
                    "The database to query, possible values are: {}",
                    names
                )),
                Property::new("question", PropertyType::String)
                    .with_description("The question to answer")
                    .required(),
            ],
        }
    }
}

#[async_trait]
impl AssistantFunction for QuestionAnswerFunction {
    fn name(&self) -> &str {
        "answer_question"
    }

    fn description(&self) -> Option<&str> {
        Some("Answer questions on a given database")
    }

    fn parameters(&self) -> &[Property] {
        &self.parameters
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, FunctionError> {
        let question = args
            .get("question")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FunctionError::InvalidArguments("question must be a string".into()))?;
        let db_name = args
            .get("db_name")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.default_db);
        let db_connection_id = self.databases.get(db_name).ok_or_else(|| {
            FunctionError::ExecutionFailed(format!("unknown database {}", db_name))
        })?;

        let payload = serde_json::json!({
            "db_connection_id": db_connection_id,
            "question": question,
        });
        log::debug!("asking {} about {}: {}", self.endpoint, db_name, question);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
        Ok(render_answer(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_response_with_query_result() {
        let body = r#"{"response": "42 listings", "sql_query_result": [{"count": 42}]}"#;
        assert_eq!(render_answer(201, body), "42 listings\n[{\"count\":42}]");
    }

    #[test]
    fn test_created_response_without_query_result() {
        let body = r#"{"response": "42 listings"}"#;
        assert_eq!(render_answer(201, body), "42 listings");
    }

    #[test]
    fn test_server_error_maps_to_fallback() {
        assert_eq!(
            render_answer(500, r#"{"response": "ignored"}"#),
            FALLBACK_ANSWER
        );
    }

    #[test]
    fn test_garbled_body_maps_to_fallback() {
        assert_eq!(render_answer(201, "not json"), FALLBACK_ANSWER);
    }
}
