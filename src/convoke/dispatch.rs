//! Argument Validation & Dispatch
//!
//! The remote service hands the session a batch of tool calls: a name plus a
//! raw JSON argument blob each. This module resolves every call against the
//! registered [`AssistantFunction`]s, validates the arguments against the
//! declared parameters, executes, and renders exactly one [`ToolOutput`] per
//! call. A failing call never aborts the run; its error text becomes the
//! output the remote service sees, so the model can retry or apologize.

use crate::convoke::function::{AssistantFunction, FunctionError};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One tool call requested by the remote service. Transient; lives only for
/// the duration of a dispatch.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Opaque identifier assigned by the remote service.
    pub call_id: String,
    /// Name of the function the service wants executed.
    pub name: String,
    /// Parsed argument map. Empty when the call carried no arguments.
    pub arguments: Map<String, Value>,
}

impl FunctionCall {
    /// Build a call from its wire representation. An empty or `null` argument
    /// blob yields an empty map; any other non-object blob is rejected.
    pub fn from_wire(
        call_id: impl Into<String>,
        name: impl Into<String>,
        raw_arguments: &str,
    ) -> Result<Self, FunctionError> {
        let trimmed = raw_arguments.trim();
        let arguments = if trimmed.is_empty() || trimmed == "null" {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(FunctionError::InvalidArguments(format!(
                        "expected a JSON object, got {}",
                        other
                    )))
                }
                Err(e) => return Err(FunctionError::InvalidArguments(e.to_string())),
            }
        };
        Ok(Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments,
        })
    }
}

/// The answer to one [`FunctionCall`], submitted back to the remote service.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub call_id: String,
    pub output: String,
}

/// Ordered collection of functions exposed to one assistant.
///
/// Lookup is a linear scan over registration order; the registry is small by
/// construction (a handful of functions per assistant).
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Vec<Arc<dyn AssistantFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    /// Append a function. Registration order is preserved.
    pub fn register(&mut self, function: Arc<dyn AssistantFunction>) {
        self.functions.push(function);
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Borrow a function by name, scanning in registration order.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AssistantFunction>> {
        self.functions.iter().find(|f| f.name() == name)
    }

    /// Schemas for every registered function, in registration order.
    pub fn schemas(&self) -> Vec<Value> {
        self.functions
            .iter()
            .map(|f| crate::convoke::function::function_schema(f.as_ref()))
            .collect()
    }

    /// Resolve and execute one call, converting every failure into output
    /// text. The remote service requires a response for each call id, so this
    /// never drops a call and never returns an error.
    pub async fn dispatch(&self, call: &FunctionCall) -> ToolOutput {
        let output = match self.run_validated(call).await {
            Ok(result) => result,
            Err(e) => e.to_string(),
        };
        ToolOutput {
            call_id: call.call_id.clone(),
            output,
        }
    }

    /// Dispatch a batch of simultaneous calls, yielding exactly one output
    /// per call in batch order.
    pub async fn dispatch_batch(&self, calls: &[FunctionCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            log::info!("dispatching function call {} ({})", call.name, call.call_id);
            let output = self.dispatch(call).await;
            log::debug!("function {} answered: {}", call.name, output.output);
            outputs.push(output);
        }
        outputs
    }

    async fn run_validated(&self, call: &FunctionCall) -> Result<String, FunctionError> {
        let function = self
            .get(&call.name)
            .ok_or_else(|| FunctionError::NotFound(call.name.clone()))?;
        validate_arguments(function.as_ref(), &call.arguments)?;
        function.call(&call.arguments).await
    }
}

/// Check an argument map against a function's declared parameters.
fn validate_arguments(
    function: &dyn AssistantFunction,
    arguments: &Map<String, Value>,
) -> Result<(), FunctionError> {
    let parameters = function.parameters();
    if arguments.is_empty() && parameters.iter().any(|p| p.required) {
        return Err(FunctionError::MissingParameters);
    }
    if !arguments.is_empty() && parameters.is_empty() {
        return Err(FunctionError::UnexpectedParameters);
    }
    for p in parameters {
        if p.required && !arguments.contains_key(&p.name) {
            return Err(FunctionError::MissingParameter(p.name.clone()));
        }
    }
    Ok(())
}
