//! Function Contract Layer
//!
//! This module defines the contract between the assistant session and locally
//! executable functions. A function declares a name, a description, and an
//! ordered list of [`Property`] parameters; the session converts that
//! declaration into the JSON-schema shape the remote service expects, and the
//! dispatcher validates incoming arguments against it before execution.
//!
//! # Architecture
//!
//! ```text
//! AssistantSession → FunctionRegistry → AssistantFunction (trait) → [Weather | SQL | QA | User-defined]
//! ```
//!
//! # Example
//!
//! ```rust
//! use convoke::function::{Property, PropertyType};
//!
//! let param = Property::new("location", PropertyType::String)
//!     .with_description("The location to get the weather for")
//!     .required();
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt;

/// Type tag for a declared function parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl PropertyType {
    /// The string tag used in the emitted schema (e.g. `"string"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Integer => "integer",
            PropertyType::Boolean => "boolean",
            PropertyType::Array => "array",
            PropertyType::Object => "object",
        }
    }
}

/// One declared parameter of an assistant-callable function.
///
/// Immutable after construction; declaration order is significant because the
/// emitted `required` list preserves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub required: bool,
    pub description: Option<String>,
}

impl Property {
    /// Define a new optional property with the provided name and type.
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            required: false,
            description: None,
        }
    }

    /// Add a human readable description that surfaces in the generated schema.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Error types raised by function validation and execution.
#[derive(Debug, Clone)]
pub enum FunctionError {
    /// Requested function has no entry in the registry.
    NotFound(String),
    /// The call supplied no arguments but the function requires some.
    MissingParameters,
    /// The call supplied arguments to a function that declares none.
    UnexpectedParameters,
    /// One specific required parameter was absent from the argument map.
    MissingParameter(String),
    /// The wire argument blob was not a JSON object.
    InvalidArguments(String),
    /// The function body itself failed.
    ExecutionFailed(String),
}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionError::NotFound(name) => write!(f, "Function {} not found", name),
            FunctionError::MissingParameters => write!(f, "Missing parameters"),
            FunctionError::UnexpectedParameters => write!(f, "Unexpected parameters"),
            FunctionError::MissingParameter(name) => write!(f, "Missing parameter {}", name),
            FunctionError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            FunctionError::ExecutionFailed(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for FunctionError {}

/// An executable, schema-described function the assistant may call.
///
/// Implementations destructure the validated argument map themselves instead
/// of relying on positional expansion; the dispatcher guarantees every
/// required [`Property`] is present before `call` runs.
#[async_trait]
pub trait AssistantFunction: Send + Sync {
    /// Unique function identifier advertised to the remote service.
    fn name(&self) -> &str;

    /// Optional human readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Ordered parameter declarations. Empty means the function takes none.
    fn parameters(&self) -> &[Property] {
        &[]
    }

    /// Execute the function with the validated argument map and return a
    /// string rendering of the result. Side effects (file I/O, SQL, outbound
    /// HTTP) are the implementation's business.
    async fn call(&self, args: &Map<String, Value>) -> Result<String, FunctionError>;
}

/// Convert a function declaration into the schema object the remote service
/// understands.
///
/// Pure and deterministic: a function with no parameters yields an object
/// schema with zero properties and an empty `required` list; otherwise the
/// `required` array preserves declaration order.
pub fn function_schema(function: &dyn AssistantFunction) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for p in function.parameters() {
        properties.insert(
            p.name.clone(),
            json!({
                "type": p.property_type.as_str(),
                "description": p.description,
            }),
        );
        if p.required {
            required.push(Value::String(p.name.clone()));
        }
    }
    json!({
        "name": function.name(),
        "description": function.description(),
        "parameters": {
            "type": "object",
            "properties": properties,
            "required": required,
        },
    })
}
