//! Canned weather stub.
//!
//! Always sunny. Useful for verifying the function-calling plumbing against
//! a live assistant without involving any real backend service.

use crate::convoke::function::{AssistantFunction, FunctionError, Property, PropertyType};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Reports the weather for a location (it is always sunny).
pub struct WeatherFunction {
    parameters: Vec<Property>,
}

impl WeatherFunction {
    pub fn new() -> Self {
        Self {
            parameters: vec![Property::new("location", PropertyType::String)
                .with_description("The location to get the weather for")
                .required()],
        }
    }
}

impl Default for WeatherFunction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantFunction for WeatherFunction {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> Option<&str> {
        Some("Get the weather for a location")
    }

    fn parameters(&self) -> &[Property] {
        &self.parameters
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, FunctionError> {
        let location = args
            .get("location")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FunctionError::InvalidArguments("location must be a string".into()))?;
        Ok(format!("The weather in {} is sunny", location))
    }
}
