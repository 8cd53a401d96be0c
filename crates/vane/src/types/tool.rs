//! Tool Types
//!
//! Descriptors advertised in the handshake. Immutable once the server starts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Programmatic name of the tool.
    pub name: String,

    /// JSON Schema for the arguments object.
    pub schema: ToolSchema,

    /// Description for the LLM.
    pub description: String,
}

impl ToolDescriptor {
    /// Create a new tool with name and description and no parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: ToolSchema::empty(),
            description: description.into(),
        }
    }

    /// Set the argument schema.
    pub fn with_schema(mut self, schema: ToolSchema) -> Self {
        self.schema = schema;
        self
    }
}

/// JSON Schema for tool arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Always "object" for tool schemas.
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Property definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,

    /// Required property names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolSchema {
    /// Create an empty schema (no parameters).
    pub fn empty() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: None,
            required: None,
        }
    }

    /// Create a schema from a JSON value, keeping only `type`, `properties`
    /// and `required`.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::empty();
        };

        Self {
            schema_type: map
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("object")
                .to_string(),
            properties: map.get("properties").and_then(|v| v.as_object()).cloned(),
            required: map.get("required").and_then(|v| v.as_array()).map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            }),
        }
    }

    /// Render back to a plain JSON Schema value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
    }
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_wire_shape() {
        let tool = ToolDescriptor::new("get_historical_weather", "Fetch weather as text.")
            .with_schema(ToolSchema::from_value(json!({
                "type": "object",
                "properties": { "latitude": { "type": "number" } },
                "required": ["latitude"]
            })));

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["name"], "get_historical_weather");
        assert_eq!(value["description"], "Fetch weather as text.");
        assert_eq!(value["schema"]["type"], "object");
        assert_eq!(value["schema"]["required"][0], "latitude");
    }

    #[test]
    fn test_from_value_drops_metadata() {
        let schema = ToolSchema::from_value(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "WeatherQuery",
            "type": "object",
            "properties": {}
        }));

        let value = schema.to_value();
        assert!(value.get("$schema").is_none());
        assert!(value.get("title").is_none());
        assert!(value.get("required").is_none());
    }

    #[test]
    fn test_from_non_object_is_empty() {
        assert_eq!(ToolSchema::from_value(json!("nope")), ToolSchema::empty());
    }
}
