use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;

/// A tool's execution handler. Takes the tool's single string argument.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, argument: &str) -> Result<String, ToolError>;
}

/// A tool definition: what the model is told about it + the handler that runs it.
pub struct ToolDef {
    pub name: String,
    pub description: String,
    /// Name of the single string parameter exposed to the model.
    pub parameter: String,
    pub(crate) handler: Arc<dyn ToolHandler>,
}

impl ToolDef {
    /// Complete JSON tool definition (name, description, input_schema).
    pub fn schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(self.parameter.clone(), json!({ "type": "string" }));

        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": [self.parameter],
            }
        })
    }

    /// Pull the single string argument out of the model's raw payload.
    ///
    /// Accepts `{"<parameter>": "..."}`, any object with exactly one string
    /// field, a bare JSON string, or plain text.
    pub fn argument(&self, raw: &str) -> String {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => {
                if let Some(v) = map.get(&self.parameter) {
                    return match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                }
                let strings: Vec<&str> = map.values().filter_map(Value::as_str).collect();
                match strings.as_slice() {
                    [only] => only.to_string(),
                    _ => raw.to_string(),
                }
            }
            Ok(Value::String(s)) => s,
            _ => raw.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn call(&self, _argument: &str) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }

    fn def() -> ToolDef {
        ToolDef {
            name: "get_weather_info".into(),
            description: "Weather".into(),
            parameter: "location".into(),
            handler: Arc::new(Noop),
        }
    }

    #[test]
    fn argument_from_named_field() {
        assert_eq!(def().argument(r#"{"location": "Paris"}"#), "Paris");
    }

    #[test]
    fn argument_from_single_other_field() {
        assert_eq!(def().argument(r#"{"__arg1": "Tokyo"}"#), "Tokyo");
    }

    #[test]
    fn argument_from_bare_text() {
        assert_eq!(def().argument("  London "), "London");
        assert_eq!(def().argument(r#""Seattle""#), "Seattle");
    }

    #[test]
    fn schema_requires_parameter() {
        let schema = def().schema();
        assert_eq!(schema["name"], "get_weather_info");
        assert_eq!(schema["input_schema"]["required"][0], "location");
        assert_eq!(
            schema["input_schema"]["properties"]["location"]["type"],
            "string"
        );
    }
}
