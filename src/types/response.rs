use std::borrow::Cow;

use serde_json::Value;

use crate::schemas::CompletionSchema;

/// Whatever an agent invocation handed back.
///
/// The orchestration layer may return a completion object with a
/// distinguished raw-text field, bare text, or an arbitrary JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    /// Completion with its raw text and the number of model turns it took.
    Output { raw: String, iterations: usize },
    Text(String),
    Value(Value),
}

impl AgentResponse {
    pub fn text(text: impl Into<String>) -> Self {
        AgentResponse::Text(text.into())
    }

    /// The text to parse: the raw field if there is one, the text itself if
    /// the response is text, otherwise the value stringified.
    pub fn extract_text(&self) -> Cow<'_, str> {
        match self {
            AgentResponse::Output { raw, .. } => Cow::Borrowed(raw),
            AgentResponse::Text(text) => Cow::Borrowed(text),
            AgentResponse::Value(value) => match value {
                Value::String(text) => Cow::Borrowed(text),
                Value::Object(map) => match map.get("raw").and_then(Value::as_str) {
                    Some(raw) => Cow::Borrowed(raw),
                    None => Cow::Owned(value.to_string()),
                },
                other => Cow::Owned(other.to_string()),
            },
        }
    }
}

/// Deserialize a schema-checked payload into its typed form, naming the
/// failing path (`<root>` when the document itself is wrong).
pub fn deserialize_structured_response<T>(payload: &Value) -> Result<T, String>
where
    T: CompletionSchema,
{
    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        format!(
            "failed to deserialize `{}` at {}: {}",
            T::schema().schema_name(),
            location,
            err.inner()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::travel::TravelPlan;
    use serde_json::json;

    #[test]
    fn extracts_distinguished_raw_field() {
        let response = AgentResponse::Value(json!({"raw": "{\"a\":1}", "tokens": 12}));
        assert_eq!(response.extract_text(), "{\"a\":1}");

        let output = AgentResponse::Output {
            raw: "plain".into(),
            iterations: 2,
        };
        assert_eq!(output.extract_text(), "plain");
    }

    #[test]
    fn stringifies_values_without_raw_field() {
        let response = AgentResponse::Value(json!({"recommended_cities": []}));
        assert_eq!(response.extract_text(), r#"{"recommended_cities":[]}"#);

        let response = AgentResponse::Value(json!("already text"));
        assert_eq!(response.extract_text(), "already text");

        assert_eq!(AgentResponse::Value(json!(42)).extract_text(), "42");
    }

    #[test]
    fn deserialize_error_names_path() {
        let payload = json!({
            "itinerary": [{"day": "one", "date": "2030-01-01", "activities": [], "meals": []}],
            "budget_breakdown": {"accommodation": 1, "food": 1, "activities": 1, "transportation": 1, "total": 4},
            "recommendations": []
        });
        let err = deserialize_structured_response::<TravelPlan>(&payload).unwrap_err();
        assert!(err.contains("itinerary[0].day"), "{err}");
        assert!(err.contains("TravelPlan"));
    }
}
