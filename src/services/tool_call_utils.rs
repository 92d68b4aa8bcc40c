//! Helpers for reading `tool_calls` entries of an assistant message.

use crate::error::PlannerError;
use serde_json::Value;

/// One requested tool invocation, already decoded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RequestedCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

pub(crate) fn extract_tool_call_id(tool_call: &Value) -> &str {
    tool_call
        .get("id")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
}

/// Function name of a tool call, if present and non-empty.
pub(crate) fn extract_function_name(tool_call: &Value) -> Option<&str> {
    tool_call
        .pointer("/function/name")
        .and_then(|value| value.as_str())
        .filter(|name| !name.is_empty())
}

/// Raw argument string; models send it JSON-encoded.
pub(crate) fn extract_arguments_str(tool_call: &Value) -> &str {
    tool_call
        .pointer("/function/arguments")
        .and_then(|value| value.as_str())
        .unwrap_or("")
}

pub(crate) fn parse_function_arguments(
    arguments_str: &str,
    function_name: &str,
) -> Result<Value, PlannerError> {
    // Some providers send an empty string for argument-less calls.
    if arguments_str.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments_str).map_err(|err| {
        PlannerError::InvalidFunctionCall(format!(
            "Failed to parse arguments for tool '{}': {}",
            function_name, err
        ))
    })
}

/// Decode a tool call into id, name and arguments.
pub(crate) fn decode_tool_call(tool_call: &Value) -> Result<RequestedCall, PlannerError> {
    let id = extract_tool_call_id(tool_call).to_string();
    let name = extract_function_name(tool_call)
        .ok_or_else(|| PlannerError::InvalidFunctionCall("Tool call missing function name".into()))?
        .to_string();
    let arguments = parse_function_arguments(extract_arguments_str(tool_call), &name)?;
    Ok(RequestedCall {
        id,
        name,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_well_formed_call() {
        let call = json!({
            "id": "call_1",
            "type": "function",
            "function": {"name": "calculator", "arguments": "{\"expression\":\"1+1\"}"}
        });
        let decoded = decode_tool_call(&call).unwrap();
        assert_eq!(decoded.id, "call_1");
        assert_eq!(decoded.name, "calculator");
        assert_eq!(decoded.arguments["expression"], "1+1");
    }

    #[test]
    fn rejects_missing_name_and_bad_arguments() {
        let nameless = json!({"id": "x", "function": {"arguments": "{}"}});
        assert!(matches!(
            decode_tool_call(&nameless),
            Err(PlannerError::InvalidFunctionCall(_))
        ));

        let garbled = json!({"id": "x", "function": {"name": "calculator", "arguments": "{oops"}});
        assert!(decode_tool_call(&garbled)
            .unwrap_err()
            .to_string()
            .contains("calculator"));
    }

    #[test]
    fn empty_arguments_are_an_empty_object() {
        let call = json!({"id": "x", "function": {"name": "search_internet", "arguments": ""}});
        assert_eq!(decode_tool_call(&call).unwrap().arguments, json!({}));
    }
}
