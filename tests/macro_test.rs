use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use trip_planner_rs::{tools::Tool, CompletionSchema, PlannerError};

#[derive(Debug, Deserialize, JsonSchema)]
struct ConversionParams {
    amount: f64,
    rate: f64,
    #[serde(default)]
    currency: Option<String>,
}

trip_planner_rs::tool!(
    name = "convert_amount",
    description = "Convert a USD amount with a fixed exchange rate",
    params = ConversionParams,
    |params: ConversionParams| async move {
        if params.rate <= 0.0 {
            return Err(format!("rate must be positive, got {}", params.rate));
        }
        Ok(json!({
            "converted": params.amount * params.rate,
            "currency": params.currency.unwrap_or_else(|| "USD".to_string())
        }))
    }
);

#[tokio::test]
async fn test_macro_generated_tool() {
    let tool = ConvertAmount;

    assert_eq!(tool.name(), "convert_amount");
    assert_eq!(
        tool.description(),
        "Convert a USD amount with a fixed exchange rate"
    );
    assert!(tool.parameters_schema().is_object());

    let result = tool
        .execute(json!({ "amount": 100.0, "rate": 0.5, "currency": "GBP" }))
        .await
        .unwrap();
    assert_eq!(result["converted"], 50.0);
    assert_eq!(result["currency"], "GBP");
}

#[tokio::test]
async fn test_macro_tool_optional_params() {
    let result = ConvertAmount
        .execute(json!({ "amount": 10.0, "rate": 2.0 }))
        .await
        .unwrap();
    assert_eq!(result["converted"], 20.0);
    assert_eq!(result["currency"], "USD");
}

#[tokio::test]
async fn test_macro_tool_errors_become_tool_execution() {
    let err = ConvertAmount
        .execute(json!({ "amount": 10.0, "rate": 0.0 }))
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::ToolExecution(ref msg) if msg.contains("rate must be positive")));

    let err = ConvertAmount
        .execute(json!({ "amount": "ten" }))
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::ToolExecution(_)));
}

/// Packing list produced by an assistant
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[trip_planner_rs::completion_schema(name = "PackingList")]
struct PackingList {
    /// Items to bring
    items: Vec<String>,
    /// Checked-bag weight in kilograms
    weight_kg: f64,
}

#[test]
fn test_completion_schema_attaches_handle() {
    let handle = PackingList::schema();
    assert_eq!(handle.schema_name(), "PackingList");
    assert_eq!(handle.required_keys(), vec!["items", "weight_kg"]);

    let described = handle.describe();
    assert!(described.contains("Items to bring"));
    assert!(std::ptr::eq(handle, PackingList::schema()));
}
