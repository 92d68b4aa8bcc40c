use super::{tool::ToolRegistry, Tool};
use crate::{PlannerError, Result};
use serde_json::Value;
use tracing::debug;

/// Dispatches tool calls made by an agent to registered tools
#[derive(Debug, Default)]
pub struct FunctionFactory {
    registry: ToolRegistry,
}

impl FunctionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with the factory
    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) {
        self.registry.register(tool);
    }

    /// Builder form of [`FunctionFactory::register_tool`]
    pub fn with_tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.register_tool(tool);
        self
    }

    /// Execute a function call by name
    pub async fn execute_function(&self, function_name: &str, parameters: Value) -> Result<Value> {
        let tool = self
            .registry
            .get(function_name)
            .ok_or_else(|| PlannerError::ToolNotFound(function_name.to_string()))?;

        debug!(target: "trip_planner::tools", tool = function_name, "executing tool");
        tool.execute(parameters).await
    }

    pub fn get_openai_tools(&self) -> Vec<Value> {
        self.registry.to_openai_tools()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.registry.get(name).is_some()
    }

    pub fn function_names(&self) -> Vec<&'static str> {
        self.registry.list().iter().map(|tool| tool.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::CalculatorTool;
    use serde_json::json;

    #[test]
    fn dispatches_by_name() {
        let factory = FunctionFactory::new().with_tool(CalculatorTool::new());
        assert_eq!(factory.function_names(), vec!["calculator"]);

        let result = tokio_test::block_on(
            factory.execute_function("calculator", json!({ "expression": "2 * (3 + 4)" })),
        )
        .unwrap();
        assert_eq!(result["result"], 14.0);
    }

    #[test]
    fn unknown_function_is_reported() {
        let factory = FunctionFactory::new();
        assert!(factory.is_empty());

        let err = tokio_test::block_on(factory.execute_function("teleport", json!({}))).unwrap_err();
        assert!(matches!(err, PlannerError::ToolNotFound(name) if name == "teleport"));
    }
}
