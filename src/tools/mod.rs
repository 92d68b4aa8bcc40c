//! Tools agents can call: the tool abstraction, the arithmetic evaluator and
//! the data-provider lookups.

pub mod budget;
pub mod calculator;
pub mod events;
pub mod function_factory;
pub mod geocode;
pub mod match_score;
pub mod provider;
pub mod safety;
pub mod search;
pub mod tool;
pub mod transport;
pub mod weather;

pub use budget::{BudgetTool, TravelBudget};
pub use calculator::{evaluate, CalcError, CalculatorTool};
pub use events::{EventsTool, LocalEvent};
pub use function_factory::FunctionFactory;
pub use geocode::{GeoLocation, GeocodeTool};
pub use match_score::{calculate_match_score, CalculateMatchScore};
pub use provider::ProviderClient;
pub use safety::{SafetyInfo, SafetyTool};
pub use search::SearchTool;
pub use tool::{Tool, ToolFuture, ToolRegistry};
pub use transport::{TransportRoutes, TransportTool};
pub use weather::{WeatherForecast, WeatherTool};

/// Every tool name [`toolbox`] knows how to build.
pub const TOOL_NAMES: &[&str] = &[
    "calculate_match_score",
    "calculate_travel_budget",
    "calculator",
    "geocode_city",
    "get_local_events",
    "get_safety_information",
    "get_transportation_routes",
    "get_weather_forecast",
    "search_internet",
];

/// A factory holding the named tools, sharing one provider client. Unknown
/// names are skipped.
pub fn toolbox(names: &[&str], provider: &ProviderClient) -> FunctionFactory {
    let mut factory = FunctionFactory::new();
    for name in names {
        match *name {
            "calculate_match_score" => factory.register_tool(CalculateMatchScore),
            "calculate_travel_budget" => factory.register_tool(BudgetTool::new(provider.clone())),
            "calculator" => factory.register_tool(CalculatorTool::new()),
            "geocode_city" => factory.register_tool(GeocodeTool::new(provider.clone())),
            "get_local_events" => factory.register_tool(EventsTool::new(provider.clone())),
            "get_safety_information" => factory.register_tool(SafetyTool::new(provider.clone())),
            "get_transportation_routes" => {
                factory.register_tool(TransportTool::new(provider.clone()))
            }
            "get_weather_forecast" => factory.register_tool(WeatherTool::new(provider.clone())),
            "search_internet" => factory.register_tool(SearchTool::new(provider.clone())),
            other => tracing::warn!(target: "trip_planner::tools", tool = other, "unknown tool name"),
        }
    }
    factory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolbox_builds_every_known_tool() {
        let factory = toolbox(TOOL_NAMES, &ProviderClient::new(Default::default()));
        let mut names = factory.function_names();
        names.sort_unstable();
        assert_eq!(names, TOOL_NAMES);
    }

    #[test]
    fn unknown_names_are_skipped() {
        let factory = toolbox(&["calculator", "teleport"], &ProviderClient::new(Default::default()));
        assert_eq!(factory.function_names(), vec!["calculator"]);
    }
}
