//! Task prompts for the planning agents.
//!
//! Each prompt embeds the validated request and the JSON schema of the
//! document the agent must return.

use std::fmt;

use crate::{
    schemas::CompletionSchema,
    tools::FunctionFactory,
    types::travel::{CityRecommendation, CityRecommendationSet, TravelPlan, TripRequest},
};

/// Minimum number of candidates requested from the city selection expert.
pub const MIN_CITY_RECOMMENDATIONS: usize = 5;

fn or_unspecified(value: Option<String>) -> String {
    value.unwrap_or_else(|| "Not specified".to_string())
}

fn joined<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        return "Not specified".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn output_contract<T: CompletionSchema>() -> String {
    format!(
        "Respond with a single JSON object, and nothing else, matching this JSON schema:\n{}",
        T::schema().describe()
    )
}

/// Prompt for the city selection step.
pub fn city_selection_prompt(request: &TripRequest) -> String {
    CitySelectionPrompt(request).to_string()
}

/// Prompt for the travel planning step, optionally with the chosen city's
/// recommendation for context.
pub fn travel_plan_prompt(request: &TripRequest, city: Option<&CityRecommendation>) -> String {
    TravelPlanPrompt { request, city }.to_string()
}

struct CitySelectionPrompt<'a>(&'a TripRequest);

impl fmt::Display for CitySelectionPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request = self.0;
        writeln!(
            f,
            "Recommend at least {MIN_CITY_RECOMMENDATIONS} cities that best match this traveller:"
        )?;
        writeln!(f, "- Origin: {}", or_unspecified(request.origin().map(str::to_string)))?;
        writeln!(f, "- Interests: {}", joined(request.interests()))?;
        writeln!(
            f,
            "- Daily budget: {}",
            or_unspecified(request.budget().map(|b| format!("${b:.0}")))
        )?;
        writeln!(
            f,
            "- Trip length: {}",
            or_unspecified(request.duration().map(|d| format!("{d} days")))
        )?;
        writeln!(
            f,
            "- Season: {}",
            or_unspecified(request.season().map(|s| s.to_string()))
        )?;
        f.write_str(
            "\nFor each city give a short description, a match score between 0 and 1 \
             (use calculate_match_score), three or more highlights and the estimated daily \
             cost for accommodation, food and activities with their total per day.\n\
             Rank the cities by interest match, budget compatibility, weather in that season \
             and safety, best match first.\n\n",
        )?;
        f.write_str(&output_contract::<CityRecommendationSet>())
    }
}

struct TravelPlanPrompt<'a> {
    request: &'a TripRequest,
    city: Option<&'a CityRecommendation>,
}

impl fmt::Display for TravelPlanPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request = self.request;
        writeln!(f, "Create a detailed day-by-day travel plan:")?;
        writeln!(
            f,
            "- Destination: {}",
            or_unspecified(request.destination().map(str::to_string))
        )?;
        writeln!(
            f,
            "- Dates: {} to {}",
            or_unspecified(request.start_date().map(|d| d.to_string())),
            or_unspecified(request.end_date().map(|d| d.to_string()))
        )?;
        writeln!(f, "- Activities: {}", joined(request.activities()))?;
        writeln!(
            f,
            "- Accommodation: {}",
            or_unspecified(request.accommodation().map(|a| a.to_string()))
        )?;
        writeln!(
            f,
            "- Total budget: {}",
            or_unspecified(request.budget_ceiling().map(|b| format!("${b:.2}")))
        )?;
        if let Some(city) = self.city {
            writeln!(
                f,
                "- About {}: {} (about ${:.0} per day)",
                city.name, city.description, city.estimated_cost.total_per_day
            )?;
        }
        f.write_str(
            "\nInclude one itinerary entry per day with timed activities (location, duration, \
             cost) and meals. Consider weather, local events and travel time between places. \
             budget_breakdown.total must equal accommodation + food + activities + \
             transportation, and should stay within the total budget. Add practical \
             recommendations (safety, packing, local customs).\n\n",
        )?;
        f.write_str(&output_contract::<TravelPlan>())
    }
}

/// `- name: description` lines for the tools an agent can call.
pub fn tool_overview(factory: &FunctionFactory) -> Option<String> {
    let lines: Vec<String> = factory
        .get_openai_tools()
        .iter()
        .filter_map(|tool| {
            let function = tool.get("function")?;
            let name = function.get("name")?.as_str()?;
            let description = function.get("description")?.as_str()?;
            Some(format!("- {}: {}", name, description))
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(format!("Available tools:\n{}", lines.join("\n")))
    }
}
