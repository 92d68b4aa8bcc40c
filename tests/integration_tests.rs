use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use trip_planner_rs::{
    tools::{
        toolbox, CalculatorTool, LocalEvent, SafetyInfo, TransportRoutes, TravelBudget,
        WeatherForecast,
    },
    Agent, AgentInvoker, AgentResponse, FunctionFactory, PipelineState, Planner, PlannerError,
    PlanningStep, ProviderClient, ProviderConfig, Result, SessionState, Tool, TripFields,
};

fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
}

fn provider_for(server: &Server) -> ProviderClient {
    ProviderClient::new(ProviderConfig::default().with_base_url(server.url()))
}

async fn json_mock(server: &mut Server, path: &str, body: Value) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

fn city_list(names: &[&str]) -> String {
    let cities: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "country": "Portugal",
                "description": format!("{name} is a <b>coastal</b> city with great cuisine!"),
                "match_score": 0.8,
                "highlights": ["Old town"],
                "estimated_cost": {
                    "accommodation": 80,
                    "food": 40,
                    "activities": 30,
                    "total_per_day": 150
                }
            })
        })
        .collect();
    json!({ "recommended_cities": cities }).to_string()
}

fn travel_plan(total: f64) -> String {
    json!({
        "itinerary": [{
            "day": 1,
            "date": "2025-02-01",
            "activities": [{
                "time": "09:00",
                "activity": "Tram 28",
                "description": "Ride across the hills",
                "location": "Lisbon",
                "duration": "1 hour",
                "cost": 3
            }],
            "meals": []
        }],
        "budget_breakdown": {
            "accommodation": total / 2.0,
            "food": total / 4.0,
            "activities": total / 8.0,
            "transportation": total / 8.0,
            "total": total
        },
        "recommendations": ["Wear comfortable shoes"]
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Tools

#[tokio::test]
async fn test_calculator_tool() {
    let calculator = CalculatorTool::new();

    let result = calculator
        .execute(json!({ "expression": "(100 + 50) * 3" }))
        .await
        .unwrap();
    assert_eq!(result["result"], 450.0);

    let result = calculator.execute(json!({ "expression": "5 / 0" })).await;
    assert!(matches!(result, Err(PlannerError::ToolExecution(_))));
}

#[tokio::test]
async fn test_function_factory() {
    let mut factory = FunctionFactory::new();
    factory.register_tool(CalculatorTool::new());

    assert!(factory.has_function("calculator"));
    assert!(!factory.has_function("nonexistent"));

    let result = factory
        .execute_function("calculator", json!({ "expression": "4 × 5" }))
        .await
        .unwrap();
    assert_eq!(result["result"], 20.0);

    let err = factory
        .execute_function("nonexistent", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::ToolNotFound(_)));

    let tools = factory.get_openai_tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["function"]["name"], "calculator");
}

#[tokio::test]
async fn test_providers_fall_back_when_unreachable() {
    // No mocks registered: every request gets a 501.
    let server = Server::new_async().await;
    let provider = provider_for(&server);

    assert_eq!(
        provider.get_weather_forecast("Lisbon", None).await,
        WeatherForecast::fallback()
    );

    let events = provider
        .get_local_events("Lisbon", Some(date("2025-03-01")), None)
        .await;
    assert_eq!(events, vec![LocalEvent::fallback("Lisbon", date("2025-03-01"))]);

    let budget = provider.calculate_travel_budget("Lisbon", 7).await;
    assert_eq!(budget, TravelBudget::fallback(7));
    assert_eq!(budget.total, 700.0 + 350.0 + 525.0 + 200.0);
    assert_eq!(budget.currency, "USD");

    assert_eq!(
        provider.get_safety_information("Lisbon").await,
        SafetyInfo::fallback()
    );
    assert_eq!(
        provider
            .get_transportation_routes("Porto", "Lisbon", None)
            .await,
        TransportRoutes::default()
    );
    assert!(provider.search_internet("Lisbon festivals").await.is_empty());

    let geo = provider.geocode_city("Lisbon").await;
    assert_eq!((geo.lat, geo.lon, geo.country.as_str()), (0.0, 0.0, ""));
    assert_eq!(geo.name, "Lisbon");
}

#[tokio::test]
async fn test_weather_forecast_from_provider() {
    let mut server = Server::new_async().await;
    let _mock = json_mock(
        &mut server,
        "/weather/forecast.json",
        json!({
            "current": {
                "temp_c": 18.5,
                "condition": { "text": "Partly cloudy" },
                "humidity": 72,
                "wind_kph": 14.4
            }
        }),
    )
    .await;

    let forecast = provider_for(&server)
        .get_weather_forecast("Lisbon", Some(date("2025-03-01")))
        .await;
    assert_eq!(forecast.temperature, 18.5);
    assert_eq!(forecast.condition, "Partly cloudy");
    assert_eq!(forecast.humidity, 72.0);
    assert_eq!(forecast.wind_speed, 14.4);
}

#[tokio::test]
async fn test_weather_missing_fields_fall_back() {
    let mut server = Server::new_async().await;
    let _mock = json_mock(&mut server, "/weather/forecast.json", json!({ "error": "quota" })).await;

    let forecast = provider_for(&server).get_weather_forecast("Lisbon", None).await;
    assert_eq!(forecast, WeatherForecast::fallback());
}

#[tokio::test]
async fn test_budget_converts_to_local_currency() {
    let mut server = Server::new_async().await;
    let _geo = json_mock(
        &mut server,
        "/places/geoname",
        json!({ "name": "Lisbon", "country": "PT", "lat": 38.72, "lon": -9.14 }),
    )
    .await;
    let _country = json_mock(
        &mut server,
        "/countries/alpha/PT",
        json!([{ "currencies": { "EUR": { "name": "Euro", "symbol": "€" } } }]),
    )
    .await;
    let _rates = json_mock(
        &mut server,
        "/rates/test-key/latest/USD",
        json!({ "result": "success", "conversion_rates": { "USD": 1.0, "EUR": 0.5 } }),
    )
    .await;

    let mut config = ProviderConfig::default().with_base_url(server.url());
    config.currency_api_key = Some("test-key".to_string());
    let budget = ProviderClient::new(config)
        .calculate_travel_budget("Lisbon", 3)
        .await;

    assert_eq!(budget.currency, "EUR");
    assert_eq!(budget.accommodation, 150.0);
    assert_eq!(budget.food, 75.0);
    assert_eq!(budget.activities, 112.5);
    assert_eq!(budget.transportation, 100.0);
    assert_eq!(budget.total, 437.5);
}

#[tokio::test]
async fn test_events_are_capped_and_never_empty() {
    let mut server = Server::new_async().await;
    let _geo = json_mock(
        &mut server,
        "/places/geoname",
        json!({ "name": "Lisbon", "country": "PT", "lat": 38.72, "lon": -9.14 }),
    )
    .await;
    let events: Vec<Value> = (1..=7)
        .map(|n| {
            json!({
                "name": { "text": format!("Concert {n}") },
                "start": { "local": "2025-03-02T20:00:00" },
                "url": format!("https://events.example/{n}"),
                "venue": { "name": "Coliseu" }
            })
        })
        .collect();
    let _search = json_mock(&mut server, "/events/events/search/", json!({ "events": events })).await;

    let found = provider_for(&server)
        .get_local_events("Lisbon", Some(date("2025-03-01")), Some(date("2025-03-05")))
        .await;
    assert_eq!(found.len(), 5);
    assert_eq!(found[0].name, "Concert 1");
    assert_eq!(found[0].venue.as_deref(), Some("Coliseu"));

    // Geocoding falls back here too; an empty listing is still a success.
    let mut quiet = Server::new_async().await;
    let _empty = json_mock(&mut quiet, "/events/events/search/", json!({ "events": [] })).await;
    let found = provider_for(&quiet)
        .get_local_events("Lisbon", Some(date("2025-03-01")), None)
        .await;
    assert_eq!(found, vec![LocalEvent::none_found("Lisbon", date("2025-03-01"))]);
}

#[tokio::test]
async fn test_search_returns_titles() {
    let mut server = Server::new_async().await;
    let _mock = json_mock(
        &mut server,
        "/search/",
        json!({
            "data": [
                { "title": "Lisbon travel guide", "url": "https://a.example" },
                { "title": "Best pastéis de nata", "url": "https://b.example" }
            ]
        }),
    )
    .await;

    let titles = provider_for(&server).search_internet("Lisbon").await;
    assert_eq!(titles, vec!["Lisbon travel guide", "Best pastéis de nata"]);
}

#[tokio::test]
async fn test_provider_tools_through_toolbox() {
    let server = Server::new_async().await;
    let factory = toolbox(&["get_weather_forecast", "calculate_travel_budget"], &provider_for(&server));

    let weather = factory
        .execute_function("get_weather_forecast", json!({ "destination": "Lisbon" }))
        .await
        .unwrap();
    assert_eq!(weather["condition"], "Sunny");

    let budget = factory
        .execute_function(
            "calculate_travel_budget",
            json!({ "destination": "Lisbon", "duration": 2 }),
        )
        .await
        .unwrap();
    assert_eq!(budget["total"], 200.0 + 100.0 + 150.0 + 200.0);

    // Bad parameters are a tool error, not a fallback.
    let err = factory
        .execute_function("calculate_travel_budget", json!({ "destination": "Lisbon" }))
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::ToolExecution(_)));
}

// ---------------------------------------------------------------------------
// Planner pipeline with a scripted agent

#[derive(Default)]
struct ScriptedInvoker {
    replies: Mutex<VecDeque<Result<AgentResponse>>>,
    prompts: Mutex<Vec<(trip_planner_rs::AgentRole, String)>>,
}

impl ScriptedInvoker {
    fn replying(replies: Vec<Result<AgentResponse>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::default(),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn last_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .map(|(_, prompt)| prompt.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AgentInvoker for ScriptedInvoker {
    async fn invoke(&self, role: trip_planner_rs::AgentRole, prompt: &str) -> Result<AgentResponse> {
        self.prompts.lock().unwrap().push((role, prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PlannerError::Unknown("no scripted reply".to_string())))
    }
}

fn planner(replies: Vec<Result<AgentResponse>>) -> Planner<ScriptedInvoker> {
    Planner::new(ScriptedInvoker::replying(replies)).with_today(date("2025-01-01"))
}

fn selection_fields() -> TripFields {
    TripFields {
        preferences: Some(vec!["Beach".into(), "Food".into()]),
        budget: Some(200.0),
        duration: Some(3),
        season: Some("Spring".into()),
        ..TripFields::default()
    }
}

fn planning_fields(destination: &str) -> TripFields {
    TripFields {
        destination: Some(destination.to_string()),
        start_date: Some("2025-02-01".into()),
        end_date: Some("2025-02-03".into()),
        activities: Some(vec!["Sightseeing".into(), "Local Food".into()]),
        accommodation: Some("Mid-range".into()),
        ..selection_fields()
    }
}

#[tokio::test]
async fn test_city_selection_stores_valid_result() {
    let planner = planner(vec![Ok(AgentResponse::text(city_list(&["Lisbon", "Porto"])))]);

    let (session, report) = planner
        .select_cities(SessionState::new(), &selection_fields())
        .await;

    assert_eq!(
        report.trace,
        vec![
            PipelineState::Idle,
            PipelineState::Requested,
            PipelineState::AgentInvoked,
            PipelineState::ParseAttempted,
            PipelineState::Valid
        ]
    );
    assert!(report.error.is_none());
    assert_eq!(session.current_step, PlanningStep::TravelPlanning);

    let cities = session.selected_cities.unwrap();
    assert_eq!(cities.names(), vec!["Lisbon", "Porto"]);
    assert_eq!(
        cities.recommended_cities[0].description,
        "Lisbon is a coastal city with great cuisine"
    );

    let prompt = planner.invoker().last_prompt();
    assert!(prompt.contains("Beach"));
    assert!(prompt.contains("recommended_cities"));
}

#[tokio::test]
async fn test_rejected_input_never_reaches_the_agent() {
    let planner = planner(vec![]);
    let fields = TripFields {
        budget: Some(49.99),
        ..selection_fields()
    };

    let (session, report) = planner.select_cities(SessionState::new(), &fields).await;

    assert_eq!(
        report.trace,
        vec![
            PipelineState::Idle,
            PipelineState::Requested,
            PipelineState::InvalidReported
        ]
    );
    assert!(matches!(report.error, Some(PlannerError::InputRejected(_))));
    assert_eq!(planner.invoker().calls(), 0);
    assert_eq!(session, SessionState::new());
}

#[tokio::test]
async fn test_malformed_city_list_is_degraded_not_fatal() {
    let planner = planner(vec![Ok(AgentResponse::text("{itinerary: ["))]);

    let (session, report) = planner
        .select_cities(SessionState::new(), &selection_fields())
        .await;

    assert_eq!(report.final_state(), PipelineState::FallbackSubstituted);
    assert!(report.is_usable());
    assert!(report.is_degraded());
    assert_eq!(report.error.as_ref().map(PlannerError::error_code), Some("PARSE_ERROR"));
    assert_eq!(
        session.selected_cities.unwrap().names(),
        vec!["Barcelona"]
    );
}

#[tokio::test]
async fn test_agent_failure_is_reported_after_invocation() {
    let planner = planner(vec![Err(PlannerError::Timeout("slow".to_string()))]);

    let (session, report) = planner
        .select_cities(SessionState::new(), &selection_fields())
        .await;

    assert_eq!(
        report.trace,
        vec![
            PipelineState::Idle,
            PipelineState::Requested,
            PipelineState::AgentInvoked,
            PipelineState::InvalidReported
        ]
    );
    assert!(matches!(report.error, Some(PlannerError::Timeout(_))));
    assert!(session.selected_cities.is_none());
}

#[tokio::test]
async fn test_planning_requires_selected_cities() {
    let planner = planner(vec![]);

    let (_, report) = planner
        .plan_trip(SessionState::new(), &planning_fields("Lisbon"))
        .await;

    assert!(matches!(report.error, Some(PlannerError::Session(_))));
    assert_eq!(report.final_state(), PipelineState::InvalidReported);
    assert_eq!(planner.invoker().calls(), 0);
}

#[tokio::test]
async fn test_two_step_flow() {
    let planner = planner(vec![
        Ok(AgentResponse::text(city_list(&["Lisbon", "Porto"]))),
        Ok(AgentResponse::Output {
            raw: travel_plan(560.0),
            iterations: 3,
        }),
    ]);

    let (session, _) = planner
        .select_cities(SessionState::new(), &selection_fields())
        .await;

    // Not among the recommendations: rejected without an agent call.
    let (session, report) = planner.plan_trip(session, &planning_fields("Madrid")).await;
    assert!(matches!(report.error, Some(PlannerError::Session(ref msg)) if msg.contains("Lisbon, Porto")));
    assert_eq!(planner.invoker().calls(), 1);

    let (session, report) = planner.plan_trip(session, &planning_fields("lisbon")).await;
    assert_eq!(report.final_state(), PipelineState::Valid, "{}", report.replay());
    assert!(planner.invoker().last_prompt().contains("Lisbon"));

    let plan = session.travel_plan.as_ref().unwrap();
    assert_eq!(plan.budget_breakdown.total, 560.0);
    assert!(session.has_plan());

    let session = session.restart();
    assert_eq!(session.current_step, PlanningStep::CitySelection);
    assert!(session.selected_cities.is_none());
}

#[tokio::test]
async fn test_plan_over_budget_is_rejected() {
    // 200/day over three days gives a 600 ceiling, 660 with slack.
    let planner = planner(vec![
        Ok(AgentResponse::text(city_list(&["Lisbon"]))),
        Ok(AgentResponse::text(travel_plan(700.0))),
    ]);

    let (session, _) = planner
        .select_cities(SessionState::new(), &selection_fields())
        .await;
    let (session, report) = planner.plan_trip(session, &planning_fields("Lisbon")).await;

    assert_eq!(report.final_state(), PipelineState::InvalidReported);
    assert_eq!(
        report.error.as_ref().map(PlannerError::error_code),
        Some("BUSINESS_RULE_VIOLATION")
    );
    assert!(session.travel_plan.is_none());
    assert!(session.selected_cities.is_some());
}

// ---------------------------------------------------------------------------
// Agent against a mock chat-completions endpoint

fn completion(message: Value) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }]
    })
    .to_string()
}

#[tokio::test]
async fn test_agent_returns_raw_output() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(json!({
            "role": "assistant",
            "content": city_list(&["Lisbon"])
        })))
        .create_async()
        .await;

    let agent = Agent::new("test-key".to_string(), provider_for(&server)).with_base_url(server.url());
    let response = agent
        .invoke(trip_planner_rs::AgentRole::CitySelectionExpert, "Pick cities")
        .await
        .unwrap();

    match response {
        AgentResponse::Output { raw, iterations } => {
            assert_eq!(iterations, 1);
            assert!(raw.contains("Lisbon"));
        }
        other => panic!("unexpected response {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_agent_stops_after_max_iterations() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": { "name": "calculator", "arguments": "{\"expression\": \"1 + 1\"}" }
            }]
        })))
        .expect(2)
        .create_async()
        .await;

    let mut tools = FunctionFactory::new();
    tools.register_tool(CalculatorTool::new());
    let agent = Agent::new("test-key".to_string(), provider_for(&server))
        .with_base_url(server.url())
        .with_max_iterations(2);

    let err = agent
        .run_with_tools(trip_planner_rs::AgentRole::BudgetPlanningExpert, "Add it up", &tools)
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::MaxIterations(2)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_planner_with_agent_end_to_end() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(json!({ "role": "assistant", "content": "Sorry, no JSON today" })))
        .create_async()
        .await;

    let agent = Agent::new("test-key".to_string(), provider_for(&server)).with_base_url(server.url());
    let planner = Planner::new(agent).with_today(date("2025-01-01"));

    let (session, report) = planner
        .select_cities(SessionState::new(), &selection_fields())
        .await;
    assert_eq!(report.final_state(), PipelineState::FallbackSubstituted);
    assert_eq!(session.current_step, PlanningStep::TravelPlanning);
}
