use crate::{
    error::{PlannerError, Result},
    services::{
        openai_client::{ChatCompletionRequest, OpenAIClient},
        prompts::tool_overview,
        tool_call_utils::{decode_tool_call, extract_tool_call_id},
    },
    tools::{toolbox, FunctionFactory, ProviderClient},
    types::AgentResponse,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::{fmt, time::Duration};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The experts a planning step can consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    CitySelectionExpert,
    TravelPlanningExpert,
    LocalTourGuide,
    TransportationSpecialist,
    AccommodationExpert,
    FoodDiningGuide,
    BudgetPlanningExpert,
}

impl AgentRole {
    pub const ALL: [AgentRole; 7] = [
        AgentRole::CitySelectionExpert,
        AgentRole::TravelPlanningExpert,
        AgentRole::LocalTourGuide,
        AgentRole::TransportationSpecialist,
        AgentRole::AccommodationExpert,
        AgentRole::FoodDiningGuide,
        AgentRole::BudgetPlanningExpert,
    ];

    pub fn role(&self) -> &'static str {
        match self {
            AgentRole::CitySelectionExpert => "City Selection Expert",
            AgentRole::TravelPlanningExpert => "Travel Planning Expert",
            AgentRole::LocalTourGuide => "Local Tour Guide",
            AgentRole::TransportationSpecialist => "Transportation Specialist",
            AgentRole::AccommodationExpert => "Accommodation Expert",
            AgentRole::FoodDiningGuide => "Food & Dining Guide",
            AgentRole::BudgetPlanningExpert => "Budget Planning Expert",
        }
    }

    pub fn goal(&self) -> &'static str {
        match self {
            AgentRole::CitySelectionExpert => {
                "Recommend the best cities based on the traveller's preferences and constraints"
            }
            AgentRole::TravelPlanningExpert => "Create detailed travel plans and itineraries",
            AgentRole::LocalTourGuide => {
                "Plan a day in the city with food, cultural experiences and shopping spots"
            }
            AgentRole::TransportationSpecialist => {
                "Plan efficient routes, travel methods and transit options with realistic travel times"
            }
            AgentRole::AccommodationExpert => {
                "Recommend places to stay, good neighbourhoods and booking tips"
            }
            AgentRole::FoodDiningGuide => {
                "Recommend restaurants and local specialties, respecting dietary needs"
            }
            AgentRole::BudgetPlanningExpert => "Create and manage travel budgets",
        }
    }

    pub fn backstory(&self) -> &'static str {
        match self {
            AgentRole::CitySelectionExpert => {
                "You are a travel advisor with wide knowledge of cities worldwide. You match \
                 travellers with destinations that suit their preferences, budget and travel style, \
                 and you score each candidate with the calculate_match_score tool."
            }
            AgentRole::TravelPlanningExpert => {
                "You are a seasoned travel planner. You balance activities, keep to budgets and \
                 make sure travellers have memorable trips."
            }
            AgentRole::LocalTourGuide => {
                "You are a local guide who knows the hidden gems and must-see spots of the city."
            }
            AgentRole::TransportationSpecialist => {
                "You know travel methods, routes and transit systems worldwide and find the most \
                 efficient way between places."
            }
            AgentRole::AccommodationExpert => {
                "You have years of hospitality experience and know lodging options, \
                 neighbourhoods and booking strategies."
            }
            AgentRole::FoodDiningGuide => {
                "You are a culinary expert who builds memorable food experiences around local \
                 cuisine."
            }
            AgentRole::BudgetPlanningExpert => {
                "You are a financial expert in travel budgets who helps travellers get the most \
                 from their money."
            }
        }
    }

    /// Names of the tools this expert may call.
    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            AgentRole::CitySelectionExpert => &[
                "search_internet",
                "calculate_travel_budget",
                "get_safety_information",
                "calculate_match_score",
            ],
            AgentRole::TravelPlanningExpert => &[
                "search_internet",
                "get_weather_forecast",
                "get_local_events",
                "calculate_travel_budget",
            ],
            AgentRole::LocalTourGuide => &["search_internet", "get_local_events"],
            AgentRole::TransportationSpecialist => &[
                "search_internet",
                "calculator",
                "get_transportation_routes",
                "calculate_travel_budget",
            ],
            AgentRole::AccommodationExpert => &[
                "search_internet",
                "calculate_travel_budget",
                "get_safety_information",
            ],
            AgentRole::FoodDiningGuide => &[
                "search_internet",
                "get_local_events",
                "calculate_travel_budget",
            ],
            AgentRole::BudgetPlanningExpert => &["calculate_travel_budget", "calculator"],
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}. {}\nYour goal: {}.\nNever delegate work. Reply with JSON only.",
            self.role(),
            self.backstory(),
            self.goal()
        )
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role())
    }
}

/// Anything that can answer a prompt in the voice of an [`AgentRole`].
///
/// The planner depends on this seam only, so tests can script responses.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, role: AgentRole, prompt: &str) -> Result<AgentResponse>;
}

/// LLM-backed agent talking to an OpenAI-compatible chat-completions API.
#[derive(Debug)]
pub struct Agent {
    openai_client: OpenAIClient,
    provider: ProviderClient,
    model: String,
    max_iterations: usize,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl Agent {
    pub fn new(api_key: String, provider: ProviderClient) -> Self {
        Self {
            openai_client: OpenAIClient::new(api_key),
            provider,
            model: "openai/gpt-4.1-mini".to_string(),
            max_iterations: 10,
            max_tokens: Some(4000),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_client.set_base_url(base_url);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &ProviderClient {
        &self.provider
    }

    /// Build from `OPENAI_API_KEY`, optional `OPENAI_BASE_URL` /
    /// `OPENROUTER_BASE_URL` and `OPENAI_MODEL`, with provider keys from the
    /// environment too.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            PlannerError::Config(
                "OPENAI_API_KEY environment variable must be set before creating an Agent"
                    .to_string(),
            )
        })?;
        let mut agent = Self::new(api_key, ProviderClient::from_env());
        if let Ok(base_url) =
            std::env::var("OPENAI_BASE_URL").or_else(|_| std::env::var("OPENROUTER_BASE_URL"))
        {
            agent.openai_client.set_base_url(base_url);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            agent.model = model;
        }
        Ok(agent)
    }

    /// Run one conversation for `role` with an explicit tool set.
    ///
    /// Tool calls are executed and their results fed back until the model
    /// answers without calling a tool, or `max_iterations` turns pass.
    pub async fn run_with_tools(
        &self,
        role: AgentRole,
        prompt: &str,
        tools: &FunctionFactory,
    ) -> Result<AgentResponse> {
        let mut system = role.system_prompt();
        if let Some(overview) = tool_overview(tools) {
            system.push_str("\n\n");
            system.push_str(&overview);
        }

        let mut messages = vec![
            json!({"role": "system", "content": system}),
            json!({"role": "user", "content": prompt}),
        ];
        let tool_definitions = tools.get_openai_tools();

        for iteration in 1..=self.max_iterations {
            let mut request = ChatCompletionRequest::new(self.model.clone(), messages.clone())
                .with_max_tokens(self.max_tokens)
                .with_json_output();
            if !tool_definitions.is_empty() {
                request = request
                    .with_tools(tool_definitions.clone())
                    .with_tool_choice(json!("auto"));
            }

            let body = request.into_value();
            let response = timeout(
                self.timeout,
                self.openai_client.chat_completion(&body, self.timeout),
            )
            .await
            .map_err(|_| PlannerError::Timeout("chat completion timed out".to_string()))??;

            let message = assistant_message(&response)?;
            let tool_calls = message
                .get("tool_calls")
                .and_then(Value::as_array)
                .filter(|calls| !calls.is_empty());

            let Some(tool_calls) = tool_calls else {
                let raw = message
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                info!(
                    target: "trip_planner::agent",
                    role = role.role(),
                    iterations = iteration,
                    "agent answered"
                );
                return Ok(AgentResponse::Output {
                    raw,
                    iterations: iteration,
                });
            };

            let observations = self.run_tool_calls(tools, tool_calls).await;
            messages.push(message.clone());
            messages.extend(observations);
        }

        warn!(
            target: "trip_planner::agent",
            role = role.role(),
            max_iterations = self.max_iterations,
            "agent did not answer within the iteration budget"
        );
        Err(PlannerError::MaxIterations(self.max_iterations))
    }

    /// Execute each requested call; failures are reported back to the model
    /// as error payloads instead of aborting the conversation.
    async fn run_tool_calls(&self, tools: &FunctionFactory, tool_calls: &[Value]) -> Vec<Value> {
        let mut observations = Vec::with_capacity(tool_calls.len());
        for tool_call in tool_calls {
            let tool_call_id = extract_tool_call_id(tool_call).to_string();

            let outcome = match decode_tool_call(tool_call) {
                Ok(call) => {
                    debug!(target: "trip_planner::agent", tool = %call.name, "tool call");
                    tools.execute_function(&call.name, call.arguments).await
                }
                Err(err) => Err(err),
            };

            let content = match outcome {
                Ok(value) => value.to_string(),
                Err(err) => {
                    warn!(target: "trip_planner::agent", error = %err, "tool call failed");
                    err.to_error_payload().to_string()
                }
            };

            observations.push(json!({
                "role": "tool",
                "tool_call_id": tool_call_id,
                "content": content
            }));
        }
        observations
    }
}

fn assistant_message(response: &Value) -> Result<&Value> {
    response
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            PlannerError::Unknown("Missing 'choices' array in completion response".to_string())
        })?
        .first()
        .ok_or_else(|| PlannerError::Unknown("Completion response contained no choices".to_string()))?
        .get("message")
        .ok_or_else(|| {
            PlannerError::Unknown("Completion response missing assistant message".to_string())
        })
}

#[async_trait]
impl AgentInvoker for Agent {
    async fn invoke(&self, role: AgentRole, prompt: &str) -> Result<AgentResponse> {
        let tools = toolbox(role.tool_names(), &self.provider);
        self.run_with_tools(role, prompt, &tools).await
    }
}
