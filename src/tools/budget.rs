use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::provider::{absorb, parse_params, required, to_tool_output, ProviderClient};
use super::{Tool, ToolFuture};
use crate::{config::ProviderConfig, Result};

pub const ACCOMMODATION_PER_DAY_USD: f64 = 100.0;
pub const FOOD_PER_DAY_USD: f64 = 50.0;
pub const ACTIVITIES_PER_DAY_USD: f64 = 75.0;
pub const TRANSPORTATION_USD: f64 = 200.0;

/// Estimated trip cost in the destination's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelBudget {
    pub accommodation: f64,
    pub food: f64,
    pub activities: f64,
    pub transportation: f64,
    pub total: f64,
    pub currency: String,
}

impl TravelBudget {
    /// Base costs for `duration` days at `rate` units of `currency` per USD.
    pub fn estimate(duration: u32, rate: f64, currency: &str) -> Self {
        let days = f64::from(duration);
        let accommodation = round_cents(ACCOMMODATION_PER_DAY_USD * days * rate);
        let food = round_cents(FOOD_PER_DAY_USD * days * rate);
        let activities = round_cents(ACTIVITIES_PER_DAY_USD * days * rate);
        let transportation = round_cents(TRANSPORTATION_USD * rate);
        Self {
            accommodation,
            food,
            activities,
            transportation,
            total: round_cents(accommodation + food + activities + transportation),
            currency: currency.to_string(),
        }
    }

    pub fn fallback(duration: u32) -> Self {
        Self::estimate(duration, 1.0, "USD")
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

impl ProviderClient {
    /// Budget for `duration` days in `destination`, converted to local
    /// currency when the rate can be found.
    pub async fn calculate_travel_budget(&self, destination: &str, duration: u32) -> TravelBudget {
        absorb(
            "calculate_travel_budget",
            self.try_travel_budget(destination, duration).await,
            || TravelBudget::fallback(duration),
        )
    }

    async fn try_travel_budget(&self, destination: &str, duration: u32) -> Result<TravelBudget> {
        let geo = self.geocode_city(destination).await;
        let currency = self.currency_for_country(&geo.country).await;

        let config = self.config();
        let url = format!(
            "{}/{}/latest/USD",
            config.exchange_rate_base_url,
            ProviderConfig::key(&config.currency_api_key)
        );
        let data = self.get_json(&url, &[]).await?;
        let rate = required(&data, "/conversion_rates")?
            .get(&currency)
            .and_then(Value::as_f64)
            .unwrap_or(1.0);

        Ok(TravelBudget::estimate(duration, rate, &currency))
    }

    /// ISO currency code for a country code; USD when unknown.
    async fn currency_for_country(&self, country: &str) -> String {
        if country.is_empty() {
            return "USD".to_string();
        }

        let url = format!("{}/alpha/{}", self.config().rest_countries_base_url, country);
        match self.get_json(&url, &[]).await {
            Ok(data) => data
                .pointer("/0/currencies")
                .and_then(Value::as_object)
                .and_then(|currencies| currencies.keys().next().cloned())
                .unwrap_or_else(|| "USD".to_string()),
            Err(error) => {
                debug!(target: "trip_planner::tools", %error, country, "currency lookup failed");
                "USD".to_string()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BudgetParams {
    pub destination: String,
    /// Trip length in days
    pub duration: u32,
}

/// Travel budget estimate with currency conversion
#[derive(Debug, Clone)]
pub struct BudgetTool {
    provider: ProviderClient,
}

impl BudgetTool {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

impl Tool for BudgetTool {
    fn name(&self) -> &'static str {
        "calculate_travel_budget"
    }

    fn description(&self) -> &'static str {
        "Estimate accommodation, food, activities and transportation costs for a trip in local currency"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "destination": {"type": "string"},
                "duration": {"type": "integer", "minimum": 1, "description": "Trip length in days"}
            },
            "required": ["destination", "duration"]
        })
    }

    fn execute(&self, parameters: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: BudgetParams = parse_params(self.name(), parameters)?;
            let budget = self
                .provider
                .calculate_travel_budget(&params.destination, params.duration)
                .await;
            to_tool_output(&budget)
        })
    }
}
