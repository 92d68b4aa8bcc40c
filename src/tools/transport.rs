use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{absorb, parse_params, to_tool_output, ProviderClient};
use super::{Tool, ToolFuture};
use crate::{config::ProviderConfig, Result};

const TRANSIT_RADIUS_METERS: u32 = 1000;

/// Raw flight and transit records, passed to the agent as the providers
/// return them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportRoutes {
    pub flights: Vec<Value>,
    pub transit_routes: Vec<Value>,
}

/// First three letters upper-cased. A stand-in for a real IATA lookup.
fn iata_guess(city: &str) -> String {
    city.trim().chars().take(3).collect::<String>().to_uppercase()
}

impl ProviderClient {
    /// Flights between the cities on `date` (today when absent) and transit
    /// routes around the destination.
    pub async fn get_transportation_routes(
        &self,
        origin: &str,
        destination: &str,
        date: Option<NaiveDate>,
    ) -> TransportRoutes {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        absorb(
            "get_transportation_routes",
            self.try_transportation_routes(origin, destination, date).await,
            TransportRoutes::default,
        )
    }

    async fn try_transportation_routes(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<TransportRoutes> {
        let dest_geo = self.geocode_city(destination).await;
        let config = self.config();

        let flights = self
            .get_json(
                &format!("{}/flights", config.aviation_stack_base_url),
                &[
                    ("access_key", ProviderConfig::key(&config.aviation_stack_api_key).to_string()),
                    ("dep_iata", iata_guess(origin)),
                    ("arr_iata", iata_guess(destination)),
                    ("flight_date", date.to_string()),
                ],
            )
            .await?;

        let transit = self
            .get_json(
                &format!("{}/routes", config.transitland_base_url),
                &[
                    ("api_key", ProviderConfig::key(&config.transitland_api_key).to_string()),
                    ("lat", dest_geo.lat.to_string()),
                    ("lon", dest_geo.lon.to_string()),
                    ("radius", TRANSIT_RADIUS_METERS.to_string()),
                ],
            )
            .await?;

        let list = |data: &Value, key: &str| {
            data.get(key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };

        Ok(TransportRoutes {
            flights: list(&flights, "data"),
            transit_routes: list(&transit, "routes"),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TransportParams {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Flight and local transit options between two cities
#[derive(Debug, Clone)]
pub struct TransportTool {
    provider: ProviderClient,
}

impl TransportTool {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

impl Tool for TransportTool {
    fn name(&self) -> &'static str {
        "get_transportation_routes"
    }

    fn description(&self) -> &'static str {
        "Find flights between two cities and public transit routes at the destination"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "origin": {"type": "string"},
                "destination": {"type": "string"},
                "date": {"type": "string", "description": "YYYY-MM-DD, defaults to today"}
            },
            "required": ["origin", "destination"]
        })
    }

    fn execute(&self, parameters: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: TransportParams = parse_params(self.name(), parameters)?;
            let routes = self
                .provider
                .get_transportation_routes(&params.origin, &params.destination, params.date)
                .await;
            to_tool_output(&routes)
        })
    }
}
