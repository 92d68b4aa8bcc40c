use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{absorb, parse_params, to_tool_output, ProviderClient};
use super::{Tool, ToolFuture};
use crate::{config::ProviderConfig, Result};

/// Coordinates and ISO country code of a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    pub name: String,
}

impl GeoLocation {
    /// Null island with no country, keeping the requested name.
    pub fn fallback(name: &str) -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            country: String::new(),
            name: name.to_string(),
        }
    }
}

impl ProviderClient {
    /// Look a city up on OpenTripMap. Never fails.
    pub async fn geocode_city(&self, name: &str) -> GeoLocation {
        absorb("geocode_city", self.try_geocode_city(name).await, || {
            GeoLocation::fallback(name)
        })
    }

    async fn try_geocode_city(&self, name: &str) -> Result<GeoLocation> {
        let config = self.config();
        let url = format!("{}/geoname", config.opentripmap_base_url);
        let data = self
            .get_json(
                &url,
                &[
                    ("name", name.to_string()),
                    ("apikey", ProviderConfig::key(&config.opentripmap_api_key).to_string()),
                ],
            )
            .await?;

        // A miss comes back as 200 with only a status field.
        Ok(GeoLocation {
            lat: data.get("lat").and_then(Value::as_f64).unwrap_or(0.0),
            lon: data.get("lon").and_then(Value::as_f64).unwrap_or(0.0),
            country: data
                .get("country")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name: data
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    /// City name, e.g. "Lisbon"
    pub city: String,
}

/// Latitude, longitude and country for a city
#[derive(Debug, Clone)]
pub struct GeocodeTool {
    provider: ProviderClient,
}

impl GeocodeTool {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

impl Tool for GeocodeTool {
    fn name(&self) -> &'static str {
        "geocode_city"
    }

    fn description(&self) -> &'static str {
        "Get latitude, longitude and country code for a city"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name"}
            },
            "required": ["city"]
        })
    }

    fn execute(&self, parameters: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: GeocodeParams = parse_params(self.name(), parameters)?;
            to_tool_output(&self.provider.geocode_city(&params.city).await)
        })
    }
}
