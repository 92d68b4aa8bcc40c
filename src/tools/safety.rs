use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{absorb, parse_params, to_tool_output, ProviderClient};
use super::{Tool, ToolFuture};
use crate::{config::ProviderConfig, Result};

const POI_RADIUS_METERS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyInfo {
    pub general_safety: String,
    pub health_concerns: String,
    pub crime_rate: String,
    pub natural_disasters: String,
}

impl SafetyInfo {
    pub fn fallback() -> Self {
        Self {
            general_safety: "Generally safe for tourists".to_string(),
            health_concerns: "No major health concerns".to_string(),
            crime_rate: "Low".to_string(),
            natural_disasters: "Low risk".to_string(),
        }
    }

    fn from_poi_kinds<'a>(kinds: impl IntoIterator<Item = &'a str>) -> Self {
        let flagged = kinds
            .into_iter()
            .any(|kind| kind.contains("danger") || kind.contains("safety"));
        Self {
            general_safety: if flagged {
                "Some safety concerns reported. Check local advisories."
            } else {
                "Generally safe for tourists"
            }
            .to_string(),
            health_concerns: "Check local health advisories".to_string(),
            crime_rate: "Check local crime statistics".to_string(),
            natural_disasters: "Check local disaster risk".to_string(),
        }
    }
}

impl ProviderClient {
    /// Safety summary derived from the kinds of nearby points of interest.
    pub async fn get_safety_information(&self, destination: &str) -> SafetyInfo {
        absorb(
            "get_safety_information",
            self.try_safety_information(destination).await,
            SafetyInfo::fallback,
        )
    }

    async fn try_safety_information(&self, destination: &str) -> Result<SafetyInfo> {
        let geo = self.geocode_city(destination).await;
        let config = self.config();
        let url = format!("{}/radius", config.opentripmap_base_url);
        let data = self
            .get_json(
                &url,
                &[
                    ("radius", POI_RADIUS_METERS.to_string()),
                    ("lon", geo.lon.to_string()),
                    ("lat", geo.lat.to_string()),
                    ("apikey", ProviderConfig::key(&config.opentripmap_api_key).to_string()),
                ],
            )
            .await?;

        let features = data
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let kinds = features
            .iter()
            .filter_map(|poi| poi.pointer("/properties/kinds").and_then(Value::as_str))
            .flat_map(|kinds| kinds.split(','));

        Ok(SafetyInfo::from_poi_kinds(kinds))
    }
}

#[derive(Debug, Deserialize)]
pub struct SafetyParams {
    pub destination: String,
}

/// Safety advisories for a destination
#[derive(Debug, Clone)]
pub struct SafetyTool {
    provider: ProviderClient,
}

impl SafetyTool {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

impl Tool for SafetyTool {
    fn name(&self) -> &'static str {
        "get_safety_information"
    }

    fn description(&self) -> &'static str {
        "Get general safety, health, crime and natural disaster information for a destination"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "destination": {"type": "string"}
            },
            "required": ["destination"]
        })
    }

    fn execute(&self, parameters: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: SafetyParams = parse_params(self.name(), parameters)?;
            to_tool_output(&self.provider.get_safety_information(&params.destination).await)
        })
    }
}
