use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{
    absorb, parse_params, required_f64, required_str, to_tool_output, ProviderClient,
};
use super::{Tool, ToolFuture};
use crate::{config::ProviderConfig, Result};

/// Weather information returned to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    /// Degrees Celsius
    pub temperature: f64,
    pub condition: String,
    /// Relative humidity in percent
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
}

impl WeatherForecast {
    pub fn fallback() -> Self {
        Self {
            temperature: 25.0,
            condition: "Sunny".to_string(),
            humidity: 60.0,
            wind_speed: 10.0,
        }
    }
}

impl ProviderClient {
    /// Forecast for `destination` on `date` (today when absent).
    pub async fn get_weather_forecast(
        &self,
        destination: &str,
        date: Option<NaiveDate>,
    ) -> WeatherForecast {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        absorb(
            "get_weather_forecast",
            self.try_weather_forecast(destination, date).await,
            WeatherForecast::fallback,
        )
    }

    async fn try_weather_forecast(
        &self,
        destination: &str,
        date: NaiveDate,
    ) -> Result<WeatherForecast> {
        let config = self.config();
        let url = format!("{}/forecast.json", config.weather_base_url);
        let data = self
            .get_json(
                &url,
                &[
                    ("key", ProviderConfig::key(&config.weather_api_key).to_string()),
                    ("q", destination.to_string()),
                    ("dt", date.format("%Y-%m-%d").to_string()),
                    ("aqi", "no".to_string()),
                ],
            )
            .await?;

        Ok(WeatherForecast {
            temperature: required_f64(&data, "/current/temp_c")?,
            condition: required_str(&data, "/current/condition/text")?.to_string(),
            humidity: required_f64(&data, "/current/humidity")?,
            wind_speed: required_f64(&data, "/current/wind_kph")?,
        })
    }
}

/// Parameters for weather queries
#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub destination: String,
    /// ISO date (YYYY-MM-DD); defaults to today
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Weather forecast for a destination
#[derive(Debug, Clone)]
pub struct WeatherTool {
    provider: ProviderClient,
}

impl WeatherTool {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "get_weather_forecast"
    }

    fn description(&self) -> &'static str {
        "Get the weather forecast (temperature, condition, humidity, wind) for a destination and date"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "destination": {"type": "string"},
                "date": {"type": "string", "description": "YYYY-MM-DD, defaults to today"}
            },
            "required": ["destination"]
        })
    }

    fn execute(&self, parameters: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: WeatherParams = parse_params(self.name(), parameters)?;
            let forecast = self
                .provider
                .get_weather_forecast(&params.destination, params.date)
                .await;
            to_tool_output(&forecast)
        })
    }
}
