//! Shared HTTP plumbing for the data-provider tools.
//!
//! Provider calls never fail from the caller's point of view: each public
//! lookup runs a fallible `try_*` body and hands any error to [`absorb`],
//! which logs it and returns the tool's documented fallback.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::{config::ProviderConfig, PlannerError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client plus provider keys and endpoints. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    config: Arc<ProviderConfig>,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            config: Arc::new(config),
        }
    }

    /// Keys from the environment, public endpoints.
    pub fn from_env() -> Self {
        Self::new(ProviderConfig::from_env())
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// GET `url` with `query` and decode the body as JSON. Non-2xx statuses
    /// are errors.
    pub(crate) async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| PlannerError::Http(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlannerError::Http(format!("{url} returned status {status}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| PlannerError::Http(format!("invalid JSON from {url}: {err}")))
    }
}

/// Value at a JSON pointer, or an error naming the missing path.
pub(crate) fn required<'a>(data: &'a Value, pointer: &str) -> Result<&'a Value> {
    data.pointer(pointer)
        .ok_or_else(|| PlannerError::Http(format!("provider response has no `{pointer}`")))
}

pub(crate) fn required_f64(data: &Value, pointer: &str) -> Result<f64> {
    required(data, pointer)?
        .as_f64()
        .ok_or_else(|| PlannerError::Http(format!("`{pointer}` is not a number")))
}

pub(crate) fn required_str<'a>(data: &'a Value, pointer: &str) -> Result<&'a str> {
    required(data, pointer)?
        .as_str()
        .ok_or_else(|| PlannerError::Http(format!("`{pointer}` is not a string")))
}

/// Keep a successful lookup or log the failure and use the fallback.
pub(crate) fn absorb<T>(tool: &'static str, outcome: Result<T>, fallback: impl FnOnce() -> T) -> T {
    match outcome {
        Ok(value) => value,
        Err(error) => {
            warn!(
                target: "trip_planner::tools",
                tool,
                %error,
                "provider lookup failed, using fallback"
            );
            fallback()
        }
    }
}

/// Deserialize tool arguments, naming the tool on failure.
pub(crate) fn parse_params<T: serde::de::DeserializeOwned>(tool: &str, parameters: Value) -> Result<T> {
    serde_json::from_value(parameters)
        .map_err(|e| PlannerError::ToolExecution(format!("Invalid parameters for {tool}: {e}")))
}

pub(crate) fn to_tool_output<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| PlannerError::ToolExecution(format!("Failed to serialize result: {e}")))
}
