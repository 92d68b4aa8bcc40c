//! Provider credentials and planner policy.
//!
//! Keys come from the environment (the binary loads `.env` first). Base URLs
//! default to the public endpoints and can be overridden, which is how tests
//! point every provider at a local mock server.

use std::env;

pub const OPENTRIPMAP_BASE_URL: &str = "https://api.opentripmap.com/0.1/en/places";
pub const WEATHER_BASE_URL: &str = "http://api.weatherapi.com/v1";
pub const EXCHANGE_RATE_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";
pub const REST_COUNTRIES_BASE_URL: &str = "https://restcountries.com/v3.1";
pub const EVENTBRITE_BASE_URL: &str = "https://www.eventbriteapi.com/v3";
pub const AVIATION_STACK_BASE_URL: &str = "http://api.aviationstack.com/v1";
pub const TRANSITLAND_BASE_URL: &str = "https://transit.land/api/v2";
pub const JINA_SEARCH_BASE_URL: &str = "https://s.jina.ai";

/// API keys and endpoints for the third-party data providers.
///
/// A missing key is not an error: the call is still attempted and the
/// provider's rejection is absorbed by the tool's fallback.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub opentripmap_api_key: Option<String>,
    pub weather_api_key: Option<String>,
    pub currency_api_key: Option<String>,
    pub eventbrite_api_key: Option<String>,
    pub aviation_stack_api_key: Option<String>,
    pub transitland_api_key: Option<String>,
    pub jina_api_key: Option<String>,
    pub opentripmap_base_url: String,
    pub weather_base_url: String,
    pub exchange_rate_base_url: String,
    pub rest_countries_base_url: String,
    pub eventbrite_base_url: String,
    pub aviation_stack_base_url: String,
    pub transitland_base_url: String,
    pub jina_search_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            opentripmap_api_key: None,
            weather_api_key: None,
            currency_api_key: None,
            eventbrite_api_key: None,
            aviation_stack_api_key: None,
            transitland_api_key: None,
            jina_api_key: None,
            opentripmap_base_url: OPENTRIPMAP_BASE_URL.to_string(),
            weather_base_url: WEATHER_BASE_URL.to_string(),
            exchange_rate_base_url: EXCHANGE_RATE_BASE_URL.to_string(),
            rest_countries_base_url: REST_COUNTRIES_BASE_URL.to_string(),
            eventbrite_base_url: EVENTBRITE_BASE_URL.to_string(),
            aviation_stack_base_url: AVIATION_STACK_BASE_URL.to_string(),
            transitland_base_url: TRANSITLAND_BASE_URL.to_string(),
            jina_search_base_url: JINA_SEARCH_BASE_URL.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Read every provider key from the environment.
    pub fn from_env() -> Self {
        Self {
            opentripmap_api_key: env::var("OPENTRIPMAP_API_KEY").ok(),
            weather_api_key: env::var("WEATHER_API_KEY").ok(),
            currency_api_key: env::var("CURRENCY_API_KEY").ok(),
            eventbrite_api_key: env::var("EVENTBRITE_API_KEY").ok(),
            aviation_stack_api_key: env::var("AVIATION_STACK_API_KEY").ok(),
            transitland_api_key: env::var("TRANSITLAND_API_KEY").ok(),
            jina_api_key: env::var("JINA_API_KEY").ok(),
            ..Self::default()
        }
    }

    /// Point every provider at one base URL (a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base = base_url.trim_end_matches('/');
        self.opentripmap_base_url = format!("{base}/places");
        self.weather_base_url = format!("{base}/weather");
        self.exchange_rate_base_url = format!("{base}/rates");
        self.rest_countries_base_url = format!("{base}/countries");
        self.eventbrite_base_url = format!("{base}/events");
        self.aviation_stack_base_url = format!("{base}/flights");
        self.transitland_base_url = format!("{base}/transit");
        self.jina_search_base_url = format!("{base}/search");
        self
    }

    pub(crate) fn key(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or_default()
    }
}

/// When the output validator may substitute the fixed city-list fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Only when the agent's text is not JSON at all.
    #[default]
    OnParseFailure,
    /// For any city-list failure (parse, shape, rules, content).
    OnAnyFailure,
    /// Always surface the error.
    Never,
}

/// Pipeline-level settings.
#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub fallback_policy: FallbackPolicy,
}

impl PlannerConfig {
    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_override_routes_every_provider() {
        let config = ProviderConfig::default().with_base_url("http://127.0.0.1:1234/");
        assert_eq!(config.weather_base_url, "http://127.0.0.1:1234/weather");
        assert_eq!(config.opentripmap_base_url, "http://127.0.0.1:1234/places");
        assert_eq!(config.jina_search_base_url, "http://127.0.0.1:1234/search");
    }

    #[test]
    fn missing_key_is_empty() {
        assert_eq!(ProviderConfig::key(&None), "");
        assert_eq!(ProviderConfig::key(&Some("abc".to_string())), "abc");
    }
}
