use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{absorb, parse_params, to_tool_output, ProviderClient};
use super::{Tool, ToolFuture};
use crate::{PlannerError, Result};

pub const MAX_RESULTS: usize = 5;

/// Parameters accepted by the search tool
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    /// Free-text web search query
    pub query: String,
}

impl ProviderClient {
    /// Titles of the top web results for `query`; empty on any failure.
    pub async fn search_internet(&self, query: &str) -> Vec<String> {
        absorb("search_internet", self.try_search(query).await, Vec::new)
    }

    async fn try_search(&self, query: &str) -> Result<Vec<String>> {
        let config = self.config();
        let url = format!("{}/", config.jina_search_base_url.trim_end_matches('/'));

        let mut request = self
            .http()
            .get(&url)
            .query(&[("q", query)])
            .header("Accept", "application/json");
        if let Some(api_key) = &config.jina_api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|err| PlannerError::Http(format!("Failed to call Jina search: {}", err)))?;

        if !response.status().is_success() {
            return Err(PlannerError::Http(format!(
                "Jina search returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| PlannerError::Http(format!("Failed to read Jina response: {}", err)))?;

        Ok(parse_search_titles(&body))
    }
}

/// Result titles from a Jina search body, JSON (`data[].title`) or the
/// plain-text listing (`[n] Title: ...` lines).
fn parse_search_titles(body: &str) -> Vec<String> {
    if let Ok(document) = serde_json::from_str::<Value>(body) {
        return document
            .get("data")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|result| result.get("title").and_then(Value::as_str))
                    .map(str::to_string)
                    .take(MAX_RESULTS)
                    .collect()
            })
            .unwrap_or_default();
    }

    body.lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let line = match line.strip_prefix('[') {
                Some(rest) => rest.split_once("] ").map_or(rest, |(_, title)| title),
                None => line,
            };
            line.strip_prefix("Title: ").map(|title| title.trim().to_string())
        })
        .take(MAX_RESULTS)
        .collect()
}

/// Web search through the Jina search API
#[derive(Debug, Clone)]
pub struct SearchTool {
    provider: ProviderClient,
}

impl SearchTool {
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

impl Tool for SearchTool {
    fn name(&self) -> &'static str {
        "search_internet"
    }

    fn description(&self) -> &'static str {
        "Search the internet and return the titles of the top results"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    fn execute(&self, parameters: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: SearchParams = parse_params(self.name(), parameters)?;
            to_tool_output(&self.provider.search_internet(&params.query).await)
        })
    }
}
