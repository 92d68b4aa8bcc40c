use std::time::Duration;

use reqwest::{header::HeaderMap, Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const MAX_RETRIES: usize = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Minimal chat-completions client for OpenAI-compatible endpoints.
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
}

/// What to do after one HTTP exchange.
enum Attempt {
    Done(Value),
    RetryAfter(Duration),
}

impl OpenAIClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a completion request. 429 and 5xx responses are retried up to
    /// three times with doubling backoff (429 honours `Retry-After`).
    pub async fn chat_completion(&self, body: &Value, timeout: Duration) -> Result<Value> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PlannerError::Config(format!("Failed to build HTTP client: {err}")))?;
        let url = build_chat_url(&self.base_url);

        let mut backoff = INITIAL_BACKOFF;
        for attempt in 0..=MAX_RETRIES {
            match self.send_once(&client, &url, body, backoff, attempt).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::RetryAfter(delay) => {
                    debug!(target: "trip_planner::agent", attempt, ?delay, "retrying completion request");
                    tokio::time::sleep(delay).await;
                    backoff *= 2;
                }
            }
        }

        Err(PlannerError::Http(format!(
            "completion request failed after {MAX_RETRIES} retries"
        )))
    }

    async fn send_once(
        &self,
        client: &Client,
        url: &str,
        body: &Value,
        backoff: Duration,
        attempt: usize,
    ) -> Result<Attempt> {
        let response = client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("X-Title", "trip-planner-rs")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    PlannerError::Timeout(format!("completion request timed out: {err}"))
                } else {
                    PlannerError::Http(format!("completion request failed: {err}"))
                }
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|err| PlannerError::Http(format!("Failed to read response: {err}")))?;

        let retries_left = attempt < MAX_RETRIES;
        if status == StatusCode::TOO_MANY_REQUESTS {
            let delay = retry_after(&headers).unwrap_or(backoff);
            if retries_left {
                warn!(target: "trip_planner::agent", ?delay, "rate limited by completion endpoint");
                return Ok(Attempt::RetryAfter(delay));
            }
            return Err(PlannerError::RateLimit {
                retry_after: delay.as_secs().max(1),
            });
        }
        if status.is_server_error() && retries_left {
            return Ok(Attempt::RetryAfter(backoff));
        }

        let document: Value = serde_json::from_str(&text).map_err(|err| {
            PlannerError::Http(format!("HTTP {status}: response is not JSON ({err})"))
        })?;

        if let Some(message) = api_error_message(&document) {
            return Err(PlannerError::Http(format!("HTTP {status}: {message}")));
        }
        if !status.is_success() {
            return Err(PlannerError::Http(format!("HTTP {status}: {text}")));
        }

        Ok(Attempt::Done(document))
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn api_error_message(document: &Value) -> Option<String> {
    let error = document.get("error")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

/// Body of a chat-completions request.
#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    tools: Vec<Value>,
    tool_choice: Option<Value>,
    max_tokens: Option<u32>,
    response_format: Option<Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            tool_choice: None,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: Value) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Ask for a bare JSON object reply.
    pub fn with_json_output(mut self) -> Self {
        self.response_format = Some(json!({"type": "json_object"}));
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if !self.tools.is_empty() {
            body["tools"] = Value::Array(self.tools);
        }

        if let Some(tool_choice) = self.tool_choice {
            body["tool_choice"] = tool_choice;
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(response_format) = self.response_format {
            body["response_format"] = response_format;
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_is_appended_once() {
        assert_eq!(
            build_chat_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost/v1/chat/completions"),
            "http://localhost/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_includes_optional_parts() {
        let body = ChatCompletionRequest::new("gpt", vec![json!({"role": "user", "content": "hi"})])
            .with_max_tokens(Some(64))
            .with_json_output()
            .into_value();

        assert_eq!(body["model"], "gpt");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn api_errors_prefer_message() {
        let document = json!({"error": {"message": "bad key", "code": 401}});
        assert_eq!(api_error_message(&document).as_deref(), Some("bad key"));
        assert!(api_error_message(&json!({"choices": []})).is_none());
    }
}
