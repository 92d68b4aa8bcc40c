use thiserror::Error;

use crate::guardrails::{input::InputRejection, output::OutputError};

/// Main error type for the planner
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Input rejected: {0}")]
    InputRejected(#[from] InputRejection),

    #[error("Agent output rejected: {0}")]
    Output(#[from] OutputError),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid function call: {0}")]
    InvalidFunctionCall(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Maximum iterations exceeded: {0}")]
    MaxIterations(usize),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Whether re-invoking the agent could plausibly succeed.
    ///
    /// Input rejections need the user to change something, so they are never
    /// retryable; malformed agent output may be fixed by another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlannerError::Http(_) => true,
            PlannerError::Output(err) => err.is_retryable(),
            PlannerError::RateLimit { .. } => true,
            PlannerError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Config(_) => "CONFIG_ERROR",
            PlannerError::Http(_) => "HTTP_ERROR",
            PlannerError::Serialization(_) => "SERIALIZATION_ERROR",
            PlannerError::Validation(_) => "VALIDATION_ERROR",
            PlannerError::InputRejected(_) => "INPUT_REJECTED",
            PlannerError::Output(err) => err.kind().error_code(),
            PlannerError::ToolExecution(_) => "TOOL_EXECUTION_ERROR",
            PlannerError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            PlannerError::InvalidFunctionCall(_) => "INVALID_FUNCTION_CALL",
            PlannerError::Timeout(_) => "TIMEOUT_ERROR",
            PlannerError::MaxIterations(_) => "MAX_ITERATIONS_EXCEEDED",
            PlannerError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            PlannerError::Session(_) => "SESSION_ERROR",
            PlannerError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// The message a user should see. Input rejections and output failures
    /// use their own corrective text without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::InputRejected(rejection) => rejection.to_string(),
            PlannerError::Output(err) => err.to_string(),
            other => other.to_string(),
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.user_message(),
                "retryable": self.is_retryable()
            }
        })
    }
}
