pub mod export;
pub mod openai_client;
pub mod prompts;
pub(crate) mod tool_call_utils;

pub use export::{to_csv, to_json, ExportFormat};
pub use openai_client::{ChatCompletionRequest, OpenAIClient};
