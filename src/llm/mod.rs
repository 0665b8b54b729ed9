pub mod gemini;
pub mod openai;
pub mod prompt;
pub mod types;

pub use types::{Draft, Prompt, Provider};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("LLM request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("LLM Error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("{provider} response parsing failed: {body}")]
    MissingContent { provider: Provider, body: String },
}

impl From<reqwest::Error> for GenerateError {
    /// Strips the request URL, which may carry an API key.
    fn from(err: reqwest::Error) -> Self {
        GenerateError::Transport(err.without_url())
    }
}

/// A language-model backend that turns a prompt into a PR draft.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    /// Send the prompt and extract the draft from the response.
    /// Non-2xx statuses and unexpected response shapes are errors.
    async fn generate(&self, prompt: &Prompt) -> Result<Draft, GenerateError>;
}

/// Build the generator for `provider`, talking to `base_url`.
pub fn create_generator(
    provider: Provider,
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
) -> Box<dyn DraftGenerator> {
    match provider {
        Provider::Gpt => Box::new(openai::OpenAiGenerator::new(client, base_url, api_key, model)),
        Provider::Gemini => Box::new(gemini::GeminiGenerator::new(client, base_url, api_key, model)),
    }
}

/// Read the body of a failed response for the error message.
async fn status_error(response: reqwest::Response) -> GenerateError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "(failed to read error response body)".to_string());
    GenerateError::Status { status, body }
}
