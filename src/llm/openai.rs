//! OpenAI chat-completions backend (`gpt`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::types::{Draft, Prompt, Provider};
use super::{status_error, DraftGenerator, GenerateError};

pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(client: Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl DraftGenerator for OpenAiGenerator {
    fn provider(&self) -> Provider {
        Provider::Gpt
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &Prompt) -> Result<Draft, GenerateError> {
        let endpoint = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let payload = ChatCompletionsRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        debug!(%endpoint, "requesting chat completion");
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let text = response.text().await?;
        let content = serde_json::from_str::<ChatCompletionsResponse>(&text)
            .ok()
            .and_then(|parsed| parsed.choices.into_iter().next())
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerateError::MissingContent {
                provider: Provider::Gpt,
                body: text.clone(),
            })?;
        debug!(chars = content.len(), "received completion");

        Ok(Draft {
            title: format!("Update: {} generated PR", self.model),
            body: content,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
