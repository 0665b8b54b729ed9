//! Google Gemini generateContent backend.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::types::{Draft, Prompt, Provider};
use super::{status_error, DraftGenerator, GenerateError};

pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
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
impl DraftGenerator for GeminiGenerator {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &Prompt) -> Result<Draft, GenerateError> {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        // No system role here; the preamble rides in front of the user text.
        let payload = json!({
            "contents": [
                {"parts": [{"text": format!("{}\n{}", prompt.system, prompt.user)}]}
            ]
        });

        debug!(%endpoint, "requesting content generation");
        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        // candidates[0].content.parts[0].text
        let text = response.text().await?;
        let content = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| {
                body["candidates"][0]["content"]["parts"][0]["text"]
                    .as_str()
                    .map(str::to_string)
            })
            .ok_or_else(|| GenerateError::MissingContent {
                provider: Provider::Gemini,
                body: text.clone(),
            })?;
        debug!(chars = content.len(), "received generated content");

        Ok(Draft {
            title: "Automated PR by Gemini".to_string(),
            body: content,
        })
    }
}
