use anyhow::{anyhow, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

use ragdocs_core::config::RagSettings;
use ragdocs_core::traits::Generator;

/// Chat-completions client used for answer generation. Deterministic
/// (temperature 0) and capped at `max_tokens` completion tokens.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, base_url: Option<&str>, model: &str, max_tokens: u32) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = base_url {
            config = config.with_api_base(base);
        }
        Self { client: Client::with_config(config), model: model.to_string(), max_tokens }
    }

    /// `None` when no API key is configured.
    pub fn from_settings(settings: &RagSettings) -> Option<Self> {
        let key = settings.api_key()?;
        Some(Self::new(key, settings.openai_base_url.as_deref(), &settings.llm_model, settings.llm_max_tokens))
    }

    pub fn model(&self) -> &str { &self.model }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.0)
            .max_completion_tokens(self.max_tokens)
            .messages([ChatCompletionRequestUserMessage::from(prompt.to_string()).into()])
            .build()?;
        let response = self.client.chat().create(request).await?;
        debug!(model = %self.model, usage = ?response.usage, "Chat completion finished");
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| anyhow!("completion contained no message content"))
    }
}
