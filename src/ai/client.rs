//! Chat client for the nutrition assistant.
//!
//! Talks to any OpenAI-compatible chat completion endpoint. The default
//! configuration points at Groq; `AIConfig::api_base` switches providers.

use crate::error::{NutriError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use secrecy::{ExposeSecret as _, SecretString};

pub use crate::config::AIConfig;

/// Answers free-text questions about the loaded menu data.
pub struct NutritionAssistant {
    client: Client<OpenAIConfig>,
    config: AIConfig,
}

impl NutritionAssistant {
    pub fn new(api_key: &SecretString, config: AIConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&config.api_base)
            .with_api_key(api_key.expose_secret());
        let client = Client::with_config(openai_config);

        Self { client, config }
    }

    pub fn config(&self) -> &AIConfig {
        &self.config
    }

    /// Ask `question` about the data in `context`.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::Assistant`] if the request cannot be built, the
    /// API call fails, or the reply carries no content.
    pub async fn ask(&self, question: &str, context: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::system_prompt())
                .build()
                .map_err(|e| NutriError::Assistant(format!("Failed to build system message: {e}")))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::user_message(question, context))
                .build()
                .map_err(|e| NutriError::Assistant(format!("Failed to build user message: {e}")))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(|e| NutriError::Assistant(format!("Failed to build chat request: {e}")))?;

        tracing::info!(
            model = %self.config.model,
            context_bytes = context.len(),
            "sending assistant request"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| NutriError::Assistant(format!("Chat API error: {e}")))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| NutriError::Assistant("No response content received".to_owned()))
    }

    fn user_message(question: &str, context: &str) -> String {
        if context.trim().is_empty() {
            question.to_owned()
        } else {
            format!("Based on the provided data: {context}, answer the following question: {question}")
        }
    }

    fn system_prompt() -> &'static str {
        "You are a nutritional analysis expert that provides clear, data-driven insights about \
menu food and drink items.

Guidelines:
- Analyze the provided dataset to answer user questions about nutritional content
- Provide specific statistics and comparisons when available
- Use simple language that general users can understand
- If the data doesn't contain the requested information, say so politely
- Keep responses concise and focused on the user's question
- When comparing items or categories, highlight key differences clearly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_sets_the_role() {
        let prompt = NutritionAssistant::system_prompt();
        assert!(prompt.contains("nutritional analysis expert"), "role");
        assert!(prompt.contains("Guidelines"), "guidelines");
    }

    #[test]
    fn test_user_message_embeds_context() {
        let message = NutritionAssistant::user_message("Which drink is lightest?", "drinks data:\nItem,Calories\n");
        assert!(message.starts_with("Based on the provided data: drinks data:"), "{message}");
        assert!(message.ends_with("answer the following question: Which drink is lightest?"), "{message}");
    }

    #[test]
    fn test_user_message_without_context_is_the_question() {
        assert_eq!(NutritionAssistant::user_message("Hello?", "  "), "Hello?");
    }

    #[test]
    fn test_new_keeps_config() {
        let key = SecretString::new("test-key".into());
        let config = AIConfig {
            model: "mixtral".to_owned(),
            ..AIConfig::default()
        };
        let assistant = NutritionAssistant::new(&key, config.clone());
        assert_eq!(assistant.config(), &config);
    }
}
