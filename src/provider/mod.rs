//! Model provider trait and the Chat Completions implementation.

pub mod http;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SiftConfig;
use crate::error::SiftError;
use crate::models::LanguageModel;
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai", "openrouter").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate one response (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, SiftError>;
}

/// Create a provider for the given model, resolving key and endpoint from config.
pub fn create_provider(
    model: &LanguageModel,
    config: &SiftConfig,
) -> Result<Arc<dyn ModelProvider>, SiftError> {
    let key = model.provider;
    let api_key = match config.get_api_key(key.as_str()) {
        Some(api_key) => api_key,
        None if key.requires_api_key() => {
            return Err(SiftError::Authentication(format!(
                "Missing {}",
                key.api_key_env()
            )))
        }
        None => String::new(),
    };
    let base_url = config
        .get_base_url(key.as_str())
        .or_else(|| key.default_base_url().map(str::to_string))
        .ok_or_else(|| {
            SiftError::Configuration(format!(
                "No base URL configured for provider '{}'",
                key.as_str()
            ))
        })?;

    Ok(Arc::new(openai::OpenAiProvider::new(
        key.as_str(),
        model.model_id(),
        api_key,
        base_url,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderKey;

    #[test]
    fn missing_key_is_an_authentication_error() {
        let model = LanguageModel::new(ProviderKey::OpenRouter, "z-ai/glm-4.5-air:free");
        let err = create_provider(&model, &SiftConfig::new()).err().unwrap();
        assert!(matches!(err, SiftError::Authentication(msg) if msg.contains("OPENROUTER_API_KEY")));
    }

    #[test]
    fn compatible_provider_needs_a_base_url_but_no_key() {
        let model = LanguageModel::new(ProviderKey::OpenAiCompatible, "local-model");
        let config = SiftConfig::new();
        assert!(matches!(
            create_provider(&model, &config).err().unwrap(),
            SiftError::Configuration(_)
        ));

        config.set_base_url("openai-compatible", "http://localhost:1234/v1".into());
        let provider = create_provider(&model, &config).unwrap();
        assert_eq!(provider.provider_name(), "openai-compatible");
        assert_eq!(provider.model_id(), "local-model");
    }
}
