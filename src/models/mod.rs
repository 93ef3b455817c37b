//! Model identifiers.

pub mod provider_key;

pub use provider_key::ProviderKey;

use std::fmt;
use std::str::FromStr;

use crate::error::SiftError;

/// A model on a specific provider, written `provider:model`.
///
/// Only the first `:` separates the two, so model ids may contain colons
/// (`openrouter:z-ai/glm-4.5-air:free`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageModel {
    pub provider: ProviderKey,
    pub model_id: String,
}

impl LanguageModel {
    pub fn new(provider: ProviderKey, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn provider_name(&self) -> &str {
        self.provider.as_str()
    }
}

impl FromStr for LanguageModel {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            SiftError::ModelNotFound(format!("expected 'provider:model', got '{s}'"))
        })?;
        let provider = ProviderKey::parse(provider.trim())
            .ok_or_else(|| SiftError::ModelNotFound(format!("unknown provider '{provider}'")))?;
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(SiftError::ModelNotFound(format!("missing model id in '{s}'")));
        }
        Ok(Self::new(provider, model_id))
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_name(), self.model_id())
    }
}
