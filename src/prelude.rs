//! Convenience re-exports for common use.

pub use crate::agent::{AgentFactory, AgentMode, ChatSession, MemoryWindow};
pub use crate::agent_loop::{AgentExecutor, RunEvent, RunOutcome, RunStatus};
pub use crate::config::{AgentSettings, Locale, SiftConfig};
pub use crate::error::{Result, SiftError};
pub use crate::models::LanguageModel;
pub use crate::provider::ModelProvider;
pub use crate::tools::{
    AgentTool, AgentToolParameters, FetchResult, PageFetcher, SearchResultItem, Tool,
    ToolArguments, WebSearch,
};
pub use crate::types::{GenerationSettings, ModelMessage, Role, Usage};
