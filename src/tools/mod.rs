//! Tool system for function calling, plus the assistant's built-in tools.

pub mod arguments;
pub mod delegate;
pub mod fetch;
pub mod search;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use delegate::SubAgentTool;
pub use fetch::{FetchResult, FetchTool, PageContent, PageFetcher};
pub use search::{DuckDuckGoLite, SearchBackend, SearchResultItem, SearchTool, WebSearch};
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::AgentToolParameters;
pub use validation::{validate_arguments, ValidationError};
