//! Conversational layer: memory, sessions and agent presets.

pub mod memory;
pub mod presets;
pub mod prompts;
pub mod session;

pub use memory::{Exchange, MemoryWindow};
pub use presets::{AgentFactory, AgentMode};
pub use session::ChatSession;
