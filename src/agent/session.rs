//! One user's conversation with an agent.

use tracing::info;

use crate::agent_loop::{AgentExecutor, RunOutcome};
use crate::config::Locale;
use crate::error::Result;
use crate::types::ModelMessage;

use super::memory::MemoryWindow;
use super::prompts::greeting;

/// Session-scoped state: the executor, its memory window and the greeting.
///
/// `send` takes `&mut self`, so a session never runs two turns at once.
#[derive(Debug)]
pub struct ChatSession {
    executor: AgentExecutor,
    memory: MemoryWindow,
    greeting: String,
}

impl ChatSession {
    pub fn new(executor: AgentExecutor, memory_window: usize) -> Self {
        Self {
            executor,
            memory: MemoryWindow::new(memory_window),
            greeting: greeting(Locale::default()).to_string(),
        }
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Run one turn. The exchange is remembered only if the run returns.
    pub async fn send(&mut self, input: &str) -> Result<RunOutcome> {
        let history = self.memory.messages();
        let outcome = self.executor.run(input, &history).await?;
        self.memory.push_exchange(input, outcome.output.clone());
        info!(
            run_id = %outcome.run_id,
            remembered = self.memory.len(),
            "turn completed"
        );
        Ok(outcome)
    }

    /// Greeting followed by the remembered exchanges.
    pub fn transcript(&self) -> Vec<ModelMessage> {
        let mut messages = vec![ModelMessage::assistant(self.greeting.clone())];
        messages.extend(self.memory.messages());
        messages
    }

    /// Forget the conversation; the transcript goes back to the greeting.
    pub fn clear(&mut self) {
        self.memory.clear();
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn memory(&self) -> &MemoryWindow {
        &self.memory
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }
}
