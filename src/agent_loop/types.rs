//! Core run types for the agent loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AgentToolCall, AgentToolResult, ModelMessage, Usage};

/// Unique run identifier.
pub type RunId = Uuid;

/// How a run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The model produced an answer without requesting tools.
    Completed,
    /// Every allowed model call requested tools.
    IterationLimit,
}

/// One model invocation and the tool calls it triggered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentStep {
    pub iteration: usize,
    pub text: String,
    pub tool_calls: Vec<AgentToolCall>,
    pub tool_results: Vec<AgentToolResult>,
    pub usage: Usage,
}

/// Per-run working state. Created for each run and handed back in the outcome.
#[derive(Debug, Clone)]
pub struct AgentRunState {
    pub run_id: RunId,
    /// Model invocations so far.
    pub iteration: usize,
    pub scratchpad: Vec<AgentStep>,
}

impl AgentRunState {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            iteration: 0,
            scratchpad: Vec::new(),
        }
    }

    /// Scratchpad as provider messages: each tool-calling step becomes an
    /// assistant tool-call message followed by one tool message per result.
    pub fn scratchpad_messages(&self) -> Vec<ModelMessage> {
        let mut messages = Vec::new();
        for step in self.scratchpad.iter().filter(|s| !s.tool_calls.is_empty()) {
            messages.push(ModelMessage::assistant_tool_calls(
                step.text.clone(),
                &step.tool_calls,
            ));
            messages.extend(step.tool_results.iter().map(|result| {
                ModelMessage::tool_result(
                    result.tool_call_id.clone(),
                    result.result.clone(),
                    result.is_error,
                )
            }));
        }
        messages
    }

    /// Most recent non-empty text the model produced in this run.
    pub fn last_text(&self) -> Option<&str> {
        self.scratchpad
            .iter()
            .rev()
            .map(|step| step.text.as_str())
            .find(|text| !text.trim().is_empty())
    }

    pub(crate) fn finish(self, output: String, status: RunStatus, usage: Usage) -> RunOutcome {
        RunOutcome {
            run_id: self.run_id,
            output,
            status,
            iterations: self.iteration,
            scratchpad: self.scratchpad,
            usage,
            finished_at: Utc::now(),
        }
    }
}

/// Result of [`super::AgentExecutor::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    /// Final answer shown to the user.
    pub output: String,
    pub status: RunStatus,
    pub iterations: usize,
    pub scratchpad: Vec<AgentStep>,
    pub usage: Usage,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Every tool call made during the run, in order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &AgentToolCall> {
        self.scratchpad.iter().flat_map(|step| step.tool_calls.iter())
    }
}
