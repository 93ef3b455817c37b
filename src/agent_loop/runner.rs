//! The tool-augmented reasoning loop.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::provider::{ModelProvider, ProviderRequest, ToolDefinition};
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{Tool, ToolExecutionContext};
use crate::tools::validation::validate_arguments;
use crate::types::{AgentToolCall, AgentToolResult, GenerationSettings, ModelMessage, Usage};

use super::events::{RunEventEmitter, RunEventPayload, RunEventSink, RunEventStream, RunLifecycle};
use super::types::{AgentRunState, AgentStep, RunId, RunOutcome, RunStatus};

pub const DEFAULT_MAX_ITERATIONS: usize = 30;

/// Output of a run that hit the iteration cap without any model text.
pub const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

/// Runs a model against a fixed tool set until it answers or the iteration
/// cap is reached.
///
/// The executor is stateless between runs: conversation history is passed
/// in by the caller, and each run gets a fresh [`AgentRunState`]. Tool calls
/// within a model response execute sequentially in the order requested.
pub struct AgentExecutor {
    name: String,
    provider: Arc<dyn ModelProvider>,
    system_prompt: String,
    tools: Vec<Arc<dyn Tool>>,
    settings: GenerationSettings,
    max_iterations: usize,
    event_sink: Option<RunEventSink>,
}

impl std::fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("name", &self.name)
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("tools", &self.tool_names())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl AgentExecutor {
    pub fn new(provider: Arc<dyn ModelProvider>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: "agent".to_string(),
            provider,
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
            settings: GenerationSettings::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_sink: None,
        }
    }

    /// Label used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    fn tool_definitions(&self) -> Option<Vec<ToolDefinition>> {
        if self.tools.is_empty() {
            return None;
        }
        Some(
            self.tools
                .iter()
                .map(|t| ToolDefinition {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters().schema.clone(),
                })
                .collect(),
        )
    }

    /// Answer `input` given prior conversation `history`.
    ///
    /// Provider failures abort the run with `Err`; tool failures are fed back
    /// to the model as observations. Reaching the iteration cap is not an
    /// error: the outcome carries [`RunStatus::IterationLimit`].
    pub async fn run(&self, input: &str, history: &[ModelMessage]) -> Result<RunOutcome> {
        self.run_with_id(Uuid::new_v4(), input, history).await
    }

    pub async fn run_with_id(
        &self,
        run_id: RunId,
        input: &str,
        history: &[ModelMessage],
    ) -> Result<RunOutcome> {
        let emitter = RunEventEmitter::new(run_id, self.event_sink.clone());
        let tool_defs = self.tool_definitions();
        let mut state = AgentRunState::new(run_id);
        let mut usage = Usage::default();

        let mut prompt = Vec::with_capacity(history.len() + 2);
        if !self.system_prompt.is_empty() {
            prompt.push(ModelMessage::system(self.system_prompt.clone()));
        }
        prompt.extend(history.iter().cloned());
        prompt.push(ModelMessage::user(input));

        info!(
            run_id = %run_id,
            agent = %self.name,
            history = history.len(),
            "agent run started"
        );
        emitter.lifecycle(RunLifecycle::Started);

        while state.iteration < self.max_iterations {
            state.iteration += 1;

            let mut messages = prompt.clone();
            messages.extend(state.scratchpad_messages());
            let request = ProviderRequest {
                messages,
                settings: self.settings.clone(),
                tools: tool_defs.clone(),
            };

            debug!(run_id = %run_id, iteration = state.iteration, "calling model");
            let response = match self.provider.generate_text(&request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(run_id = %run_id, iteration = state.iteration, error = %err, "model call failed");
                    emitter.lifecycle(RunLifecycle::Failed {
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            };
            usage.merge(&response.usage);

            if !response.text.is_empty() {
                emitter.emit(
                    RunEventStream::Assistant,
                    RunEventPayload::AssistantText {
                        text: response.text.clone(),
                    },
                );
            }

            if response.tool_calls.is_empty() {
                state.scratchpad.push(AgentStep {
                    iteration: state.iteration,
                    text: response.text.clone(),
                    tool_calls: Vec::new(),
                    tool_results: Vec::new(),
                    usage: response.usage,
                });
                info!(
                    run_id = %run_id,
                    agent = %self.name,
                    iterations = state.iteration,
                    "agent run completed"
                );
                emitter.lifecycle(RunLifecycle::Completed);
                return Ok(state.finish(response.text, RunStatus::Completed, usage));
            }

            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                emitter.emit(
                    RunEventStream::Tool,
                    RunEventPayload::ToolCallStarted { call: call.clone() },
                );
                let result = self.dispatch(run_id, call).await;
                emitter.emit(
                    RunEventStream::Tool,
                    RunEventPayload::ToolResult {
                        tool_name: call.name.clone(),
                        result: result.clone(),
                    },
                );
                results.push(result);
            }

            state.scratchpad.push(AgentStep {
                iteration: state.iteration,
                text: response.text,
                tool_calls: response.tool_calls,
                tool_results: results,
                usage: response.usage,
            });
        }

        let output = state
            .last_text()
            .unwrap_or(ITERATION_LIMIT_OUTPUT)
            .to_string();
        warn!(
            run_id = %run_id,
            agent = %self.name,
            max_iterations = self.max_iterations,
            "agent stopped at iteration limit"
        );
        emitter.lifecycle(RunLifecycle::IterationLimit);
        Ok(state.finish(output, RunStatus::IterationLimit, usage))
    }

    /// Resolve, validate and execute one tool call. Never fails: every fault
    /// becomes an error observation for the model.
    async fn dispatch(&self, run_id: RunId, call: &AgentToolCall) -> AgentToolResult {
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            warn!(run_id = %run_id, tool = %call.name, "model requested unknown tool");
            return error_result(
                call,
                format!(
                    "{} is not a valid tool, try one of [{}].",
                    call.name,
                    self.tool_names().join(", ")
                ),
            );
        };

        if let Err(err) = validate_arguments(&call.arguments, &tool.parameters().schema) {
            warn!(run_id = %run_id, tool = %call.name, error = %err, "invalid tool arguments");
            return error_result(
                call,
                format!("Invalid arguments for tool '{}': {err}", call.name),
            );
        }

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            run_id: Some(run_id),
            tool_call_id: Some(call.id.clone()),
        };
        debug!(run_id = %run_id, tool = %call.name, "executing tool");
        match tool.execute(&args, &ctx).await {
            Ok(value) => AgentToolResult {
                tool_call_id: call.id.clone(),
                result: value,
                is_error: false,
            },
            Err(err) => {
                warn!(run_id = %run_id, tool = %call.name, error = %err, "tool execution failed");
                error_result(call, err.to_string())
            }
        }
    }
}

fn error_result(call: &AgentToolCall, message: String) -> AgentToolResult {
    AgentToolResult {
        tool_call_id: call.id.clone(),
        result: serde_json::json!({ "error": message }),
        is_error: true,
    }
}
