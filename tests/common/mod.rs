//! Shared test helpers: a scripted provider and recording event sink.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sift::agent_loop::{RunEvent, RunEventSink};
use sift::error::SiftError;
use sift::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use sift::types::*;

/// A provider that replays queued responses and records every request.
///
/// When the queue is empty it answers with `fallback`, which by default is a
/// tool call so loops that never finish can be exercised.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse, SiftError>>>,
    fallback: Mutex<Option<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Queue a final text answer.
    pub fn queue_text(&self, text: &str) {
        self.responses.lock().unwrap().push_back(Ok(text_response(text)));
    }

    /// Queue a response requesting one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue_tool_calls("", vec![tool_call(id, name, args)]);
    }

    /// Queue a response requesting several tool calls, with optional text.
    pub fn queue_tool_calls(&self, text: &str, calls: Vec<AgentToolCall>) {
        self.responses.lock().unwrap().push_back(Ok(ProviderResponse {
            text: text.to_string(),
            usage: usage(10, 5),
            tool_calls: calls,
            finish_reason: Some(FinishReason::ToolCalls),
        }));
    }

    pub fn queue_error(&self, err: SiftError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Response used once the queue is drained.
    pub fn set_fallback(&self, response: ProviderResponse) {
        *self.fallback.lock().unwrap() = Some(response);
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, SiftError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        let fallback = self.fallback.lock().unwrap().clone();
        Ok(fallback.unwrap_or_else(|| {
            ProviderResponse {
                text: String::new(),
                usage: usage(10, 5),
                tool_calls: vec![tool_call("loop", "echo", serde_json::json!({ "text": "again" }))],
                finish_reason: Some(FinishReason::ToolCalls),
            }
        }))
    }
}

pub fn usage(input: u32, output: u32) -> Usage {
    Usage {
        input_tokens: input,
        output_tokens: output,
        total_tokens: input + output,
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        text: text.to_string(),
        usage: usage(10, 20),
        tool_calls: vec![],
        finish_reason: Some(FinishReason::Stop),
    }
}

pub fn tool_call(id: &str, name: &str, args: serde_json::Value) -> AgentToolCall {
    AgentToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args,
    }
}

/// Sink that stores events for later assertions.
pub fn recording_sink() -> (RunEventSink, Arc<Mutex<Vec<RunEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    let sink: RunEventSink = Arc::new(move |event| captured.lock().unwrap().push(event));
    (sink, events)
}

/// Messages of the `index`-th recorded request, as `(role, text)` pairs.
pub fn transcript(provider: &ScriptedProvider, index: usize) -> Vec<(Role, String)> {
    provider.requests()[index]
        .messages
        .iter()
        .map(|m| (m.role, m.text()))
        .collect()
}
