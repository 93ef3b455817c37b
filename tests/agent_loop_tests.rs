//! Tests for the tool-calling reasoning loop.

mod common;

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{recording_sink, text_response, tool_call, transcript, ScriptedProvider};
use sift::agent_loop::{
    AgentExecutor, RunEventPayload, RunLifecycle, RunStatus, ITERATION_LIMIT_OUTPUT,
};
use sift::error::SiftError;
use sift::provider::ProviderResponse;
use sift::tools::{AgentTool, AgentToolParameters, Tool};
use sift::types::{FinishReason, ModelMessage, Role};

fn echo_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "echo",
        "Echo the given text back",
        AgentToolParameters::object()
            .string("text", "Text to echo", true)
            .build(),
        |args, _ctx| async move { Ok::<_, SiftError>(json!(args.get_str("text")?)) },
    ))
}

fn failing_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "fail",
        "Always fails",
        AgentToolParameters::object().build(),
        |_args, _ctx| async move {
            Err::<serde_json::Value, _>(SiftError::tool("fail", "backend unreachable"))
        },
    ))
}

fn executor(provider: Arc<ScriptedProvider>) -> AgentExecutor {
    AgentExecutor::new(provider, "You are a test agent.").with_tool(echo_tool())
}

#[tokio::test]
async fn direct_answer_completes_in_one_iteration() {
    let provider = ScriptedProvider::new();
    provider.queue_text("42");

    let outcome = executor(provider.clone()).run("What is the answer?", &[]).await.unwrap();

    assert_eq!(outcome.output, "42");
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(
        transcript(&provider, 0),
        vec![
            (Role::System, "You are a test agent.".to_string()),
            (Role::User, "What is the answer?".to_string()),
        ]
    );
    let tools = provider.requests()[0].tools.clone().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "echo");
}

#[tokio::test]
async fn history_precedes_the_new_input() {
    let provider = ScriptedProvider::new();
    provider.queue_text("Nice to meet you, Ada.");
    let history = vec![
        ModelMessage::user("My name is Ada."),
        ModelMessage::assistant("Hello Ada!"),
    ];

    executor(provider.clone())
        .run("Say hi again", &history)
        .await
        .unwrap();

    let roles: Vec<Role> = transcript(&provider, 0).into_iter().map(|(r, _)| r).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User]
    );
}

#[tokio::test]
async fn tool_results_are_fed_back_to_the_model() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_call("call_1", "echo", json!({ "text": "ping" }));
    provider.queue_text("The tool said ping.");

    let outcome = executor(provider.clone()).run("Use the tool", &[]).await.unwrap();

    assert_eq!(outcome.output, "The tool said ping.");
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.scratchpad[0].tool_results[0].result, json!("ping"));
    assert!(!outcome.scratchpad[0].tool_results[0].is_error);
    assert_eq!(outcome.tool_calls().count(), 1);

    let second = &provider.requests()[1].messages;
    assert_eq!(second.len(), 4);
    assert_eq!(second[2].role, Role::Assistant);
    assert_eq!(second[2].tool_calls()[0].id, "call_1");
    assert_eq!(second[3].role, Role::Tool);
}

#[tokio::test]
async fn tool_calls_in_one_response_run_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let seen = order.clone();
    let recorder: Arc<dyn Tool> = Arc::new(AgentTool::new(
        "record",
        "Record a label",
        AgentToolParameters::object()
            .string("label", "Label", true)
            .build(),
        move |args, _ctx| {
            let seen = seen.clone();
            async move {
                let label = args.get_str("label")?.to_string();
                seen.lock().unwrap().push(label.clone());
                Ok::<_, SiftError>(json!(label))
            }
        },
    ));

    let provider = ScriptedProvider::new();
    provider.queue_tool_calls(
        "",
        vec![
            tool_call("a", "record", json!({ "label": "first" })),
            tool_call("b", "record", json!({ "label": "second" })),
            tool_call("c", "record", json!({ "label": "third" })),
        ],
    );
    provider.queue_text("done");

    let outcome = AgentExecutor::new(provider, "")
        .with_tool(recorder)
        .run("go", &[])
        .await
        .unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    let ids: Vec<_> = outcome.scratchpad[0]
        .tool_results
        .iter()
        .map(|r| r.tool_call_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn empty_system_prompt_is_omitted() {
    let provider = ScriptedProvider::new();
    provider.queue_text("ok");

    AgentExecutor::new(provider.clone(), "")
        .run("hi", &[])
        .await
        .unwrap();

    assert_eq!(transcript(&provider, 0), vec![(Role::User, "hi".to_string())]);
    assert!(provider.requests()[0].tools.is_none());
}

#[tokio::test]
async fn iteration_limit_stops_after_exactly_max_calls() {
    let provider = ScriptedProvider::new();

    let outcome = executor(provider.clone())
        .with_max_iterations(3)
        .run("loop forever", &[])
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 3);
    assert_eq!(outcome.status, RunStatus::IterationLimit);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.output, ITERATION_LIMIT_OUTPUT);
    assert_eq!(outcome.scratchpad.len(), 3);
}

#[tokio::test]
async fn default_iteration_limit_is_thirty() {
    let provider = ScriptedProvider::new();

    let outcome = executor(provider.clone()).run("loop forever", &[]).await.unwrap();

    assert_eq!(provider.call_count(), 30);
    assert_eq!(outcome.status, RunStatus::IterationLimit);
}

#[tokio::test]
async fn iteration_limit_keeps_the_last_model_text() {
    let provider = ScriptedProvider::new();
    provider.set_fallback(ProviderResponse {
        text: "Still looking, best guess so far: 7.".into(),
        usage: common::usage(1, 1),
        tool_calls: vec![tool_call("x", "echo", json!({ "text": "more" }))],
        finish_reason: Some(FinishReason::ToolCalls),
    });

    let outcome = executor(provider)
        .with_max_iterations(2)
        .run("guess", &[])
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::IterationLimit);
    assert_eq!(outcome.output, "Still looking, best guess so far: 7.");
}

#[tokio::test]
async fn zero_iterations_is_raised_to_one() {
    let provider = ScriptedProvider::new();
    provider.queue_text("quick");

    let exec = executor(provider.clone()).with_max_iterations(0);
    assert_eq!(exec.max_iterations(), 1);
    let outcome = exec.run("hi", &[]).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
}

#[tokio::test]
async fn unknown_tool_becomes_an_error_observation() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_call("call_1", "teleport", json!({}));
    provider.queue_text("Sorry, I cannot do that.");

    let outcome = executor(provider).run("teleport me", &[]).await.unwrap();

    let result = &outcome.scratchpad[0].tool_results[0];
    assert!(result.is_error);
    assert_eq!(
        result.result,
        json!({ "error": "teleport is not a valid tool, try one of [echo]." })
    );
    assert_eq!(outcome.status, RunStatus::Completed);
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_execution() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_call("call_1", "echo", json!({ "txt": "typo" }));
    provider.queue_text("retrying is up to me");

    let outcome = executor(provider).run("echo", &[]).await.unwrap();

    assert_eq!(
        outcome.scratchpad[0].tool_results[0].result,
        json!({ "error": "Invalid arguments for tool 'echo': missing required field 'text'" })
    );
}

#[tokio::test]
async fn tool_failure_does_not_abort_the_run() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_call("call_1", "fail", json!({}));
    provider.queue_text("The backend is down.");

    let outcome = AgentExecutor::new(provider, "")
        .with_tool(failing_tool())
        .run("try", &[])
        .await
        .unwrap();

    let result = &outcome.scratchpad[0].tool_results[0];
    assert!(result.is_error);
    assert_eq!(
        result.result,
        json!({ "error": "Tool execution error: fail: backend unreachable" })
    );
    assert_eq!(outcome.output, "The backend is down.");
}

#[tokio::test]
async fn provider_error_aborts_the_run() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_call("call_1", "echo", json!({ "text": "a" }));
    provider.queue_error(SiftError::api(502, "bad gateway"));
    let (sink, events) = recording_sink();

    let err = executor(provider.clone())
        .with_event_sink(sink)
        .run("hi", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, SiftError::Api { status: 502, .. }));
    assert_eq!(provider.call_count(), 2);
    let last = events.lock().unwrap().last().cloned().unwrap();
    assert!(matches!(
        last.payload,
        RunEventPayload::Lifecycle {
            state: RunLifecycle::Failed { .. }
        }
    ));
}

#[tokio::test]
async fn usage_is_summed_across_iterations() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_call("call_1", "echo", json!({ "text": "a" }));
    provider.queue_text("done");

    let outcome = executor(provider).run("hi", &[]).await.unwrap();

    // 10/5 for the tool call, 10/20 for the answer.
    assert_eq!(outcome.usage.input_tokens, 20);
    assert_eq!(outcome.usage.output_tokens, 25);
    assert_eq!(outcome.usage.total_tokens, 45);
}

#[tokio::test]
async fn events_follow_the_run() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_calls(
        "Let me check.",
        vec![tool_call("call_1", "echo", json!({ "text": "x" }))],
    );
    provider.queue_text("All done.");
    let (sink, events) = recording_sink();

    let outcome = executor(provider)
        .with_event_sink(sink)
        .run("hi", &[])
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (1..=events.len() as u64).collect::<Vec<_>>());
    assert!(events.iter().all(|e| e.run_id == outcome.run_id));

    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match &e.payload {
            RunEventPayload::Lifecycle { state: RunLifecycle::Started } => "started",
            RunEventPayload::Lifecycle { state: RunLifecycle::Completed } => "completed",
            RunEventPayload::Lifecycle { .. } => "other-lifecycle",
            RunEventPayload::AssistantText { .. } => "text",
            RunEventPayload::ToolCallStarted { .. } => "call",
            RunEventPayload::ToolResult { .. } => "result",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["started", "text", "call", "result", "text", "completed"]
    );
}

#[tokio::test]
async fn runs_do_not_share_state() {
    let provider = ScriptedProvider::new();
    provider.queue_tool_call("call_1", "echo", json!({ "text": "a" }));
    provider.queue_text("first");
    provider.queue_text("second");
    let exec = executor(provider.clone());

    let first = exec.run("one", &[]).await.unwrap();
    let second = exec.run("two", &[]).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(second.iterations, 1);
    // The second run starts from a clean scratchpad.
    assert_eq!(transcript(&provider, 2).len(), 2);
}

#[tokio::test]
async fn text_response_helper_matches_queue_text() {
    let provider = ScriptedProvider::new();
    provider.set_fallback(text_response("fallback answer"));

    let outcome = executor(provider).run("anything", &[]).await.unwrap();
    assert_eq!(outcome.output, "fallback answer");
}
