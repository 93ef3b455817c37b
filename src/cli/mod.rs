//! Command-line interface for sift.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::agent::AgentMode;
use crate::agent_loop::{RunEvent, RunEventPayload, RunLifecycle};

/// Longest tool output echoed to the terminal, in characters.
const PREVIEW_CHARS: usize = 200;

/// Sift: chat with a model that can search and read the web.
#[derive(Parser, Debug)]
#[command(name = "sift", version, about = "Web-search chat assistant")]
pub struct Cli {
    /// Config file (defaults to ~/.sift/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat(ChatArgs),
    /// Run a single web search and print the results as JSON
    Search(SearchArgs),
    /// Fetch one page of readable text from a URL as JSON
    Fetch(FetchArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Model to use (format: provider:model, e.g., openrouter:z-ai/glm-4.5-air:free)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Use the coordinator with the company-analysis and self-PR sub-agents
    #[arg(long)]
    pub multi_agent: bool,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Maximum reasoning iterations per turn
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Hide tool calls and results
    #[arg(short, long)]
    pub quiet: bool,
}

impl ChatArgs {
    pub fn mode(&self) -> AgentMode {
        if self.multi_agent {
            AgentMode::MultiAgent
        } else {
            AgentMode::Single
        }
    }
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum number of results
    #[arg(short, long, default_value_t = crate::tools::search::DEFAULT_MAX_RESULTS)]
    pub n: usize,
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Page URL
    pub url: String,

    /// Zero-based page of the extracted text
    #[arg(short, long, default_value_t = 0)]
    pub page: usize,
}

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Quit,
    Clear,
    Help,
    Unknown(String),
    Message(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Message(line.to_string());
        }
        match line {
            "/quit" | "/exit" | "/q" => Self::Quit,
            "/clear" => Self::Clear,
            "/help" | "/h" => Self::Help,
            other => Self::Unknown(other.to_string()),
        }
    }
}

pub const REPL_HELP: &str = "\
Available commands:
  /clear  - Forget the conversation
  /help   - Show this help
  /quit   - Exit";

/// Terminal line for a run event, if it is worth showing.
pub fn describe_event(event: &RunEvent) -> Option<String> {
    match &event.payload {
        RunEventPayload::ToolCallStarted { call } => {
            Some(format!("⚡ {} {}", call.name, call.arguments))
        }
        RunEventPayload::ToolResult { tool_name, result } => {
            let output = match &result.result {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let mark = if result.is_error { "❌" } else { "✅" };
            Some(format!("  {mark} {tool_name}: {}", preview(&output)))
        }
        RunEventPayload::Lifecycle {
            state: RunLifecycle::IterationLimit,
        } => Some("⚠ iteration limit reached".to_string()),
        RunEventPayload::Lifecycle {
            state: RunLifecycle::Failed { error },
        } => Some(format!("❌ {error}")),
        _ => None,
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, with an ellipsis if cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
