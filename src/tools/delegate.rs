//! Expose a whole agent as a single tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::agent_loop::{AgentExecutor, RunStatus};
use crate::error::Result;

const QUERY_DESCRIPTION: &str = "サブエージェントへの依頼内容";

/// Runs a nested [`AgentExecutor`] with no history and returns its answer.
///
/// The nested run gets its own run state, so nothing it does is visible to
/// the calling agent except the final text.
pub struct SubAgentTool {
    name: String,
    description: String,
    executor: Arc<AgentExecutor>,
    parameters: AgentToolParameters,
}

impl SubAgentTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        executor: Arc<AgentExecutor>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            executor,
            parameters: AgentToolParameters::object()
                .string("query", QUERY_DESCRIPTION, true)
                .build(),
        }
    }

    pub fn executor(&self) -> &Arc<AgentExecutor> {
        &self.executor
    }
}

#[async_trait]
impl Tool for SubAgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value> {
        let query = args.get_str("query")?;
        let outcome = self.executor.run(query, &[]).await?;
        info!(
            tool = %self.name,
            parent_run = ?ctx.run_id,
            sub_run = %outcome.run_id,
            iterations = outcome.iterations,
            hit_limit = outcome.status == RunStatus::IterationLimit,
            "sub-agent finished"
        );
        Ok(serde_json::Value::String(outcome.output))
    }
}
