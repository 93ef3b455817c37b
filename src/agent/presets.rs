//! Ready-made agent configurations.

use std::sync::Arc;

use crate::agent_loop::AgentExecutor;
use crate::config::SiftConfig;
use crate::error::Result;
use crate::models::LanguageModel;
use crate::provider::{create_provider, ModelProvider};
use crate::tools::search::DuckDuckGoLite;
use crate::tools::{FetchTool, PageFetcher, SearchTool, SubAgentTool, Tool, WebSearch};
use crate::types::GenerationSettings;

use super::prompts;

pub const ANALYZE_COMPANY_TOOL: &str = "analyze_company";
pub const DRAFT_SELF_PROMOTION_TOOL: &str = "draft_self_promotion";

pub const ANALYZE_COMPANY_DESCRIPTION: &str = "企業に関する情報を収集・分析し、自己PR作成に役立つ洞察を提供するツールです。\
入力として企業名だけを受け取り、関連する情報を調べて、自己PRに活かせる分析結果を返します。";

pub const DRAFT_SELF_PROMOTION_DESCRIPTION: &str = "企業の情報をもとに、効果的な自己PRを作成するツールです。\
入力として企業の情報を受け取り、その内容に沿った自己PR文を返します。\
通常は analyze_company の出力を入力として使用します。";

/// Which top-level agent a session runs.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum AgentMode {
    /// Web-browsing assistant with search and fetch.
    #[default]
    Single,
    /// Coordinator that can also delegate to the analysis and writing agents.
    MultiAgent,
}

/// Builds executors that share one provider, one search front-end and one fetcher.
#[derive(Clone)]
pub struct AgentFactory {
    provider: Arc<dyn ModelProvider>,
    search: Arc<WebSearch>,
    fetcher: Arc<PageFetcher>,
    generation: GenerationSettings,
    max_iterations: usize,
}

impl std::fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFactory")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("search", &self.search)
            .field("fetcher", &self.fetcher)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl AgentFactory {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        search: Arc<WebSearch>,
        fetcher: Arc<PageFetcher>,
    ) -> Self {
        Self {
            provider,
            search,
            fetcher,
            generation: GenerationSettings::default(),
            max_iterations: crate::agent_loop::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Resolve the model, provider and tools from configuration.
    pub fn from_config(config: &SiftConfig) -> Result<Self> {
        let settings = config.settings();
        settings.validate()?;
        let model: LanguageModel = settings.model.parse()?;
        let provider = create_provider(&model, config)?;
        let search = WebSearch::from_settings(Arc::new(DuckDuckGoLite::default()), settings);
        let fetcher = PageFetcher::from_settings(settings);
        let generation = GenerationSettings {
            temperature: settings.temperature,
            ..GenerationSettings::default()
        };
        Ok(Self::new(provider, Arc::new(search), Arc::new(fetcher))
            .with_generation(generation)
            .with_max_iterations(settings.max_iterations))
    }

    pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// `search_web` and `fetch_page`.
    pub fn base_tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(SearchTool::new(self.search.clone())),
            Arc::new(FetchTool::new(self.fetcher.clone())),
        ]
    }

    fn executor(&self, name: &str, prompt: &str, tools: Vec<Arc<dyn Tool>>) -> AgentExecutor {
        AgentExecutor::new(self.provider.clone(), prompt)
            .with_name(name)
            .with_tools(tools)
            .with_settings(self.generation.clone())
            .with_max_iterations(self.max_iterations)
    }

    pub fn web_browsing(&self) -> AgentExecutor {
        self.executor("web-browsing", prompts::WEB_BROWSING_PROMPT, self.base_tools())
    }

    pub fn corporate_analyst(&self) -> AgentExecutor {
        self.executor(
            ANALYZE_COMPANY_TOOL,
            prompts::CORPORATE_ANALYSIS_PROMPT,
            self.base_tools(),
        )
    }

    pub fn self_promotion_writer(&self) -> AgentExecutor {
        self.executor(
            DRAFT_SELF_PROMOTION_TOOL,
            prompts::SELF_PROMOTION_PROMPT,
            self.base_tools(),
        )
    }

    /// Coordinator with the base tools plus both sub-agents as tools.
    pub fn coordinator(&self) -> AgentExecutor {
        let mut tools = self.base_tools();
        tools.push(Arc::new(SubAgentTool::new(
            ANALYZE_COMPANY_TOOL,
            ANALYZE_COMPANY_DESCRIPTION,
            Arc::new(self.corporate_analyst()),
        )));
        tools.push(Arc::new(SubAgentTool::new(
            DRAFT_SELF_PROMOTION_TOOL,
            DRAFT_SELF_PROMOTION_DESCRIPTION,
            Arc::new(self.self_promotion_writer()),
        )));
        self.executor("coordinator", prompts::COORDINATOR_PROMPT, tools)
    }

    pub fn build(&self, mode: AgentMode) -> AgentExecutor {
        match mode {
            AgentMode::Single => self.web_browsing(),
            AgentMode::MultiAgent => self.coordinator(),
        }
    }
}
